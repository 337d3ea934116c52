//! Provider registry: the owners of availability windows.

use carebook_core::{
    errors::{BookingError, BookingResult},
    models::provider::{CreateProviderRequest, Provider},
};
use carebook_db::{
    Record,
    gateway::{ProviderFilter, ProviderPatch},
};
use tracing::{info, instrument};

use crate::BookingEngine;

fn required(field: &str, value: &str) -> BookingResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

impl BookingEngine {
    #[instrument(skip(self, request), fields(provider_id = %request.id))]
    pub async fn create_provider(&self, request: &CreateProviderRequest) -> BookingResult<Provider> {
        let provider = Provider {
            id: required("provider id", &request.id)?,
            name: required("provider name", &request.name)?,
            created_at: self.clock.now(),
        };

        let mut tx = self.gateway.begin().await?;
        let existing = tx.find_providers(&ProviderFilter::by_id(&provider.id)).await?;
        if !existing.is_empty() {
            return Err(BookingError::Conflict(format!(
                "Provider {} already exists",
                provider.id
            )));
        }
        tx.create(vec![Record::Provider(provider.clone())]).await?;
        tx.commit().await?;

        info!("Provider created");
        Ok(provider)
    }

    pub async fn get_provider(&self, provider_id: &str) -> BookingResult<Provider> {
        let mut tx = self.gateway.begin_read().await?;
        tx.find_providers(&ProviderFilter::by_id(provider_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::NotFound(format!("Provider {provider_id} not found")))
    }

    /// The name is the only mutable attribute of a provider.
    #[instrument(skip(self, name))]
    pub async fn rename_provider(&self, provider_id: &str, name: &str) -> BookingResult<Provider> {
        let patch = ProviderPatch {
            name: Some(required("provider name", name)?),
        };

        let mut tx = self.gateway.begin().await?;
        let filter = ProviderFilter::by_id(provider_id);
        if tx.update_providers(&filter, &patch).await? == 0 {
            return Err(BookingError::NotFound(format!("Provider {provider_id} not found")));
        }
        let provider = tx
            .find_providers(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::NotFound(format!("Provider {provider_id} not found")))?;
        tx.commit().await?;

        Ok(provider)
    }
}
