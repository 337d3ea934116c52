//! # Query Layer
//!
//! Read-only projections. A well-formed query that matches nothing returns an
//! empty list; only malformed dates are errors.

use std::collections::HashMap;

use carebook_core::{
    errors::BookingResult,
    models::{reservation::ReservationDetails, slot::{Slot, SlotStatus}},
    time::{day_bounds, parse_date, parse_optional_date},
};
use carebook_db::gateway::{ReservationFilter, SlotFilter};
use tracing::instrument;

use crate::BookingEngine;

impl BookingEngine {
    /// Available slots of a provider starting on `date` in the reference timezone.
    #[instrument(skip(self))]
    pub async fn available_slots(&self, provider_id: &str, date: &str) -> BookingResult<Vec<Slot>> {
        let date = parse_date(date)?;
        let (from, before) = day_bounds(date, self.policy.reference_tz);

        let mut tx = self.gateway.begin_read().await?;
        let slots = tx
            .find_slots(
                &SlotFilter::for_provider(provider_id)
                    .with_status(SlotStatus::Available)
                    .starting_within(from, before),
            )
            .await?;
        Ok(slots)
    }

    #[instrument(skip(self))]
    pub async fn reservations_for_provider(
        &self,
        provider_id: &str,
        date: Option<&str>,
    ) -> BookingResult<Vec<ReservationDetails>> {
        self.reservation_details(ReservationFilter::for_provider(provider_id), date)
            .await
    }

    #[instrument(skip(self))]
    pub async fn reservations_for_client(
        &self,
        client_id: &str,
        date: Option<&str>,
    ) -> BookingResult<Vec<ReservationDetails>> {
        self.reservation_details(ReservationFilter::for_client(client_id), date)
            .await
    }

    async fn reservation_details(
        &self,
        filter: ReservationFilter,
        date: Option<&str>,
    ) -> BookingResult<Vec<ReservationDetails>> {
        let window = parse_optional_date(date)?.map(|d| day_bounds(d, self.policy.reference_tz));

        let mut tx = self.gateway.begin_read().await?;
        let reservations = tx.find_reservations(&filter).await?;
        if reservations.is_empty() {
            return Ok(Vec::new());
        }

        let slot_ids = reservations.iter().map(|r| r.slot_id).collect();
        let mut slot_filter = SlotFilter::by_ids(slot_ids);
        if let Some((from, before)) = window {
            slot_filter = slot_filter.starting_within(from, before);
        }
        let slots: HashMap<_, _> = tx
            .find_slots(&slot_filter)
            .await?
            .into_iter()
            .map(|slot| (slot.id, slot))
            .collect();

        let mut details: Vec<_> = reservations
            .into_iter()
            .filter_map(|r| {
                let slot = slots.get(&r.slot_id)?;
                Some(ReservationDetails {
                    reservation_id: r.id,
                    slot_id: r.slot_id,
                    client_id: r.client_id,
                    provider_id: r.provider_id,
                    status: r.status,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                    expires_at: r.expires_at,
                })
            })
            .collect();
        details.sort_by_key(|d| (d.start_time, d.reservation_id));
        Ok(details)
    }
}
