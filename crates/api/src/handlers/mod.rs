pub mod availability;
pub mod providers;
pub mod reservations;
pub mod slots;

use carebook_core::errors::BookingError;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::error_handling::AppError;

/// `?date=YYYY-MM-DD`
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// Path ids are parsed by hand so a malformed one gets the JSON error body.
fn parse_id(raw: &str, kind: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError(BookingError::Validation(format!("invalid {kind} id: {raw:?}"))))
}
