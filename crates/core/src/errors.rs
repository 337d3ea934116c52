use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Slot {0} is not available")]
    SlotUnavailable(Uuid),

    #[error("Reservations must be made at least {lead_hours} hours in advance (slot starts at {slot_start})")]
    LeadTimeViolation {
        slot_start: DateTime<Utc>,
        lead_hours: i64,
    },

    #[error("Reservation {0} is already confirmed")]
    AlreadyConfirmed(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

impl BookingError {
    /// True for failures of the datastore rather than of the request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, BookingError::Database(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
