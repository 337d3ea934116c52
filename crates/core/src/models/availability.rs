use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider's declared open window `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub id: Uuid,
    pub provider_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One requested window. Timestamps stay textual until the expander parses
/// them so that a malformed value rejects the whole request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindowRequest {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    #[serde(alias = "time_slots")]
    pub windows: Vec<TimeWindowRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAvailabilityResponse {
    pub message: String,
    pub availability_created: usize,
    pub slots_created: usize,
}
