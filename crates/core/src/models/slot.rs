use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of a bookable slot.
///
/// Legal transitions are `Available -> Reserved -> Confirmed` and
/// `Reserved -> Available` (expiry only). Nothing leaves `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Reserved,
    Confirmed,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Reserved => "reserved",
            SlotStatus::Confirmed => "confirmed",
        }
    }

    pub fn can_transition_to(&self, next: SlotStatus) -> bool {
        matches!(
            (self, next),
            (SlotStatus::Available, SlotStatus::Reserved)
                | (SlotStatus::Reserved, SlotStatus::Confirmed)
                | (SlotStatus::Reserved, SlotStatus::Available)
        )
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for SlotStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SlotStatus::Available),
            "reserved" => Ok(SlotStatus::Reserved),
            "confirmed" => Ok(SlotStatus::Confirmed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A fixed-length bookable unit carved out of an availability window.
///
/// The identity is stable for the lifetime of the slot: reserving,
/// confirming and releasing all update the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub availability_id: Uuid,
    pub provider_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub reservation_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotResponse {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
}

impl From<Slot> for SlotResponse {
    fn from(slot: Slot) -> Self {
        Self {
            id: slot.id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: slot.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAvailableSlotsResponse {
    pub slots: Vec<SlotResponse>,
}
