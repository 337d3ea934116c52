use carebook_core::models::{
    availability::Availability,
    provider::Provider,
    reservation::{Reservation, ReservationStatus},
    slot::{Slot, SlotStatus},
};
use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProvider {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailability {
    pub id: Uuid,
    pub provider_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlot {
    pub id: Uuid,
    pub availability_id: Uuid,
    pub provider_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub reservation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReservation {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub client_id: String,
    pub provider_id: String,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DbProvider> for Provider {
    fn from(row: DbProvider) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<DbAvailability> for Availability {
    fn from(row: DbAvailability) -> Self {
        Self {
            id: row.id,
            provider_id: row.provider_id,
            start_time: row.start_time,
            end_time: row.end_time,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<DbSlot> for Slot {
    type Error = eyre::Report;

    fn try_from(row: DbSlot) -> Result<Self> {
        let status = row
            .status
            .parse::<SlotStatus>()
            .wrap_err_with(|| format!("slot {} has a corrupt status", row.id))?;
        Ok(Self {
            id: row.id,
            availability_id: row.availability_id,
            provider_id: row.provider_id,
            start_time: row.start_time,
            end_time: row.end_time,
            status,
            hold_expires_at: row.hold_expires_at,
            reservation_id: row.reservation_id,
        })
    }
}

impl TryFrom<DbReservation> for Reservation {
    type Error = eyre::Report;

    fn try_from(row: DbReservation) -> Result<Self> {
        let status = row
            .status
            .parse::<ReservationStatus>()
            .wrap_err_with(|| format!("reservation {} has a corrupt status", row.id))?;
        Ok(Self {
            id: row.id,
            slot_id: row.slot_id,
            client_id: row.client_id,
            provider_id: row.provider_id,
            status,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}
