//! # Persistence Gateway
//!
//! The transactional boundary every component writes through. A
//! [`Gateway`] hands out [`Transaction`]s; all reads and writes happen inside
//! one, and nothing is visible to other transactions until
//! [`Transaction::commit`] succeeds. Dropping an uncommitted transaction
//! rolls it back, so an early `?` return can never leave a partial write.
//!
//! Updates and deletes are conditional: they return the number of records
//! affected, and a caller that sees `0` has lost a race (or found nothing).

use async_trait::async_trait;
use carebook_core::models::{
    availability::Availability,
    provider::Provider,
    reservation::{Reservation, ReservationStatus},
    slot::{Slot, SlotStatus},
};
use chrono::{DateTime, Utc};
use eyre::Result;
use uuid::Uuid;

/// Any record the gateway can insert.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Provider(Provider),
    Availability(Availability),
    Slot(Slot),
    Reservation(Reservation),
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Provider(_) => "provider",
            Record::Availability(_) => "availability",
            Record::Slot(_) => "slot",
            Record::Reservation(_) => "reservation",
        }
    }
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Opens a transaction. Implementations bound how long this may wait.
    async fn begin(&self) -> Result<Box<dyn Transaction>>;

    /// Opens a transaction that only reads. Writes through it fail, and
    /// implementations may let read transactions run side by side.
    async fn begin_read(&self) -> Result<Box<dyn Transaction>> {
        self.begin().await
    }

    /// Releases the underlying datastore; later `begin` calls fail.
    async fn close(&self);
}

#[async_trait]
pub trait Transaction: Send {
    /// Inserts all records or none of them.
    async fn create(&mut self, records: Vec<Record>) -> Result<()>;

    async fn find_providers(&mut self, filter: &ProviderFilter) -> Result<Vec<Provider>>;

    /// Like `find_providers`, but holds the matched rows until the
    /// transaction ends so concurrent writers for the same provider queue up.
    async fn lock_providers(&mut self, filter: &ProviderFilter) -> Result<Vec<Provider>>;

    async fn find_availability(&mut self, filter: &AvailabilityFilter) -> Result<Vec<Availability>>;

    /// Matching slots ordered by start time.
    async fn find_slots(&mut self, filter: &SlotFilter) -> Result<Vec<Slot>>;

    /// Matching reservations ordered by creation time.
    async fn find_reservations(&mut self, filter: &ReservationFilter) -> Result<Vec<Reservation>>;

    async fn update_providers(&mut self, filter: &ProviderFilter, patch: &ProviderPatch) -> Result<u64>;

    async fn update_slots(&mut self, filter: &SlotFilter, patch: &SlotPatch) -> Result<u64>;

    async fn update_reservations(
        &mut self,
        filter: &ReservationFilter,
        patch: &ReservationPatch,
    ) -> Result<u64>;

    async fn delete_reservations(&mut self, filter: &ReservationFilter) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderFilter {
    pub id: Option<String>,
}

impl ProviderFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    pub fn matches(&self, provider: &Provider) -> bool {
        self.id.as_ref().is_none_or(|id| *id == provider.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityFilter {
    pub provider_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl AvailabilityFilter {
    /// The exact window `[start, end)` of one provider.
    pub fn window(provider_id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
            start_time: Some(start),
            end_time: Some(end),
        }
    }

    pub fn matches(&self, availability: &Availability) -> bool {
        self.provider_id.as_ref().is_none_or(|p| *p == availability.provider_id)
            && self.start_time.is_none_or(|t| t == availability.start_time)
            && self.end_time.is_none_or(|t| t == availability.end_time)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotFilter {
    pub ids: Option<Vec<Uuid>>,
    pub provider_id: Option<String>,
    pub availability_id: Option<Uuid>,
    pub status: Option<SlotStatus>,
    pub reservation_id: Option<Uuid>,
    /// Inclusive lower bound on `start_time`.
    pub start_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `start_time`.
    pub start_before: Option<DateTime<Utc>>,
}

impl SlotFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            ids: Some(vec![id]),
            ..Self::default()
        }
    }

    pub fn by_ids(ids: Vec<Uuid>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn for_provider(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: SlotStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_reservation(mut self, reservation_id: Uuid) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    pub fn starting_within(mut self, from: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.start_from = Some(from);
        self.start_before = Some(before);
        self
    }

    pub fn matches(&self, slot: &Slot) -> bool {
        self.ids.as_ref().is_none_or(|ids| ids.contains(&slot.id))
            && self.provider_id.as_ref().is_none_or(|p| *p == slot.provider_id)
            && self.availability_id.is_none_or(|a| a == slot.availability_id)
            && self.status.is_none_or(|s| s == slot.status)
            && self.reservation_id.is_none_or(|r| slot.reservation_id == Some(r))
            && self.start_from.is_none_or(|t| slot.start_time >= t)
            && self.start_before.is_none_or(|t| slot.start_time < t)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationFilter {
    pub id: Option<Uuid>,
    pub provider_id: Option<String>,
    pub client_id: Option<String>,
    pub status: Option<ReservationStatus>,
    /// Strict: only reservations whose expiry is before this instant.
    pub expires_before: Option<DateTime<Utc>>,
}

impl ReservationFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn for_provider(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
            ..Self::default()
        }
    }

    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn expiring_before(mut self, instant: DateTime<Utc>) -> Self {
        self.expires_before = Some(instant);
        self
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.id.is_none_or(|id| id == reservation.id)
            && self.provider_id.as_ref().is_none_or(|p| *p == reservation.provider_id)
            && self.client_id.as_ref().is_none_or(|c| *c == reservation.client_id)
            && self.status.is_none_or(|s| s == reservation.status)
            && self
                .expires_before
                .is_none_or(|t| reservation.expires_at.is_some_and(|e| e < t))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderPatch {
    pub name: Option<String>,
}

impl ProviderPatch {
    pub fn apply(&self, provider: &mut Provider) {
        if let Some(name) = &self.name {
            provider.name = name.clone();
        }
    }
}

/// Fields to overwrite on matching slots. `Some(None)` clears a column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotPatch {
    pub status: Option<SlotStatus>,
    pub hold_expires_at: Option<Option<DateTime<Utc>>>,
    pub reservation_id: Option<Option<Uuid>>,
}

impl SlotPatch {
    /// Back to bookable: no hold, no reservation.
    pub fn release() -> Self {
        Self {
            status: Some(SlotStatus::Available),
            hold_expires_at: Some(None),
            reservation_id: Some(None),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.hold_expires_at.is_none() && self.reservation_id.is_none()
    }

    pub fn apply(&self, slot: &mut Slot) {
        if let Some(status) = self.status {
            slot.status = status;
        }
        if let Some(expiry) = self.hold_expires_at {
            slot.hold_expires_at = expiry;
        }
        if let Some(reservation_id) = self.reservation_id {
            slot.reservation_id = reservation_id;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationPatch {
    pub status: Option<ReservationStatus>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl ReservationPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.expires_at.is_none()
    }

    pub fn apply(&self, reservation: &mut Reservation) {
        if let Some(status) = self.status {
            reservation.status = status;
        }
        if let Some(expiry) = self.expires_at {
            reservation.expires_at = expiry;
        }
    }
}
