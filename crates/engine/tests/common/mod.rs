#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use carebook_core::{
    models::{
        availability::{Availability, SetAvailabilityRequest, TimeWindowRequest},
        provider::{CreateProviderRequest, Provider},
        reservation::{Reservation, ReservationStatus},
        slot::{Slot, SlotStatus},
    },
    time::ManualClock,
};
use carebook_db::{
    Gateway, MemoryGateway, Record, Transaction,
    gateway::{
        AvailabilityFilter, ProviderFilter, ProviderPatch, ReservationFilter, ReservationPatch,
        SlotFilter, SlotPatch,
    },
};
use carebook_engine::{BookingEngine, BookingPolicy};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Monday 2026-03-02 08:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

pub fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap()
}

pub fn window(start: &str, end: &str) -> TimeWindowRequest {
    TimeWindowRequest {
        start: start.to_string(),
        end: end.to_string(),
    }
}

pub fn windows(pairs: &[(&str, &str)]) -> SetAvailabilityRequest {
    SetAvailabilityRequest {
        windows: pairs.iter().map(|(s, e)| window(s, e)).collect(),
    }
}

pub struct Harness {
    pub engine: BookingEngine,
    pub clock: Arc<ManualClock>,
    pub gateway: Arc<FlakyGateway>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(BookingPolicy::default())
    }

    pub fn with_policy(policy: BookingPolicy) -> Self {
        let clock = Arc::new(ManualClock::new(now()));
        let gateway = Arc::new(FlakyGateway::new());
        let engine = BookingEngine::new(gateway.clone(), clock.clone(), policy);
        Self {
            engine,
            clock,
            gateway,
        }
    }

    pub async fn provider(&self, id: &str) -> Provider {
        self.engine
            .create_provider(&CreateProviderRequest {
                id: id.to_string(),
                name: format!("Dr. {id}"),
            })
            .await
            .unwrap()
    }

    pub async fn publish(&self, provider_id: &str, start: &str, end: &str) {
        self.engine
            .set_availability(provider_id, &windows(&[(start, end)]))
            .await
            .unwrap();
    }

    /// All slots of the provider regardless of status.
    pub async fn all_slots(&self, provider_id: &str) -> Vec<Slot> {
        let mut tx = self.gateway.begin_read().await.unwrap();
        tx.find_slots(&SlotFilter::for_provider(provider_id)).await.unwrap()
    }

    pub async fn slot_at(&self, provider_id: &str, start: &str) -> Slot {
        let start = ts(start);
        self.all_slots(provider_id)
            .await
            .into_iter()
            .find(|s| s.start_time == start)
            .expect("no slot at that start")
    }

    pub async fn all_availability(&self, provider_id: &str) -> Vec<Availability> {
        let mut tx = self.gateway.begin_read().await.unwrap();
        tx.find_availability(&AvailabilityFilter {
            provider_id: Some(provider_id.to_string()),
            ..AvailabilityFilter::default()
        })
        .await
        .unwrap()
    }

    pub async fn all_reservations(&self) -> Vec<Reservation> {
        let mut tx = self.gateway.begin_read().await.unwrap();
        tx.find_reservations(&ReservationFilter::default()).await.unwrap()
    }
}

/// A write that another client commits between a transaction's read and its
/// conditional update. Each one fires once, just before the matching call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interference {
    /// Someone else holds the slot before the next `update_slots`.
    ClaimSlot,
    /// The sweeper removes the reservation before the next `update_reservations`.
    SweepReservation,
    /// The client confirms before the next `update_reservations` or `delete_reservations`.
    ConfirmReservation,
    /// The slot is released behind the reservation's back before the next `update_slots`.
    ReleaseSlot,
}

/// Memory gateway that can be told to fail or to lose a race.
///
/// `fail_next_begins` makes the next N `begin` calls error; `fail_slot_update_at`
/// makes the Nth `update_slots` call of a transaction error (1-based);
/// `interfere` lands a competing write inside the next matching call.
pub struct FlakyGateway {
    inner: MemoryGateway,
    failing_begins: AtomicUsize,
    fail_slot_update_at: Arc<AtomicUsize>,
    interference: Arc<Mutex<Option<Interference>>>,
}

impl FlakyGateway {
    pub fn new() -> Self {
        Self {
            inner: MemoryGateway::new(),
            failing_begins: AtomicUsize::new(0),
            fail_slot_update_at: Arc::new(AtomicUsize::new(0)),
            interference: Arc::new(Mutex::new(None)),
        }
    }

    pub fn fail_next_begins(&self, n: usize) {
        self.failing_begins.store(n, Ordering::SeqCst);
    }

    pub fn fail_slot_update_at(&self, nth: usize) {
        self.fail_slot_update_at.store(nth, Ordering::SeqCst);
    }

    pub fn interfere(&self, interference: Interference) {
        *self.interference.lock().unwrap() = Some(interference);
    }

    /// Whether the armed interference has not fired yet.
    pub fn interference_pending(&self) -> bool {
        self.interference.lock().unwrap().is_some()
    }

    fn take_failing_begin(&self) -> eyre::Result<()> {
        let remaining = self.failing_begins.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_begins.store(remaining - 1, Ordering::SeqCst);
            eyre::bail!("injected begin failure");
        }
        Ok(())
    }

    fn wrap(&self, inner: Box<dyn Transaction>) -> Box<dyn Transaction> {
        Box::new(FlakyTransaction {
            inner,
            slot_updates: 0,
            fail_slot_update_at: self.fail_slot_update_at.clone(),
            interference: self.interference.clone(),
        })
    }
}

#[async_trait]
impl Gateway for FlakyGateway {
    async fn begin(&self) -> eyre::Result<Box<dyn Transaction>> {
        self.take_failing_begin()?;
        Ok(self.wrap(self.inner.begin().await?))
    }

    async fn begin_read(&self) -> eyre::Result<Box<dyn Transaction>> {
        self.take_failing_begin()?;
        Ok(self.wrap(self.inner.begin_read().await?))
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

struct FlakyTransaction {
    inner: Box<dyn Transaction>,
    slot_updates: usize,
    fail_slot_update_at: Arc<AtomicUsize>,
    interference: Arc<Mutex<Option<Interference>>>,
}

impl FlakyTransaction {
    fn take(&self, wanted: Interference) -> bool {
        let mut armed = self.interference.lock().unwrap();
        if *armed == Some(wanted) {
            *armed = None;
            true
        } else {
            false
        }
    }

    /// What a committed confirm leaves behind for reservation `id`.
    async fn confirm_behind_the_scenes(&mut self, id: Option<Uuid>) -> eyre::Result<()> {
        let Some(id) = id else {
            return Ok(());
        };
        self.inner
            .update_reservations(&ReservationFilter::by_id(id), &ReservationPatch {
                status: Some(ReservationStatus::Confirmed),
                expires_at: Some(None),
            })
            .await?;
        self.inner
            .update_slots(&SlotFilter::default().with_reservation(id), &SlotPatch {
                status: Some(SlotStatus::Confirmed),
                hold_expires_at: Some(None),
                reservation_id: Some(None),
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transaction for FlakyTransaction {
    async fn create(&mut self, records: Vec<Record>) -> eyre::Result<()> {
        self.inner.create(records).await
    }

    async fn find_providers(&mut self, filter: &ProviderFilter) -> eyre::Result<Vec<Provider>> {
        self.inner.find_providers(filter).await
    }

    async fn lock_providers(&mut self, filter: &ProviderFilter) -> eyre::Result<Vec<Provider>> {
        self.inner.lock_providers(filter).await
    }

    async fn find_availability(&mut self, filter: &AvailabilityFilter) -> eyre::Result<Vec<Availability>> {
        self.inner.find_availability(filter).await
    }

    async fn find_slots(&mut self, filter: &SlotFilter) -> eyre::Result<Vec<Slot>> {
        self.inner.find_slots(filter).await
    }

    async fn find_reservations(&mut self, filter: &ReservationFilter) -> eyre::Result<Vec<Reservation>> {
        self.inner.find_reservations(filter).await
    }

    async fn update_providers(&mut self, filter: &ProviderFilter, patch: &ProviderPatch) -> eyre::Result<u64> {
        self.inner.update_providers(filter, patch).await
    }

    async fn update_slots(&mut self, filter: &SlotFilter, patch: &SlotPatch) -> eyre::Result<u64> {
        self.slot_updates += 1;
        if self.fail_slot_update_at.load(Ordering::SeqCst) == self.slot_updates {
            eyre::bail!("injected slot update failure");
        }
        let target = SlotFilter {
            ids: filter.ids.clone(),
            ..SlotFilter::default()
        };
        if self.take(Interference::ClaimSlot) {
            self.inner
                .update_slots(&target, &SlotPatch {
                    status: Some(SlotStatus::Reserved),
                    hold_expires_at: Some(Some(now())),
                    reservation_id: Some(Some(Uuid::new_v4())),
                })
                .await?;
        }
        if self.take(Interference::ReleaseSlot) {
            self.inner.update_slots(&target, &SlotPatch::release()).await?;
        }
        self.inner.update_slots(filter, patch).await
    }

    async fn update_reservations(
        &mut self,
        filter: &ReservationFilter,
        patch: &ReservationPatch,
    ) -> eyre::Result<u64> {
        if self.take(Interference::SweepReservation) {
            if let Some(id) = filter.id {
                self.inner.delete_reservations(&ReservationFilter::by_id(id)).await?;
                self.inner
                    .update_slots(&SlotFilter::default().with_reservation(id), &SlotPatch::release())
                    .await?;
            }
        }
        if self.take(Interference::ConfirmReservation) {
            self.confirm_behind_the_scenes(filter.id).await?;
        }
        self.inner.update_reservations(filter, patch).await
    }

    async fn delete_reservations(&mut self, filter: &ReservationFilter) -> eyre::Result<u64> {
        if self.take(Interference::ConfirmReservation) {
            self.confirm_behind_the_scenes(filter.id).await?;
        }
        self.inner.delete_reservations(filter).await
    }

    async fn commit(self: Box<Self>) -> eyre::Result<()> {
        self.inner.commit().await
    }
}
