//! In-process gateway.
//!
//! Write transactions are fully serialised: `begin` takes the write lock on
//! the whole state and stages changes on a copy made at the first write,
//! which `commit` swaps in. Read transactions share the lock and never copy.
//! Uniqueness and reference constraints mirror the PostgreSQL schema.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use carebook_core::models::{
    availability::Availability, provider::Provider, reservation::Reservation, slot::Slot,
};
use eyre::{Result, bail, eyre};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::gateway::{
    AvailabilityFilter, Gateway, ProviderFilter, ProviderPatch, Record, ReservationFilter,
    ReservationPatch, SlotFilter, SlotPatch, Transaction,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default)]
struct MemoryState {
    providers: BTreeMap<String, Provider>,
    availability: HashMap<Uuid, Availability>,
    slots: HashMap<Uuid, Slot>,
    reservations: HashMap<Uuid, Reservation>,
}

impl MemoryState {
    fn insert(&mut self, record: Record) -> Result<()> {
        match record {
            Record::Provider(provider) => {
                if self.providers.contains_key(&provider.id) {
                    bail!("duplicate provider {}", provider.id);
                }
                self.providers.insert(provider.id.clone(), provider);
            }
            Record::Availability(availability) => {
                if !self.providers.contains_key(&availability.provider_id) {
                    bail!("availability references unknown provider {}", availability.provider_id);
                }
                if availability.end_time <= availability.start_time {
                    bail!("availability {} has an empty time range", availability.id);
                }
                let duplicate = self.availability.values().any(|a| {
                    a.id == availability.id
                        || (a.provider_id == availability.provider_id
                            && a.start_time == availability.start_time
                            && a.end_time == availability.end_time)
                });
                if duplicate {
                    bail!("duplicate availability {}", availability.id);
                }
                self.availability.insert(availability.id, availability);
            }
            Record::Slot(slot) => {
                let parent = self
                    .availability
                    .get(&slot.availability_id)
                    .ok_or_else(|| eyre!("slot references unknown availability {}", slot.availability_id))?;
                if slot.start_time < parent.start_time || slot.end_time > parent.end_time {
                    bail!("slot {} lies outside its availability window", slot.id);
                }
                if slot.end_time <= slot.start_time {
                    bail!("slot {} has an empty time range", slot.id);
                }
                let duplicate = self.slots.values().any(|s| {
                    s.id == slot.id
                        || (s.provider_id == slot.provider_id && s.start_time == slot.start_time)
                });
                if duplicate {
                    bail!("duplicate slot {}", slot.id);
                }
                self.slots.insert(slot.id, slot);
            }
            Record::Reservation(reservation) => {
                if !self.slots.contains_key(&reservation.slot_id) {
                    bail!("reservation references unknown slot {}", reservation.slot_id);
                }
                let duplicate = self
                    .reservations
                    .values()
                    .any(|r| r.id == reservation.id || r.slot_id == reservation.slot_id);
                if duplicate {
                    bail!("duplicate reservation for slot {}", reservation.slot_id);
                }
                self.reservations.insert(reservation.id, reservation);
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryGateway {
    state: Arc<RwLock<MemoryState>>,
    closed: Arc<AtomicBool>,
    lock_timeout: Duration,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            closed: Arc::new(AtomicBool::new(false)),
            lock_timeout,
        }
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            bail!("memory gateway is closed");
        }
        Ok(())
    }

    fn timed_out(&self) -> eyre::Report {
        eyre!("timed out after {:?} waiting for a transaction", self.lock_timeout)
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.ensure_open()?;
        let guard = tokio::time::timeout(self.lock_timeout, self.state.clone().write_owned())
            .await
            .map_err(|_| self.timed_out())?;
        Ok(Box::new(MemoryTransaction {
            guard: StateGuard::Write(guard),
            staged: None,
        }))
    }

    async fn begin_read(&self) -> Result<Box<dyn Transaction>> {
        self.ensure_open()?;
        let guard = tokio::time::timeout(self.lock_timeout, self.state.clone().read_owned())
            .await
            .map_err(|_| self.timed_out())?;
        Ok(Box::new(MemoryTransaction {
            guard: StateGuard::Read(guard),
            staged: None,
        }))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        debug!("memory gateway closed");
    }
}

enum StateGuard {
    Read(OwnedRwLockReadGuard<MemoryState>),
    Write(OwnedRwLockWriteGuard<MemoryState>),
}

impl Deref for StateGuard {
    type Target = MemoryState;

    fn deref(&self) -> &MemoryState {
        match self {
            StateGuard::Read(guard) => &**guard,
            StateGuard::Write(guard) => &**guard,
        }
    }
}

struct MemoryTransaction {
    guard: StateGuard,
    staged: Option<MemoryState>,
}

impl MemoryTransaction {
    fn view(&self) -> &MemoryState {
        self.staged.as_ref().unwrap_or(&self.guard)
    }

    fn stage(&mut self) -> Result<&mut MemoryState> {
        if let StateGuard::Read(_) = self.guard {
            bail!("cannot write through a read-only transaction");
        }
        Ok(self.staged.get_or_insert_with(|| MemoryState::clone(&self.guard)))
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn create(&mut self, records: Vec<Record>) -> Result<()> {
        let mut batch = self.stage()?.clone();
        for record in records {
            batch.insert(record)?;
        }
        self.staged = Some(batch);
        Ok(())
    }

    async fn find_providers(&mut self, filter: &ProviderFilter) -> Result<Vec<Provider>> {
        Ok(self
            .view()
            .providers
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn lock_providers(&mut self, filter: &ProviderFilter) -> Result<Vec<Provider>> {
        // Write transactions already exclude each other.
        self.find_providers(filter).await
    }

    async fn find_availability(&mut self, filter: &AvailabilityFilter) -> Result<Vec<Availability>> {
        let mut found: Vec<_> = self
            .view()
            .availability
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.start_time, a.end_time));
        Ok(found)
    }

    async fn find_slots(&mut self, filter: &SlotFilter) -> Result<Vec<Slot>> {
        let mut found: Vec<_> = self
            .view()
            .slots
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.start_time, s.id));
        Ok(found)
    }

    async fn find_reservations(&mut self, filter: &ReservationFilter) -> Result<Vec<Reservation>> {
        let mut found: Vec<_> = self
            .view()
            .reservations
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        Ok(found)
    }

    async fn update_providers(&mut self, filter: &ProviderFilter, patch: &ProviderPatch) -> Result<u64> {
        let mut affected = 0;
        for provider in self.stage()?.providers.values_mut().filter(|p| filter.matches(p)) {
            patch.apply(provider);
            affected += 1;
        }
        Ok(affected)
    }

    async fn update_slots(&mut self, filter: &SlotFilter, patch: &SlotPatch) -> Result<u64> {
        if patch.is_empty() {
            return Ok(0);
        }
        let mut affected = 0;
        for slot in self.stage()?.slots.values_mut().filter(|s| filter.matches(s)) {
            patch.apply(slot);
            affected += 1;
        }
        Ok(affected)
    }

    async fn update_reservations(
        &mut self,
        filter: &ReservationFilter,
        patch: &ReservationPatch,
    ) -> Result<u64> {
        if patch.is_empty() {
            return Ok(0);
        }
        let mut affected = 0;
        for reservation in self
            .stage()?
            .reservations
            .values_mut()
            .filter(|r| filter.matches(r))
        {
            patch.apply(reservation);
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete_reservations(&mut self, filter: &ReservationFilter) -> Result<u64> {
        let reservations = &mut self.stage()?.reservations;
        let before = reservations.len();
        reservations.retain(|_, r| !filter.matches(r));
        Ok((before - reservations.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { guard, staged } = *self;
        if let (StateGuard::Write(mut guard), Some(staged)) = (guard, staged) {
            *guard = staged;
        }
        Ok(())
    }
}
