//! # Expiry Sweeper
//!
//! Reclaims holds whose expiry has passed. Each pass is a single
//! transaction: either every release in the pass commits or none does, and
//! a failed pass is simply retried on the next tick.
//!
//! The loop stops when its [`CancellationToken`] fires. A pass that has
//! already started runs to completion first.

use std::time::Duration;

use carebook_core::{
    errors::BookingResult,
    models::{reservation::ReservationStatus, slot::SlotStatus},
};
use carebook_db::gateway::{ReservationFilter, SlotFilter, SlotPatch};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::BookingEngine;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

impl BookingEngine {
    /// Releases every `Reserved` hold that expired strictly before now.
    /// Returns the number of slots made available again.
    pub async fn sweep_expired(&self) -> BookingResult<usize> {
        let now = self.clock.now();
        let mut tx = self.gateway.begin().await?;

        let expired = tx
            .find_reservations(
                &ReservationFilter::default()
                    .with_status(ReservationStatus::Reserved)
                    .expiring_before(now),
            )
            .await?;

        let mut released = 0;
        for reservation in &expired {
            // Re-checked at write time so a reservation confirmed meanwhile is left alone.
            let removed = tx
                .delete_reservations(
                    &ReservationFilter::by_id(reservation.id)
                        .with_status(ReservationStatus::Reserved)
                        .expiring_before(now),
                )
                .await?;
            if removed == 0 {
                continue;
            }

            let slot_filter = SlotFilter::by_id(reservation.slot_id)
                .with_reservation(reservation.id)
                .with_status(SlotStatus::Reserved);
            if tx.update_slots(&slot_filter, &SlotPatch::release()).await? == 0 {
                warn!(
                    reservation_id = %reservation.id,
                    slot_id = %reservation.slot_id,
                    "Expired reservation did not hold its slot; removed the dangling reservation"
                );
                continue;
            }
            released += 1;
        }

        tx.commit().await?;
        Ok(released)
    }
}

pub struct ExpirySweeper {
    engine: BookingEngine,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(engine: BookingEngine, interval: Duration) -> Self {
        Self { engine, interval }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "Expiry sweeper starting");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.engine.sweep_expired().await {
                Ok(0) => debug!("Expired reservations cleaned up: 0 records processed"),
                Ok(released) => info!(released, "Expired reservations cleaned up"),
                Err(err) if err.is_infrastructure() => {
                    error!(error = %err, "Expiry sweep failed; retrying on next tick")
                }
                Err(err) => warn!(error = %err, "Expiry sweep rejected; retrying on next tick"),
            }
        }

        info!("Expiry sweeper stopped");
    }
}
