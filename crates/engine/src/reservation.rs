//! # Reservation State Machine
//!
//! ```text
//! Available --reserve--> Reserved --confirm--> Confirmed
//!     ^                      |
//!     +-------expiry---------+
//! ```
//!
//! Reserve claims a slot with a conditional update (`status = available`),
//! so of two concurrent reservations for one slot exactly one affects a row.
//! Confirm flips the reservation first and the slot second; the sweeper
//! takes locks in the same order.

use carebook_core::{
    errors::{BookingError, BookingResult},
    models::{
        reservation::{
            ConfirmReservationResponse, Reservation, ReservationStatus, ReserveSlotResponse,
        },
        slot::SlotStatus,
    },
};
use carebook_db::{
    Record,
    gateway::{ReservationFilter, ReservationPatch, SlotFilter, SlotPatch},
};
use eyre::eyre;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::BookingEngine;

impl BookingEngine {
    #[instrument(skip(self))]
    pub async fn reserve_slot(&self, slot_id: Uuid, client_id: &str) -> BookingResult<ReserveSlotResponse> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(BookingError::Validation("client id must not be empty".to_string()));
        }

        let now = self.clock.now();
        let mut tx = self.gateway.begin().await?;

        let slot = tx
            .find_slots(&SlotFilter::by_id(slot_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::NotFound(format!("Slot {slot_id} not found")))?;

        // The lead-time rule is checked before status so a too-soon slot always reports it.
        if slot.start_time < now + self.policy.lead_time {
            return Err(BookingError::LeadTimeViolation {
                slot_start: slot.start_time,
                lead_hours: self.policy.lead_time.num_hours(),
            });
        }
        if !slot.status.can_transition_to(SlotStatus::Reserved) {
            return Err(BookingError::SlotUnavailable(slot_id));
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            slot_id,
            client_id: client_id.to_string(),
            provider_id: slot.provider_id.clone(),
            status: ReservationStatus::Reserved,
            expires_at: Some(now + self.policy.hold_duration),
            created_at: now,
        };

        let claim = SlotPatch {
            status: Some(SlotStatus::Reserved),
            hold_expires_at: Some(reservation.expires_at),
            reservation_id: Some(Some(reservation.id)),
        };
        let claimed = tx
            .update_slots(&SlotFilter::by_id(slot_id).with_status(SlotStatus::Available), &claim)
            .await?;
        if claimed == 0 {
            debug!("Lost the race for the slot");
            return Err(BookingError::SlotUnavailable(slot_id));
        }

        let reservation_id = reservation.id;
        let expires_at = now + self.policy.hold_duration;
        tx.create(vec![Record::Reservation(reservation)]).await?;
        tx.commit().await?;

        info!(%reservation_id, %expires_at, "Slot reserved");
        Ok(ReserveSlotResponse {
            reservation_id,
            slot_id,
            expires_at,
            message: "Slot reserved successfully".to_string(),
        })
    }

    #[instrument(skip(self))]
    pub async fn confirm_reservation(&self, reservation_id: Uuid) -> BookingResult<ConfirmReservationResponse> {
        let mut tx = self.gateway.begin().await?;

        let reservation = tx
            .find_reservations(&ReservationFilter::by_id(reservation_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::NotFound(format!("Reservation {reservation_id} not found")))?;
        if reservation.status == ReservationStatus::Confirmed {
            return Err(BookingError::AlreadyConfirmed(reservation_id));
        }

        let confirm = ReservationPatch {
            status: Some(ReservationStatus::Confirmed),
            expires_at: Some(None),
        };
        let confirmed = tx
            .update_reservations(
                &ReservationFilter::by_id(reservation_id).with_status(ReservationStatus::Reserved),
                &confirm,
            )
            .await?;
        if confirmed == 0 {
            // Settled by a concurrent transaction between our read and our write.
            let current = tx.find_reservations(&ReservationFilter::by_id(reservation_id)).await?;
            return Err(match current.first() {
                Some(_) => BookingError::AlreadyConfirmed(reservation_id),
                None => BookingError::NotFound(format!("Reservation {reservation_id} not found")),
            });
        }

        let finalize = SlotPatch {
            status: Some(SlotStatus::Confirmed),
            hold_expires_at: Some(None),
            reservation_id: None,
        };
        let slot_filter = SlotFilter::by_id(reservation.slot_id)
            .with_reservation(reservation_id)
            .with_status(SlotStatus::Reserved);
        if tx.update_slots(&slot_filter, &finalize).await? == 0 {
            return Err(BookingError::Database(eyre!(
                "slot {} is not held by reservation {reservation_id}",
                reservation.slot_id
            )));
        }
        tx.commit().await?;

        info!("Reservation confirmed");
        Ok(ConfirmReservationResponse {
            reservation_id,
            message: "Reservation confirmed".to_string(),
        })
    }
}
