//! # Slot Expander
//!
//! Turns provider-submitted windows into an Availability record plus its
//! consecutive fixed-length slots, all written in one transaction.
//!
//! Re-submission is idempotent at two levels:
//!
//! 1. a window identical to an existing Availability of the provider is
//!    skipped entirely;
//! 2. a slot whose start the provider already has a slot for (from an
//!    earlier request, or from an overlapping window earlier in this one)
//!    is not created again.
//!
//! Every timestamp is parsed and every window checked against the policy's
//! maximum length and partitioned before the first write, so a malformed
//! request never commits anything.

use std::collections::HashSet;

use carebook_core::{
    errors::{BookingError, BookingResult},
    models::{
        availability::{Availability, SetAvailabilityRequest, SetAvailabilityResponse},
        slot::{Slot, SlotStatus},
    },
    slots::{TimeRange, partition_window},
    time::parse_timestamp,
};
use carebook_db::{
    Record,
    gateway::{AvailabilityFilter, ProviderFilter, SlotFilter},
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::BookingEngine;

impl BookingEngine {
    #[instrument(skip(self, request), fields(windows = request.windows.len()))]
    pub async fn set_availability(
        &self,
        provider_id: &str,
        request: &SetAvailabilityRequest,
    ) -> BookingResult<SetAvailabilityResponse> {
        let planned = request
            .windows
            .iter()
            .map(|window| -> BookingResult<(TimeRange, Vec<TimeRange>)> {
                let range = TimeRange::new(
                    parse_timestamp(&window.start)?,
                    parse_timestamp(&window.end)?,
                )?;
                if range.duration() > self.policy.max_window {
                    return Err(BookingError::Validation(format!(
                        "window {} to {} is longer than {} days",
                        range.start,
                        range.end,
                        self.policy.max_window.num_days()
                    )));
                }
                Ok((range, partition_window(range, self.policy.slot_length)?))
            })
            .collect::<BookingResult<Vec<_>>>()?;

        // Locking the provider queues concurrent submissions for it, so the
        // duplicate checks below see whatever the previous one committed.
        let mut tx = self.gateway.begin().await?;
        if tx.lock_providers(&ProviderFilter::by_id(provider_id)).await?.is_empty() {
            return Err(BookingError::NotFound(format!("Provider {provider_id} not found")));
        }

        let now = self.clock.now();
        let mut records = Vec::new();
        let mut seen_windows = HashSet::new();
        let mut taken_starts = HashSet::new();
        let mut availability_created = 0;
        let mut slots_created = 0;

        for (window, ranges) in planned {
            if !seen_windows.insert(window) {
                continue;
            }
            let existing = tx
                .find_availability(&AvailabilityFilter::window(provider_id, window.start, window.end))
                .await?;
            if !existing.is_empty() {
                debug!(start = %window.start, end = %window.end, "Window already published, skipping");
                continue;
            }

            let occupied = tx
                .find_slots(&SlotFilter::for_provider(provider_id).starting_within(window.start, window.end))
                .await?;
            taken_starts.extend(occupied.into_iter().map(|slot| slot.start_time));

            let availability = Availability {
                id: Uuid::new_v4(),
                provider_id: provider_id.to_string(),
                start_time: window.start,
                end_time: window.end,
                created_at: now,
            };
            let availability_id = availability.id;
            records.push(Record::Availability(availability));
            availability_created += 1;

            for range in ranges {
                if !taken_starts.insert(range.start) {
                    continue;
                }
                records.push(Record::Slot(Slot {
                    id: Uuid::new_v4(),
                    availability_id,
                    provider_id: provider_id.to_string(),
                    start_time: range.start,
                    end_time: range.end,
                    status: SlotStatus::Available,
                    hold_expires_at: None,
                    reservation_id: None,
                }));
                slots_created += 1;
            }
        }

        if !records.is_empty() {
            tx.create(records).await?;
            tx.commit().await?;
        }

        info!(availability_created, slots_created, "Availability set");
        Ok(SetAvailabilityResponse {
            message: "Availability set successfully".to_string(),
            availability_created,
            slots_created,
        })
    }
}
