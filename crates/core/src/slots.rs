//! Partitioning of availability windows into fixed-length slots.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> BookingResult<Self> {
        if end <= start {
            return Err(BookingError::Validation(format!(
                "window end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Splits `window` into consecutive `slot_len` ranges.
///
/// A trailing remainder shorter than `slot_len` is dropped: every returned
/// range lies fully inside the window. A window shorter than one slot is a
/// validation error.
pub fn partition_window(window: TimeRange, slot_len: Duration) -> BookingResult<Vec<TimeRange>> {
    if slot_len <= Duration::zero() {
        return Err(BookingError::Validation(
            "slot length must be positive".to_string(),
        ));
    }
    if window.duration() < slot_len {
        return Err(BookingError::Validation(format!(
            "window [{}, {}) is shorter than one {}-minute slot",
            window.start,
            window.end,
            slot_len.num_minutes()
        )));
    }

    let mut slots = Vec::new();
    let mut cursor = window.start;
    while cursor + slot_len <= window.end {
        slots.push(TimeRange {
            start: cursor,
            end: cursor + slot_len,
        });
        cursor = cursor + slot_len;
    }
    Ok(slots)
}
