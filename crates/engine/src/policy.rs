use chrono::Duration;
use chrono_tz::Tz;

pub const SLOT_MINUTES: i64 = 15;
pub const LEAD_TIME_HOURS: i64 = 24;
pub const HOLD_MINUTES: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 7;

/// The temporal business rules. Fixed for the lifetime of a process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingPolicy {
    /// Length of every slot.
    pub slot_length: Duration,
    /// Minimum gap between now and a slot's start for it to be reservable.
    pub lead_time: Duration,
    /// How long a reservation holds its slot before the sweeper may reclaim it.
    pub hold_duration: Duration,
    /// Longest window a provider may publish in one piece.
    pub max_window: Duration,
    /// Timezone in which calendar dates are interpreted.
    pub reference_tz: Tz,
}

impl BookingPolicy {
    pub fn with_reference_tz(mut self, tz: Tz) -> Self {
        self.reference_tz = tz;
        self
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            slot_length: Duration::minutes(SLOT_MINUTES),
            lead_time: Duration::hours(LEAD_TIME_HOURS),
            hold_duration: Duration::minutes(HOLD_MINUTES),
            max_window: Duration::days(MAX_WINDOW_DAYS),
            reference_tz: chrono_tz::UTC,
        }
    }
}
