//! # Carebook Engine
//!
//! The slot lifecycle and reservation consistency engine:
//!
//! - **Expander** turns availability windows into 15-minute slots
//! - **Reservation state machine** moves slots through
//!   `Available -> Reserved -> Confirmed`
//! - **Sweeper** returns expired holds to `Available`
//! - **Query layer** projects slots and reservations by provider, client and date
//!
//! Every mutation is one gateway transaction. Races are settled by
//! conditional updates inside those transactions, never by in-process locks.

pub mod expander;
pub mod policy;
pub mod providers;
pub mod query;
pub mod reservation;
pub mod sweeper;

use std::sync::Arc;

use carebook_core::time::Clock;
use carebook_db::Gateway;

pub use policy::BookingPolicy;
pub use sweeper::ExpirySweeper;

/// Handle shared by request handlers and the sweeper. Cloning is cheap.
#[derive(Clone)]
pub struct BookingEngine {
    gateway: Arc<dyn Gateway>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl BookingEngine {
    pub fn new(gateway: Arc<dyn Gateway>, clock: Arc<dyn Clock>, policy: BookingPolicy) -> Self {
        Self {
            gateway,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }
}
