pub mod availability;
pub mod provider;
pub mod reservation;
pub mod slot;
