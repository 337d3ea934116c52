pub mod health;
pub mod providers;
pub mod reservations;
pub mod slots;
