//! # Carebook Core
//!
//! Domain types shared by every layer of the booking service: the four
//! persisted records, their closed status enumerations, the error taxonomy,
//! and the time helpers that define the wire formats.

pub mod errors;
pub mod models;
pub mod slots;
pub mod time;
