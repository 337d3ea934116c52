//! PostgreSQL statements, one module per table. Every function runs on the
//! caller's connection so it participates in the caller's transaction.

pub mod availability;
pub mod provider;
pub mod reservation;
pub mod slot;
