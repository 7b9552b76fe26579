//! Repository implementations
//!
//! Repositories encapsulate SQL and map between database rows and plain row
//! structs. Multi-table writes run inside a single transaction.

pub mod guest;

pub use guest::{GuestRecord, GuestRecordRepository};
