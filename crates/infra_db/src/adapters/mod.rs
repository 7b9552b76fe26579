//! Domain Adapters
//!
//! Adapter implementations connecting the guest domain's storage port to
//! PostgreSQL. An adapter implements the port trait, translates between
//! domain models and row types, and delegates SQL to the repository layer.

pub mod guest;

pub use guest::PostgresGuestStore;
