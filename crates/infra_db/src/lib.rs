//! Infrastructure Database Layer
//!
//! This crate provides PostgreSQL persistence for the guest registry using SQLx.
//!
//! # Architecture
//!
//! - [`pool`]: connection pool configuration and embedded migrations
//! - [`repositories`]: SQL access to the guest tables
//! - [`adapters`]: [`PostgresGuestStore`], the `GuestStorePort` implementation
//!
//! Every write coming from the domain is a changeset applied in one
//! transaction, so a failed write leaves the tables untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{connect, DatabaseConfig, PostgresGuestStore};
//!
//! let pool = connect(&DatabaseConfig::new("postgres://localhost/guest_registry")).await?;
//! let store = PostgresGuestStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PostgresGuestStore;
pub use error::DatabaseError;
pub use pool::{connect, create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
