//! Core Kernel - Foundational types shared by every crate of the guest registry
//!
//! This crate provides the building blocks used across the workspace:
//! - Strongly-typed identifiers
//! - Port infrastructure for the hexagonal (ports and adapters) layout
//! - Common error types

pub mod identifiers;
pub mod ports;
pub mod error;

pub use identifiers::GuestId;
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckable, HealthCheckResult,
    OperationMetadata,
};
pub use error::CoreError;
