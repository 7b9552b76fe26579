//! Guest Management Domain
//!
//! This crate manages resort guests: who they are, which identity documents
//! they hold, how to reach them and who they travel with.
//!
//! # Guest Model
//!
//! - **Primary guest**: registered on their own; may bring companions
//! - **Companion**: registered under a primary guest; inherits a snapshot of
//!   the primary's address and contact numbers
//!
//! Companions never hold companions, and every document number is unique
//! across the whole guest population.
//!
//! # Layers
//!
//! - [`guest`], [`address`], [`contact`], [`document`]: value records
//! - [`validation`]: one validation strategy per document category, plus
//!   profile checks
//! - [`repository`]: the in-memory registry enforcing the invariants
//! - [`ports`]: the storage port and its in-memory adapter
//! - [`workflow`]: [`GuestService`], the registration and update workflows
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use domain_guest::{
//!     Address, ContactNumber, Document, DocumentCategory, GuestService,
//!     GuestServiceConfig, InMemoryGuestStore, RegisterPrimary,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let service = GuestService::new(Arc::new(InMemoryGuestStore::new()), GuestServiceConfig::default());
//!
//! let ana = service.register_primary(RegisterPrimary {
//!     full_name: "Ana Costa".to_string(),
//!     display_name: "Ana".to_string(),
//!     birth_date: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
//!     address: Address::new("Rua A", "Centro", "Sao Paulo", "SP", "Brazil", "01000-000"),
//!     contact: ContactNumber::new("11", "99999-1111"),
//!     document: Document::new(
//!         DocumentCategory::NationalId,
//!         "529.982.247-25",
//!         NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
//!     ),
//! }).await.unwrap();
//!
//! let found = service.find_by_document_number("52998224725").await.unwrap();
//! assert_eq!(found.id, ana.id);
//! # }
//! ```

pub mod address;
pub mod contact;
pub mod document;
pub mod error;
pub mod guest;
pub mod ports;
pub mod repository;
pub mod validation;
pub mod workflow;

pub use address::Address;
pub use contact::ContactNumber;
pub use document::{normalize_document_number, Document, DocumentCategory};
pub use error::GuestError;
pub use guest::{Guest, GuestRole};
pub use ports::memory::InMemoryGuestStore;
pub use ports::{GuestQuery, GuestStorePort, GuestStorePortExt};
pub use repository::{Changeset, CompanionRemovalPolicy, GuestRepository, RemovedGuest};
pub use validation::{
    validate_document, validator_for, DocumentValidator, GuestValidator, NationalIdValidator,
    PassportValidator, StateIdValidator, ValidationResult,
};
pub use workflow::{GuestService, GuestServiceConfig, RegisterCompanion, RegisterPrimary, UpdateProfile};
