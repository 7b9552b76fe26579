//! Guest domain errors
//!
//! This module defines the error taxonomy of the guest domain. Every workflow
//! returns either its success value or exactly one of these kinds; none of
//! them is raised after an in-memory mutation has been applied.

use thiserror::Error;

use core_kernel::PortError;

use crate::document::DocumentCategory;

/// Errors that can occur in the guest domain
#[derive(Debug, Error)]
pub enum GuestError {
    /// A document identifier failed the rule of its category
    #[error("Invalid {category} document '{identifier}': {explanation}")]
    Validation {
        category: DocumentCategory,
        identifier: String,
        explanation: &'static str,
    },

    /// The document number already belongs to a stored guest
    #[error("Duplicate document number: {0}")]
    DuplicateDocument(String),

    /// A referenced guest or primary guest does not exist
    #[error("Guest not found: {0}")]
    NotFound(String),

    /// The operation would break the primary/companion structure
    #[error("Invalid guest relation: {0}")]
    InvalidRelation(String),

    /// Guest profile data is malformed
    #[error("Invalid guest data: {0}")]
    InvalidData(String),

    /// The storage collaborator failed; in-memory state is unchanged
    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),
}

impl GuestError {
    /// Creates a NotFound error from any ID type
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        GuestError::NotFound(id.to_string())
    }

    /// Creates a DuplicateDocument error for a document number
    pub fn duplicate_document(number: impl Into<String>) -> Self {
        GuestError::DuplicateDocument(number.into())
    }

    /// Creates an InvalidRelation error with a message
    pub fn invalid_relation(message: impl Into<String>) -> Self {
        GuestError::InvalidRelation(message.into())
    }

    /// Creates an InvalidData error with a message
    pub fn invalid(message: impl Into<String>) -> Self {
        GuestError::InvalidData(message.into())
    }

    /// Creates an InvalidData error from accumulated validation errors
    pub fn validation_failed(errors: Vec<String>) -> Self {
        GuestError::InvalidData(errors.join("; "))
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            GuestError::Validation { .. } => "validation_error",
            GuestError::DuplicateDocument(_) => "duplicate_document",
            GuestError::NotFound(_) => "not_found",
            GuestError::InvalidRelation(_) => "invalid_relation",
            GuestError::InvalidData(_) => "invalid_data",
            GuestError::Persistence(_) => "persistence_error",
        }
    }

    /// Returns true if the error was raised by the storage collaborator
    pub fn is_persistence(&self) -> bool {
        matches!(self, GuestError::Persistence(_))
    }
}
