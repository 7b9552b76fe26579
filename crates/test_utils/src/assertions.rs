//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use domain_guest::{Guest, GuestError, GuestRepository};

/// Asserts that a repository satisfies every registry invariant
///
/// # Panics
///
/// Panics listing each violated invariant
pub fn assert_registry_consistent(repository: &GuestRepository) {
    let violations = repository.check_invariants();
    assert!(
        violations.is_empty(),
        "Registry invariants violated:\n  {}",
        violations.join("\n  ")
    );
}

/// Asserts that an error has the expected kind (see [`GuestError::kind`])
pub fn assert_error_kind<T: std::fmt::Debug>(result: &Result<T, GuestError>, kind: &str) {
    match result {
        Ok(value) => panic!("Expected {} error, got Ok({:?})", kind, value),
        Err(error) => assert_eq!(
            error.kind(),
            kind,
            "Expected {} error, got {}: {}",
            kind,
            error.kind(),
            error
        ),
    }
}

/// Asserts that a companion is linked to its primary on both sides
pub fn assert_companion_of(companion: &Guest, primary: &Guest) {
    assert_eq!(
        companion.primary_guest,
        Some(primary.id),
        "Guest {} does not reference primary {}",
        companion.id,
        primary.id
    );
    assert!(
        primary.companions.contains(&companion.id),
        "Primary {} does not list companion {}",
        primary.id,
        companion.id
    );
}

/// Asserts that two guests hold equal but separately owned addresses
pub fn assert_same_address(left: &Guest, right: &Guest) {
    assert_eq!(
        left.address, right.address,
        "Addresses of {} and {} differ",
        left.id, right.id
    );
}

/// Asserts that no guest in the slice references any removed guest
pub fn assert_no_references_to(guests: &[Guest], removed: &[Guest]) {
    for guest in guests {
        for gone in removed {
            assert_ne!(
                guest.primary_guest,
                Some(gone.id),
                "{} still references removed primary {}",
                guest.id,
                gone.id
            );
            assert!(
                !guest.companions.contains(&gone.id),
                "{} still lists removed companion {}",
                guest.id,
                gone.id
            );
        }
    }
}
