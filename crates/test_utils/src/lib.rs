//! Shared fixtures for the guest registry test suites
//!
//! `fixtures` holds known-good document numbers and ready-made registration
//! requests, `builders` assembles guests and requests with fake names,
//! `generators` feeds the proptest suites and `assertions` checks the
//! primary/companion links of a repository snapshot.

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use generators::*;
