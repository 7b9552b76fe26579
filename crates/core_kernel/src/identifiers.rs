//! Guest identifiers
//!
//! [`GuestId`] wraps a UUID v7, so identifiers sort by registration time and
//! ordered collections keyed by `GuestId` iterate in registration order.
//! The display form carries a `GST-` prefix; parsing accepts it optionally.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Identifier of a registered guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(Uuid);

impl GuestId {
    /// Display prefix
    pub const PREFIX: &'static str = "GST";

    /// Creates a new time-ordered identifier
    pub fn new_v7() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GuestId {
    fn default() -> Self {
        Self::new_v7()
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", Self::PREFIX, self.0)
    }
}

impl FromStr for GuestId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let uuid_str = raw
            .strip_prefix(Self::PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(raw);
        Ok(Self(Uuid::parse_str(uuid_str)?))
    }
}

impl From<Uuid> for GuestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<GuestId> for Uuid {
    fn from(id: GuestId) -> Uuid {
        id.0
    }
}
