//! Guest aggregate and the primary/companion relationship
//!
//! A [`Guest`] is either a *primary* guest or a *companion* travelling with a
//! primary guest. The relationship is stored as identifiers rather than
//! references: `primary_guest` names the primary of a companion, and
//! `companions` lists the companions of a primary. Both sides are resolved
//! through [`crate::repository::GuestRepository`], which keeps them symmetric.
//!
//! # Inheritance
//!
//! A companion receives a snapshot of its primary's address and contact
//! numbers when it is registered. Later contact changes on the primary do not
//! reach existing companions; address changes are pushed explicitly by the
//! update workflow.
//!
//! # Examples
//!
//! ```rust
//! use domain_guest::guest::Guest;
//! use domain_guest::address::Address;
//! use chrono::NaiveDate;
//!
//! let mut primary = Guest::new("Ana Costa", "Ana", NaiveDate::from_ymd_opt(1990, 4, 12).unwrap());
//! primary.address = Some(Address::new("Rua A", "Centro", "Sao Paulo", "SP", "Brazil", "01000-000"));
//!
//! let companion = Guest::companion_of(
//!     &primary,
//!     "Bruno Costa",
//!     "Bruno",
//!     NaiveDate::from_ymd_opt(2015, 9, 3).unwrap(),
//! ).unwrap();
//!
//! assert!(companion.is_companion());
//! assert_eq!(companion.address, primary.address);
//! ```

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::GuestId;

use crate::address::Address;
use crate::contact::ContactNumber;
use crate::document::{normalize_document_number, Document};
use crate::error::GuestError;

/// Whether a guest is a primary guest or a companion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestRole {
    /// Registered on their own; may own companions
    Primary,
    /// Registered under a primary guest
    Companion,
}

impl GuestRole {
    /// Stable string representation used in storage and transport
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestRole::Primary => "primary",
            GuestRole::Companion => "companion",
        }
    }
}

/// A registered guest
///
/// The relation fields are identifiers. A guest is a primary iff
/// `primary_guest` is `None`; only primaries hold companions, and a
/// companion's `companions` list is always empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    /// Unique guest identifier (time-ordered)
    pub id: GuestId,
    /// Legal full name
    pub full_name: String,
    /// Name used at the front desk
    pub display_name: String,
    pub birth_date: NaiveDate,
    /// When the guest was registered; never changes afterwards
    pub registered_at: DateTime<Utc>,
    /// Owned address; a companion's address is a copy of its primary's
    pub address: Option<Address>,
    /// The primary guest of a companion, `None` for primaries
    pub primary_guest: Option<GuestId>,
    /// Companions of a primary guest, in registration order
    #[serde(default)]
    pub companions: Vec<GuestId>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub contact_numbers: Vec<ContactNumber>,
}

impl Guest {
    /// Creates a new primary guest with no address, documents or contacts
    pub fn new(
        full_name: impl Into<String>,
        display_name: impl Into<String>,
        birth_date: NaiveDate,
    ) -> Self {
        Self {
            id: GuestId::new_v7(),
            full_name: full_name.into(),
            display_name: display_name.into(),
            birth_date,
            registered_at: Utc::now(),
            address: None,
            primary_guest: None,
            companions: Vec::new(),
            documents: Vec::new(),
            contact_numbers: Vec::new(),
        }
    }

    /// Creates a companion of `primary`
    ///
    /// The companion's address is a clone of the primary's address (absent if
    /// the primary has none) and its contacts are clones of every current
    /// contact of the primary. The primary itself is not modified; linking is
    /// done by the repository.
    ///
    /// # Errors
    ///
    /// Returns `GuestError::InvalidRelation` if `primary` is itself a companion
    pub fn companion_of(
        primary: &Guest,
        full_name: impl Into<String>,
        display_name: impl Into<String>,
        birth_date: NaiveDate,
    ) -> Result<Self, GuestError> {
        if primary.is_companion() {
            return Err(GuestError::invalid_relation(format!(
                "{} is a companion and cannot have companions",
                primary.id
            )));
        }

        let mut companion = Self::new(full_name, display_name, birth_date);
        companion.primary_guest = Some(primary.id);
        companion.address = primary.address.clone();
        companion.contact_numbers = primary.contact_numbers.clone();
        Ok(companion)
    }

    /// Returns true if the guest has no primary guest
    pub fn is_primary(&self) -> bool {
        self.primary_guest.is_none()
    }

    /// Returns true if the guest travels under a primary guest
    pub fn is_companion(&self) -> bool {
        self.primary_guest.is_some()
    }

    /// Returns the guest's role
    pub fn role(&self) -> GuestRole {
        if self.is_primary() {
            GuestRole::Primary
        } else {
            GuestRole::Companion
        }
    }

    /// Returns true if the guest currently has companions
    pub fn has_companions(&self) -> bool {
        !self.companions.is_empty()
    }

    /// Adds a companion identifier, keeping the list unique
    ///
    /// # Returns
    ///
    /// `false` if the companion was already listed
    pub fn add_companion(&mut self, companion_id: GuestId) -> bool {
        if self.companions.contains(&companion_id) {
            return false;
        }
        self.companions.push(companion_id);
        true
    }

    /// Removes a companion identifier
    ///
    /// # Returns
    ///
    /// `true` if the companion was listed
    pub fn remove_companion(&mut self, companion_id: GuestId) -> bool {
        let before = self.companions.len();
        self.companions.retain(|id| *id != companion_id);
        self.companions.len() != before
    }

    /// Appends a document
    ///
    /// # Errors
    ///
    /// Returns `GuestError::DuplicateDocument` if this guest already holds the number
    pub fn add_document(&mut self, document: Document) -> Result<(), GuestError> {
        if self.holds_document(&document.number) {
            return Err(GuestError::duplicate_document(document.number));
        }
        self.documents.push(document);
        Ok(())
    }

    /// Appends a contact number
    pub fn add_contact_number(&mut self, contact: ContactNumber) {
        self.contact_numbers.push(contact);
    }

    /// Copies the address of `primary` onto this guest, replacing any previous one
    pub fn inherit_address_from(&mut self, primary: &Guest) {
        self.address = primary.address.clone();
    }

    /// Looks up a document by number (any formatting)
    pub fn document(&self, number: &str) -> Option<&Document> {
        let key = normalize_document_number(number);
        self.documents.iter().find(|d| d.number == key)
    }

    /// Returns true if the guest holds the document number
    pub fn holds_document(&self, number: &str) -> bool {
        self.document(number).is_some()
    }

    /// Iterates over the guest's document numbers
    pub fn document_numbers(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.number.as_str())
    }

    /// Age in completed years on `date`
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        if date < self.birth_date {
            return 0;
        }
        let mut age = date.year() - self.birth_date.year();
        if (date.month(), date.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    /// Age in completed years as of today
    pub fn age(&self) -> u32 {
        self.age_on(Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentCategory;

    fn birth() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 4, 12).unwrap()
    }

    fn primary_with_contact() -> Guest {
        let mut primary = Guest::new("Ana Costa", "Ana", birth());
        primary.address = Some(Address::new("Rua A", "Centro", "Sao Paulo", "SP", "Brazil", "01000-000"));
        primary.add_contact_number(ContactNumber::new("11", "99999-1111"));
        primary
    }

    #[test]
    fn test_new_guest_is_primary() {
        let guest = Guest::new("Ana Costa", "Ana", birth());
        assert!(guest.is_primary());
        assert!(!guest.is_companion());
        assert_eq!(guest.role(), GuestRole::Primary);
        assert!(guest.companions.is_empty());
    }

    #[test]
    fn test_companion_inherits_snapshot() {
        let mut primary = primary_with_contact();
        let companion = Guest::companion_of(&primary, "Bruno Costa", "Bruno", birth()).unwrap();

        assert_eq!(companion.primary_guest, Some(primary.id));
        assert_eq!(companion.address, primary.address);
        assert_eq!(companion.contact_numbers, primary.contact_numbers);

        primary.add_contact_number(ContactNumber::new("11", "98888-2222"));
        assert_eq!(companion.contact_numbers.len(), 1);
    }

    #[test]
    fn test_companion_of_companion_is_rejected() {
        let primary = primary_with_contact();
        let companion = Guest::companion_of(&primary, "Bruno Costa", "Bruno", birth()).unwrap();
        let result = Guest::companion_of(&companion, "Carla Costa", "Carla", birth());
        assert!(matches!(result, Err(GuestError::InvalidRelation(_))));
    }

    #[test]
    fn test_companion_of_primary_without_address() {
        let primary = Guest::new("Ana Costa", "Ana", birth());
        let companion = Guest::companion_of(&primary, "Bruno Costa", "Bruno", birth()).unwrap();
        assert!(companion.address.is_none());
        assert!(companion.contact_numbers.is_empty());
    }

    #[test]
    fn test_add_companion_is_unique() {
        let mut primary = Guest::new("Ana Costa", "Ana", birth());
        let id = GuestId::new_v7();
        assert!(primary.add_companion(id));
        assert!(!primary.add_companion(id));
        assert_eq!(primary.companions.len(), 1);
        assert!(primary.remove_companion(id));
        assert!(!primary.remove_companion(id));
    }

    #[test]
    fn test_add_document_rejects_number_held_twice() {
        let mut guest = Guest::new("Ana Costa", "Ana", birth());
        let issued = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        guest
            .add_document(Document::new(DocumentCategory::NationalId, "529.982.247-25", issued))
            .unwrap();
        let again = guest.add_document(Document::new(DocumentCategory::NationalId, "52998224725", issued));
        assert!(matches!(again, Err(GuestError::DuplicateDocument(_))));
        assert!(guest.holds_document("529.982.247-25"));
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        let guest = Guest::new("Ana Costa", "Ana", birth());
        assert_eq!(guest.age_on(NaiveDate::from_ymd_opt(2020, 4, 11).unwrap()), 29);
        assert_eq!(guest.age_on(NaiveDate::from_ymd_opt(2020, 4, 12).unwrap()), 30);
        assert_eq!(guest.age_on(NaiveDate::from_ymd_opt(1980, 1, 1).unwrap()), 0);
    }

    #[test]
    fn test_inherit_address_overwrites() {
        let primary = primary_with_contact();
        let mut other = Guest::new("Carla", "Carla", birth());
        other.address = Some(Address::new("Rua Z", "", "Rio", "RJ", "Brazil", "20000-000"));
        other.inherit_address_from(&primary);
        assert_eq!(other.address, primary.address);
    }
}
