//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else. Names default to random fake names.

use chrono::NaiveDate;
use fake::faker::name::en::{FirstName, Name};
use fake::Fake;

use domain_guest::{
    Address, ContactNumber, Document, Guest, GuestError, RegisterCompanion, RegisterPrimary,
};

use crate::fixtures::{AddressFixtures, ContactFixtures, DocumentFixtures, GuestFixtures};

fn fake_names() -> (String, String) {
    let full_name: String = Name().fake();
    let display_name: String = FirstName().fake();
    (full_name, display_name)
}

/// Builder for stand-alone [`Guest`] values (no repository involved)
pub struct TestGuestBuilder {
    full_name: String,
    display_name: String,
    birth_date: NaiveDate,
    address: Option<Address>,
    documents: Vec<Document>,
    contacts: Vec<ContactNumber>,
}

impl Default for TestGuestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestGuestBuilder {
    /// Creates a new builder with a valid national ID and a Sao Paulo address
    pub fn new() -> Self {
        let (full_name, display_name) = fake_names();
        Self {
            full_name,
            display_name,
            birth_date: GuestFixtures::adult_birth_date(),
            address: Some(AddressFixtures::sao_paulo()),
            documents: vec![DocumentFixtures::national_id()],
            contacts: vec![ContactFixtures::mobile()],
        }
    }

    /// Sets both names
    pub fn with_names(mut self, full_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self.display_name = display_name.into();
        self
    }

    /// Sets the birth date
    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = birth_date;
        self
    }

    /// Sets the address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Removes the address
    pub fn without_address(mut self) -> Self {
        self.address = None;
        self
    }

    /// Replaces the documents with a single one
    pub fn with_document(mut self, document: Document) -> Self {
        self.documents = vec![document];
        self
    }

    /// Removes all documents
    pub fn without_documents(mut self) -> Self {
        self.documents.clear();
        self
    }

    /// Adds a contact number
    pub fn with_contact(mut self, contact: ContactNumber) -> Self {
        self.contacts.push(contact);
        self
    }

    fn fill(self, mut guest: Guest, inherit_contacts: bool) -> Guest {
        if !inherit_contacts {
            guest.address = self.address;
            guest.contact_numbers = self.contacts;
        }
        guest.documents = self.documents;
        guest
    }

    /// Builds a primary guest
    pub fn build(self) -> Guest {
        let guest = Guest::new(self.full_name.clone(), self.display_name.clone(), self.birth_date);
        self.fill(guest, false)
    }

    /// Builds a companion of `primary`, inheriting its address and contacts
    pub fn build_companion_of(self, primary: &Guest) -> Result<Guest, GuestError> {
        let guest = Guest::companion_of(
            primary,
            self.full_name.clone(),
            self.display_name.clone(),
            self.birth_date,
        )?;
        Ok(self.fill(guest, true))
    }
}

/// Builder for [`RegisterPrimary`] requests
pub struct RegisterPrimaryBuilder {
    full_name: String,
    display_name: String,
    birth_date: NaiveDate,
    address: Address,
    contact: ContactNumber,
    document: Document,
}

impl Default for RegisterPrimaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterPrimaryBuilder {
    /// Creates a new builder with valid defaults
    pub fn new() -> Self {
        let (full_name, display_name) = fake_names();
        Self {
            full_name,
            display_name,
            birth_date: GuestFixtures::adult_birth_date(),
            address: AddressFixtures::sao_paulo(),
            contact: ContactFixtures::mobile(),
            document: DocumentFixtures::national_id(),
        }
    }

    /// Sets both names
    pub fn with_names(mut self, full_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self.display_name = display_name.into();
        self
    }

    /// Sets the birth date
    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = birth_date;
        self
    }

    /// Sets the address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Sets the contact number
    pub fn with_contact(mut self, contact: ContactNumber) -> Self {
        self.contact = contact;
        self
    }

    /// Sets the document
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    /// Builds the request
    pub fn build(self) -> RegisterPrimary {
        RegisterPrimary {
            full_name: self.full_name,
            display_name: self.display_name,
            birth_date: self.birth_date,
            address: self.address,
            contact: self.contact,
            document: self.document,
        }
    }
}

/// Builder for [`RegisterCompanion`] requests
pub struct RegisterCompanionBuilder {
    full_name: String,
    display_name: String,
    birth_date: NaiveDate,
    document: Document,
}

impl Default for RegisterCompanionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterCompanionBuilder {
    /// Creates a new builder with a passport and a child's birth date
    pub fn new() -> Self {
        let (full_name, display_name) = fake_names();
        Self {
            full_name,
            display_name,
            birth_date: GuestFixtures::child_birth_date(),
            document: DocumentFixtures::passport(),
        }
    }

    /// Sets both names
    pub fn with_names(mut self, full_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self.display_name = display_name.into();
        self
    }

    /// Sets the birth date
    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = birth_date;
        self
    }

    /// Sets the document
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    /// Builds the request
    pub fn build(self) -> RegisterCompanion {
        RegisterCompanion {
            full_name: self.full_name,
            display_name: self.display_name,
            birth_date: self.birth_date,
            document: self.document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_builder_defaults() {
        let guest = TestGuestBuilder::new().build();
        assert!(guest.is_primary());
        assert!(!guest.full_name.is_empty());
        assert_eq!(guest.documents.len(), 1);
        assert_eq!(guest.contact_numbers.len(), 1);
    }

    #[test]
    fn test_companion_builder_inherits() {
        let primary = TestGuestBuilder::new().with_contact(ContactFixtures::other_mobile()).build();
        let companion = TestGuestBuilder::new()
            .with_document(DocumentFixtures::passport())
            .build_companion_of(&primary)
            .unwrap();
        assert_eq!(companion.primary_guest, Some(primary.id));
        assert_eq!(companion.address, primary.address);
        assert_eq!(companion.contact_numbers, primary.contact_numbers);
    }

    #[test]
    fn test_register_primary_builder() {
        let request = RegisterPrimaryBuilder::new()
            .with_names("Ana Costa", "Ana")
            .build();
        assert_eq!(request.full_name, "Ana Costa");
        assert_eq!(request.document, DocumentFixtures::national_id());
    }
}
