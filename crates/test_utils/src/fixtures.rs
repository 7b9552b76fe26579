//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for guests, documents and addresses.
//! These fixtures are designed to be consistent and predictable for unit tests.

use chrono::NaiveDate;
use core_kernel::GuestId;
use domain_guest::{Address, ContactNumber, Document, DocumentCategory};
use once_cell::sync::Lazy;
use uuid::Uuid;

/// National ID numbers with valid check digits
pub static VALID_NATIONAL_IDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "52998224725",
        "12345678909",
        "98765432100",
        "39053344705",
        "11144477735",
        "01535954000",
    ]
});

/// Fixture for document numbers
pub struct DocumentFixtures;

impl DocumentFixtures {
    /// Valid national ID in its formatted form
    pub fn valid_national_id_formatted() -> &'static str {
        "529.982.247-25"
    }

    /// Valid national ID, digits only
    pub fn valid_national_id() -> &'static str {
        "52998224725"
    }

    /// A second valid national ID
    pub fn other_national_id() -> &'static str {
        "123.456.789-09"
    }

    /// Repeated-digit national ID; check digits match but it is never issued
    pub fn repeated_digit_national_id() -> &'static str {
        "111.111.111-11"
    }

    /// National ID with a wrong second check digit
    pub fn bad_check_digit_national_id() -> &'static str {
        "123.456.789-00"
    }

    /// Valid state ID
    pub fn valid_state_id() -> &'static str {
        "MG1234567"
    }

    /// Valid passport number
    pub fn valid_passport() -> &'static str {
        "FZ123456"
    }

    /// Passport number that is too short
    pub fn short_passport() -> &'static str {
        "AB12"
    }

    /// Standard issue date for documents
    pub fn issued_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2012, 5, 5).unwrap()
    }

    /// Valid national ID document
    pub fn national_id() -> Document {
        Document::new(DocumentCategory::NationalId, Self::valid_national_id(), Self::issued_date())
    }

    /// Valid passport document
    pub fn passport() -> Document {
        Document::new(DocumentCategory::Passport, Self::valid_passport(), Self::issued_date())
    }

    /// Valid state ID document
    pub fn state_id() -> Document {
        Document::new(DocumentCategory::StateId, Self::valid_state_id(), Self::issued_date())
    }

    /// The n-th valid national ID document (wraps around)
    pub fn nth_national_id(n: usize) -> Document {
        let number = VALID_NATIONAL_IDS[n % VALID_NATIONAL_IDS.len()];
        Document::new(DocumentCategory::NationalId, number, Self::issued_date())
    }
}

/// Fixture for addresses
pub struct AddressFixtures;

impl AddressFixtures {
    /// Address in Sao Paulo
    pub fn sao_paulo() -> Address {
        Address::new("Rua A, 100", "Centro", "Sao Paulo", "SP", "Brazil", "01000-000")
    }

    /// Address in Rio de Janeiro
    pub fn rio() -> Address {
        Address::new(
            "Avenida Atlantica, 1702",
            "Copacabana",
            "Rio de Janeiro",
            "RJ",
            "Brazil",
            "22021-001",
        )
    }
}

/// Fixture for contact numbers
pub struct ContactFixtures;

impl ContactFixtures {
    /// Mobile number in Sao Paulo
    pub fn mobile() -> ContactNumber {
        ContactNumber::new("11", "99999-1111")
    }

    /// Second mobile number
    pub fn other_mobile() -> ContactNumber {
        ContactNumber::new("21", "98888-2222")
    }
}

/// Fixture for guest profile data
pub struct GuestFixtures;

impl GuestFixtures {
    /// Standard primary guest name
    pub fn primary_name() -> (&'static str, &'static str) {
        ("Ana Costa", "Ana")
    }

    /// Standard companion name
    pub fn companion_name() -> (&'static str, &'static str) {
        ("Bruno Costa", "Bruno")
    }

    /// Adult birth date
    pub fn adult_birth_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 4, 12).unwrap()
    }

    /// Child birth date
    pub fn child_birth_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 9, 3).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic guest ID for testing
    pub fn guest_id() -> GuestId {
        GuestId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// Creates a guest ID that is never registered
    pub fn unknown_guest_id() -> GuestId {
        GuestId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-4466554400ff").unwrap())
    }
}
