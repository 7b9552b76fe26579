//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{Duration, NaiveDate};
use core_kernel::GuestId;
use domain_guest::{Address, ContactNumber, Document, DocumentCategory};
use proptest::prelude::*;

/// Computes a national ID check digit; weights run down from `first_weight` to 2
pub fn national_id_check_digit(digits: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    match sum % 11 {
        0 | 1 => 0,
        remainder => 11 - remainder,
    }
}

/// Completes nine base digits with both check digits
pub fn national_id_from_base(base: &[u32; 9]) -> String {
    let mut digits = base.to_vec();
    digits.push(national_id_check_digit(&digits, 10));
    digits.push(national_id_check_digit(&digits, 11));
    digits.iter().map(|d| char::from_digit(*d, 10).unwrap_or('0')).collect()
}

fn base_digits_strategy() -> impl Strategy<Value = [u32; 9]> {
    proptest::array::uniform9(0u32..10)
        .prop_filter("repeated digits are never issued", |d| d.iter().any(|x| *x != d[0]))
}

/// Strategy for valid national ID numbers (digits only)
pub fn valid_national_id_strategy() -> impl Strategy<Value = String> {
    base_digits_strategy().prop_map(|base| national_id_from_base(&base))
}

/// Strategy for valid national ID numbers in the `000.000.000-00` mask
pub fn formatted_national_id_strategy() -> impl Strategy<Value = String> {
    valid_national_id_strategy().prop_map(|n| {
        format!("{}.{}.{}-{}", &n[0..3], &n[3..6], &n[6..9], &n[9..11])
    })
}

/// Strategy for national IDs whose second check digit is wrong
pub fn bad_check_digit_national_id_strategy() -> impl Strategy<Value = String> {
    (base_digits_strategy(), 1u32..10).prop_map(|(base, offset)| {
        let valid = national_id_from_base(&base);
        let last = valid.chars().last().and_then(|c| c.to_digit(10)).unwrap_or(0);
        let wrong = (last + offset) % 10;
        format!("{}{}", &valid[..10], wrong)
    })
}

/// Strategy for passport numbers (6 to 9 upper-case letters or digits)
pub fn passport_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2}[0-9]{4,7}"
}

/// Strategy for state ID numbers (7 to 9 upper-case letters or digits)
pub fn state_id_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2}[0-9]{5,7}"
}

/// Strategy for arbitrary identifiers, valid or not
pub fn arbitrary_identifier_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9.\\- ]{0,16}"
}

/// Strategy for document categories
pub fn document_category_strategy() -> impl Strategy<Value = DocumentCategory> {
    prop_oneof![
        Just(DocumentCategory::NationalId),
        Just(DocumentCategory::StateId),
        Just(DocumentCategory::Passport),
    ]
}

/// Strategy for issue dates between 2000 and 2020
pub fn issued_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..7300).prop_map(|days| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(days)
    })
}

/// Strategy for adult birth dates between 1940 and 1999
pub fn birth_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..21900).prop_map(|days| {
        NaiveDate::from_ymd_opt(1940, 1, 1).unwrap() + Duration::days(days)
    })
}

/// Strategy for valid documents of any category
pub fn valid_document_strategy() -> impl Strategy<Value = Document> {
    prop_oneof![
        (valid_national_id_strategy(), issued_date_strategy())
            .prop_map(|(n, d)| Document::new(DocumentCategory::NationalId, &n, d)),
        (state_id_strategy(), issued_date_strategy())
            .prop_map(|(n, d)| Document::new(DocumentCategory::StateId, &n, d)),
        (passport_strategy(), issued_date_strategy())
            .prop_map(|(n, d)| Document::new(DocumentCategory::Passport, &n, d)),
    ]
}

/// Strategy for person names
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10} [A-Z][a-z]{2,12}"
}

/// Strategy for addresses
pub fn address_strategy() -> impl Strategy<Value = Address> {
    (
        "Rua [A-Z][a-z]{3,10}, [0-9]{1,4}",
        "[A-Z][a-z]{3,10}",
        "[A-Z][a-z]{3,12}",
        "[A-Z]{2}",
        "[0-9]{5}-[0-9]{3}",
    )
        .prop_map(|(street, district, city, region, postal_code)| {
            Address::new(street, district, city, region, "Brazil", postal_code)
        })
}

/// Strategy for contact numbers
pub fn contact_strategy() -> impl Strategy<Value = ContactNumber> {
    ("[1-9][0-9]", "9[0-9]{4}-[0-9]{4}")
        .prop_map(|(area_code, number)| ContactNumber::new(area_code, number))
}

/// Strategy for generating GuestId
pub fn guest_id_strategy() -> impl Strategy<Value = GuestId> {
    any::<[u8; 16]>().prop_map(|bytes| GuestId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}
