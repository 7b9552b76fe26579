//! Guest and document validation rules
//!
//! # Document strategies
//!
//! Each [`DocumentCategory`] has one stateless strategy implementing
//! [`DocumentValidator`]. The strategy for a category is chosen by the pure
//! function [`validator_for`]; nothing is carried from one selection to the
//! next.
//!
//! - **National ID (CPF)**: 11 digits after stripping punctuation, not a
//!   repeated single digit, and both check digits must match.
//! - **State ID**: 7 to 9 letters or digits after stripping punctuation.
//! - **Passport**: 6 to 9 letters or digits after stripping punctuation.
//!
//! # Guest profile rules
//!
//! - Full name and display name are required
//! - Birth date must be in the past and age must be reasonable (0-150 years)
//! - Document issue dates cannot be in the future
//! - A guest cannot hold the same document number twice

use chrono::{NaiveDate, Utc};
use std::collections::HashSet;

use crate::document::{Document, DocumentCategory};
use crate::error::GuestError;
use crate::guest::Guest;

/// Validation strategy for one document category
pub trait DocumentValidator: Send + Sync {
    /// The category this strategy accepts
    fn category(&self) -> DocumentCategory;

    /// Checks an identifier declared as `category`
    ///
    /// Returns `false` when `category` is not the strategy's own category.
    fn validate(&self, category: DocumentCategory, identifier: &str, issued_date: NaiveDate) -> bool;

    /// Human-readable description of the rule
    fn explain(&self) -> &'static str;
}

/// CPF-style national identity number
#[derive(Debug, Clone, Copy, Default)]
pub struct NationalIdValidator;

/// State identity card number
#[derive(Debug, Clone, Copy, Default)]
pub struct StateIdValidator;

/// Passport number
#[derive(Debug, Clone, Copy, Default)]
pub struct PassportValidator;

const NATIONAL_ID_LENGTH: usize = 11;

/// Numbers with valid check digits that are nonetheless never issued
const NATIONAL_ID_BLOCKLIST: [&str; 10] = [
    "00000000000",
    "11111111111",
    "22222222222",
    "33333333333",
    "44444444444",
    "55555555555",
    "66666666666",
    "77777777777",
    "88888888888",
    "99999999999",
];

impl NationalIdValidator {
    /// Computes a check digit over `digits` with weights starting at `first_weight`
    fn check_digit(digits: &[u32], first_weight: u32) -> u32 {
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

    fn is_valid_number(identifier: &str) -> bool {
        let cleaned: String = identifier.chars().filter(|c| c.is_ascii_digit()).collect();
        if cleaned.len() != NATIONAL_ID_LENGTH {
            return false;
        }
        if NATIONAL_ID_BLOCKLIST.contains(&cleaned.as_str()) {
            return false;
        }

        let digits: Vec<u32> = cleaned.chars().filter_map(|c| c.to_digit(10)).collect();
        let first = Self::check_digit(&digits[..9], 10);
        let second = Self::check_digit(&digits[..10], 11);
        first == digits[9] && second == digits[10]
    }
}

impl DocumentValidator for NationalIdValidator {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::NationalId
    }

    fn validate(&self, category: DocumentCategory, identifier: &str, _issued_date: NaiveDate) -> bool {
        category == self.category() && Self::is_valid_number(identifier)
    }

    fn explain(&self) -> &'static str {
        "national ID must have 11 digits, must not repeat a single digit, and both check digits must match"
    }
}

/// Counts the letters and digits of an identifier
fn alphanumeric_len(identifier: &str) -> usize {
    identifier.chars().filter(|c| c.is_ascii_alphanumeric()).count()
}

impl DocumentValidator for StateIdValidator {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::StateId
    }

    fn validate(&self, category: DocumentCategory, identifier: &str, _issued_date: NaiveDate) -> bool {
        category == self.category() && (7..=9).contains(&alphanumeric_len(identifier))
    }

    fn explain(&self) -> &'static str {
        "state ID must have 7 to 9 letters or digits"
    }
}

impl DocumentValidator for PassportValidator {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::Passport
    }

    fn validate(&self, category: DocumentCategory, identifier: &str, _issued_date: NaiveDate) -> bool {
        category == self.category() && (6..=9).contains(&alphanumeric_len(identifier))
    }

    fn explain(&self) -> &'static str {
        "passport must have 6 to 9 letters or digits"
    }
}

static NATIONAL_ID: NationalIdValidator = NationalIdValidator;
static STATE_ID: StateIdValidator = StateIdValidator;
static PASSPORT: PassportValidator = PassportValidator;

/// Returns the validation strategy for a document category
pub fn validator_for(category: DocumentCategory) -> &'static dyn DocumentValidator {
    match category {
        DocumentCategory::NationalId => &NATIONAL_ID,
        DocumentCategory::StateId => &STATE_ID,
        DocumentCategory::Passport => &PASSPORT,
    }
}

/// Validates a document against the strategy of its declared category
///
/// # Errors
///
/// Returns `GuestError::Validation` carrying the strategy's explanation
pub fn validate_document(document: &Document) -> Result<(), GuestError> {
    let validator = validator_for(document.category);
    if validator.validate(document.category, &document.number, document.issued_date) {
        Ok(())
    } else {
        Err(GuestError::Validation {
            category: document.category,
            identifier: document.number.clone(),
            explanation: validator.explain(),
        })
    }
}

/// Result of guest validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the guest is valid
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal issues)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a successful validation result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates a failed validation result with errors
    pub fn fail(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    /// Adds a warning to the result
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Merges another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Converts the result into `Ok(())` or `GuestError::InvalidData`
    pub fn into_result(self) -> Result<(), GuestError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(GuestError::validation_failed(self.errors))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for guest profiles
///
/// Checks profile data only. Document identifiers are checked by the
/// category strategies and uniqueness across guests by the repository.
pub struct GuestValidator;

impl GuestValidator {
    /// Validates a guest's profile, documents and contacts
    pub fn validate(guest: &Guest) -> ValidationResult {
        let today = Utc::now().date_naive();
        let mut result = ValidationResult::ok();

        result.merge(Self::validate_names(&guest.full_name, &guest.display_name));
        result.merge(Self::validate_birth_date(guest.birth_date, today));

        let mut numbers = HashSet::new();
        for document in &guest.documents {
            if !numbers.insert(document.number.as_str()) {
                result.add_error(format!(
                    "Document number {} appears more than once",
                    document.number
                ));
            }
            result.merge(Self::validate_issued_date(document, guest.birth_date, today));
        }

        let mut contacts = HashSet::new();
        for contact in &guest.contact_numbers {
            if contact.number.trim().is_empty() {
                result.add_error("Contact number cannot be empty");
            }
            if !contacts.insert(contact.digits()) {
                result.add_warning(format!("Contact {} is listed more than once", contact.format()));
            }
        }

        if let Some(address) = &guest.address {
            if address.is_blank() {
                result.add_warning("Address has no data");
            }
        }

        result
    }

    /// Validates full and display names
    pub fn validate_names(full_name: &str, display_name: &str) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if full_name.trim().is_empty() {
            result.add_error("Full name is required");
        }
        if display_name.trim().is_empty() {
            result.add_error("Display name is required");
        }
        result
    }

    /// Validates a birth date against `today`
    pub fn validate_birth_date(birth_date: NaiveDate, today: NaiveDate) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if birth_date > today {
            result.add_error("Birth date cannot be in the future");
        } else if let Some(age) = today.years_since(birth_date) {
            if age > 150 {
                result.add_error(format!("Invalid age: {} years", age));
            }
        }
        result
    }

    /// Validates a document's issue date
    pub fn validate_issued_date(
        document: &Document,
        birth_date: NaiveDate,
        today: NaiveDate,
    ) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if document.issued_date > today {
            result.add_error(format!(
                "Document {} issue date cannot be in the future",
                document.number
            ));
        }
        if document.issued_date < birth_date {
            result.add_warning(format!(
                "Document {} was issued before the holder's birth date",
                document.number
            ));
        }
        result
    }
}
