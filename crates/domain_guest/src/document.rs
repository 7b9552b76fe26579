//! Identity documents and their categories

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GuestError;

/// Category of an identity document
///
/// The set is closed: every category has exactly one validation strategy in
/// [`crate::validation`], so adding a category means adding a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    /// National taxpayer identity number (CPF)
    NationalId,
    /// State-issued identity card (RG)
    StateId,
    /// Passport
    Passport,
}

impl DocumentCategory {
    /// All categories, in declaration order
    pub const ALL: [DocumentCategory; 3] = [
        DocumentCategory::NationalId,
        DocumentCategory::StateId,
        DocumentCategory::Passport,
    ];

    /// Stable string representation used in storage and transport
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::NationalId => "national_id",
            DocumentCategory::StateId => "state_id",
            DocumentCategory::Passport => "passport",
        }
    }

    /// Normalises a raw number into the stored form for this category
    ///
    /// National IDs keep digits only; the other categories keep letters and
    /// digits, upper-cased.
    pub fn normalize(&self, raw: &str) -> String {
        match self {
            DocumentCategory::NationalId => {
                raw.chars().filter(|c| c.is_ascii_digit()).collect()
            }
            DocumentCategory::StateId | DocumentCategory::Passport => {
                normalize_document_number(raw)
            }
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentCategory {
    type Err = GuestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "national_id" | "cpf" => Ok(DocumentCategory::NationalId),
            "state_id" | "rg" => Ok(DocumentCategory::StateId),
            "passport" => Ok(DocumentCategory::Passport),
            other => Err(GuestError::invalid(format!("Unknown document category: {}", other))),
        }
    }
}

/// Normalises a document number to its lookup key
///
/// Keeps ASCII letters and digits and upper-cases letters, so that
/// `529.982.247-25` and `52998224725` refer to the same document.
/// Lookups use this form since the caller may not know the category.
pub fn normalize_document_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// An identity document held by a guest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Normalised document number; unique across all guests
    pub number: String,
    pub category: DocumentCategory,
    pub issued_date: NaiveDate,
}

impl Document {
    /// Creates a document, normalising its number
    pub fn new(category: DocumentCategory, number: &str, issued_date: NaiveDate) -> Self {
        Self {
            number: category.normalize(number),
            category,
            issued_date,
        }
    }

    /// Renders the number in the canonical display form of its category
    pub fn formatted(&self) -> String {
        match self.category {
            DocumentCategory::NationalId if self.number.len() == 11 => format!(
                "{}.{}.{}-{}",
                &self.number[0..3],
                &self.number[3..6],
                &self.number[6..9],
                &self.number[9..11]
            ),
            _ => self.number.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued() -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 3, 10).unwrap()
    }

    #[test]
    fn test_normalize_strips_punctuation_and_uppercases() {
        assert_eq!(normalize_document_number("529.982.247-25"), "52998224725");
        assert_eq!(normalize_document_number("ab 12-34.5"), "AB12345");
    }

    #[test]
    fn test_new_normalizes_number() {
        let document = Document::new(DocumentCategory::NationalId, "529.982.247-25", issued());
        assert_eq!(document.number, "52998224725");
    }

    #[test]
    fn test_national_id_keeps_digits_only() {
        let document = Document::new(DocumentCategory::NationalId, "529.982.247-25x", issued());
        assert_eq!(document.number, "52998224725");
    }

    #[test]
    fn test_formatted_national_id() {
        let document = Document::new(DocumentCategory::NationalId, "52998224725", issued());
        assert_eq!(document.formatted(), "529.982.247-25");
    }

    #[test]
    fn test_formatted_passport_is_normalized_number() {
        let document = Document::new(DocumentCategory::Passport, "fz-123456", issued());
        assert_eq!(document.formatted(), "FZ123456");
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("national_id".parse::<DocumentCategory>().unwrap(), DocumentCategory::NationalId);
        assert_eq!("RG".parse::<DocumentCategory>().unwrap(), DocumentCategory::StateId);
        assert_eq!("Passport".parse::<DocumentCategory>().unwrap(), DocumentCategory::Passport);
        assert!("driver_license".parse::<DocumentCategory>().is_err());
    }

    #[test]
    fn test_category_serde_snake_case() {
        let json = serde_json::to_string(&DocumentCategory::StateId).unwrap();
        assert_eq!(json, "\"state_id\"");
    }
}
