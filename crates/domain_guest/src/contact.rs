//! Contact number value record

use serde::{Deserialize, Serialize};

/// A telephone contact number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactNumber {
    pub area_code: String,
    pub number: String,
}

impl ContactNumber {
    /// Creates a new contact number
    pub fn new(area_code: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            area_code: area_code.into(),
            number: number.into(),
        }
    }

    /// Digits of area code and number, used to compare differently formatted entries
    pub fn digits(&self) -> String {
        self.area_code
            .chars()
            .chain(self.number.chars())
            .filter(|c| c.is_ascii_digit())
            .collect()
    }

    /// Formats the number for display, e.g. `(11) 99999-1111`
    pub fn format(&self) -> String {
        format!("({}) {}", self.area_code, self.number)
    }
}
