//! Address value record

use serde::{Deserialize, Serialize};

/// A postal address
///
/// Addresses are plain values: `clone()` yields an independent deep copy and
/// equality compares every field. Companions receive copies of their primary
/// guest's address, never a shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub district: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub postal_code: String,
}

impl Address {
    /// Creates a new address
    pub fn new(
        street: impl Into<String>,
        district: impl Into<String>,
        city: impl Into<String>,
        region: impl Into<String>,
        country: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            district: district.into(),
            city: city.into(),
            region: region.into(),
            country: country.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Returns true when no field carries data
    pub fn is_blank(&self) -> bool {
        [
            &self.street,
            &self.district,
            &self.city,
            &self.region,
            &self.country,
            &self.postal_code,
        ]
        .iter()
        .all(|field| field.trim().is_empty())
    }

    /// Formats address for display
    pub fn format(&self) -> String {
        let mut lines = vec![self.street.clone()];
        if !self.district.is_empty() {
            lines.push(self.district.clone());
        }
        let city_line = if self.region.is_empty() {
            format!("{} {}", self.city, self.postal_code)
        } else {
            format!("{}, {} {}", self.city, self.region, self.postal_code)
        };
        lines.push(city_line);
        lines.push(self.country.clone());
        lines.join("\n")
    }
}
