//! Shared types for the address scanner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full text reported when the input had no usable line
pub const NO_ADDRESS_FOUND: &str = "No address found";

/// Honorific titles recognised at the start of a personal-name line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Salutation {
    Herr,
    Frau,
    Mr,
    Mrs,
    Ms,
    Dr,
}

impl Salutation {
    /// Every known salutation, in matching order
    pub const ALL: [Salutation; 6] = [
        Salutation::Herr,
        Salutation::Frau,
        Salutation::Mr,
        Salutation::Mrs,
        Salutation::Ms,
        Salutation::Dr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Salutation::Herr => "Herr",
            Salutation::Frau => "Frau",
            Salutation::Mr => "Mr",
            Salutation::Mrs => "Mrs",
            Salutation::Ms => "Ms",
            Salutation::Dr => "Dr",
        }
    }

    /// Exact, case-sensitive token match as written on an address label
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == token)
    }

    /// Lenient match for upstream sources: ignores case and a trailing '.'
    pub fn from_loose(value: &str) -> Option<Self> {
        let value = value.trim();
        let value = value.strip_suffix('.').unwrap_or(value);
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Salutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured fields extracted from a free-text address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddressFields {
    #[serde(rename = "fullText")]
    pub full_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salutation: Option<Salutation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

impl ParsedAddressFields {
    /// Record carrying only the full text
    pub fn new(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            salutation: None,
            first_name: None,
            last_name: None,
            street_name: None,
            street_number: None,
            postal_code: None,
            place: None,
        }
    }

    /// The fallback result for input without any usable line
    pub fn not_found() -> Self {
        Self::new(NO_ADDRESS_FOUND)
    }

    pub fn is_not_found(&self) -> bool {
        self.full_text == NO_ADDRESS_FOUND && !self.has_structured_fields()
    }

    /// True when at least one field besides the full text is set
    pub fn has_structured_fields(&self) -> bool {
        self.salutation.is_some()
            || self.first_name.is_some()
            || self.last_name.is_some()
            || self.street_name.is_some()
            || self.street_number.is_some()
            || self.postal_code.is_some()
            || self.place.is_some()
    }
}

/// Address row as stored in the remote database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAddress {
    pub id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub salutation: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for inserting a new address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressInput {
    pub full_text: String,
    #[serde(default)]
    pub salutation: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
}

impl From<&ParsedAddressFields> for AddressInput {
    fn from(fields: &ParsedAddressFields) -> Self {
        Self {
            full_text: fields.full_text.clone(),
            salutation: fields.salutation.map(|s| s.as_str().to_string()),
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            company: None,
            street_name: fields.street_name.clone(),
            street_number: fields.street_number.clone(),
            postal_code: fields.postal_code.clone(),
            place: fields.place.clone(),
            image_data: None,
        }
    }
}

/// Partial update of a stored address.
///
/// `None` leaves a column untouched; `Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressPatch {
    pub full_text: Option<String>,
    pub salutation: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub street_name: Option<String>,
    pub street_number: Option<String>,
    pub postal_code: Option<String>,
    pub place: Option<String>,
    pub image_data: Option<String>,
}

impl AddressPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Filters for searching stored addresses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    pub company: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub place: Option<String>,
}

/// Entry of the local scan history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default)]
    pub salutation: Option<Salutation>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
}
