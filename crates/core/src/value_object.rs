//! Value objects: equality by value, not identity.
//!
//! Two prices with the same text are the same price; two photo references to
//! the same URI are the same photo. Construction validates, so holding one of
//! these types means the value already satisfies its invariant.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A strictly positive price, kept in the textual form the user typed.
///
/// The text is preserved verbatim (e.g. `"9.90"` stays `"9.90"`); the parsed
/// amount is cached for arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Price {
    text: String,
    amount: f64,
}

impl Price {
    /// Parse a price from user input.
    ///
    /// Surrounding whitespace is ignored. The value must be a finite number
    /// greater than zero.
    pub fn parse(text: impl Into<String>) -> DomainResult<Self> {
        let text = text.into();
        let amount = parse_amount(&text)
            .ok_or_else(|| DomainError::validation(format!("invalid price: {text:?}")))?;
        if amount <= 0.0 {
            return Err(DomainError::validation(format!(
                "price must be greater than zero: {text:?}"
            )));
        }
        Ok(Self { text, amount })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl ValueObject for Price {}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for Price {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Price> for String {
    fn from(value: Price) -> Self {
        value.text
    }
}

/// Opaque reference to an image resource (usually a local URI).
///
/// Never interpreted; only required to be non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(uri: impl Into<String>) -> DomainResult<Self> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(DomainError::validation("photo reference cannot be empty"));
        }
        Ok(Self(uri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for PhotoRef {}

impl core::fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhotoRef {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhotoRef> for String {
    fn from(value: PhotoRef) -> Self {
        value.0
    }
}
