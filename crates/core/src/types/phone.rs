//! Phone number normalization for registration.
//!
//! The backend expects an 11-digit number with the country digit `7`. Input
//! arrives from a masked form field and may contain formatting characters, a
//! leading `8`, or omit the country digit entirely.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contains no digits at all.
    #[error("phone number cannot be empty")]
    Empty,
    /// The digit count is wrong after normalization.
    #[error("phone number must contain {expected} digits (got {got})")]
    WrongLength {
        /// Required digit count.
        expected: usize,
        /// Digits actually present.
        got: usize,
    },
}

/// A normalized 11-digit phone number starting with the country digit `7`.
///
/// ## Normalization
///
/// - All non-digit characters are stripped.
/// - A 10-digit number gets the country digit `7` prepended.
/// - An 11-digit number starting with `8` has that digit folded to `7`.
///
/// ## Examples
///
/// ```
/// use kiosk_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+7 (912) 345-67-89").unwrap();
/// assert_eq!(phone.as_str(), "79123456789");
///
/// // Country digit added when missing
/// assert_eq!(PhoneNumber::parse("9123456789").unwrap().as_str(), "79123456789");
///
/// // Legacy leading 8 folded to 7
/// assert_eq!(PhoneNumber::parse("89123456789").unwrap().as_str(), "79123456789");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Digits in a normalized number, country digit included.
    pub const DIGITS: usize = 11;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has no digits or does not normalize to
    /// exactly eleven digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let normalized = if digits.len() == Self::DIGITS - 1 {
            format!("7{digits}")
        } else if digits.len() == Self::DIGITS && digits.starts_with('8') {
            format!("7{}", digits.get(1..).unwrap_or_default())
        } else {
            digits
        };

        if normalized.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength {
                expected: Self::DIGITS,
                got: normalized.len(),
            });
        }

        Ok(Self(normalized))
    }

    /// The normalized digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Format for display: `+7 (XXX) XXX-XX-XX`.
    #[must_use]
    pub fn display_masked(&self) -> String {
        let d = &self.0;
        format!(
            "+{} ({}) {}-{}-{}",
            d.get(0..1).unwrap_or_default(),
            d.get(1..4).unwrap_or_default(),
            d.get(4..7).unwrap_or_default(),
            d.get(7..9).unwrap_or_default(),
            d.get(9..11).unwrap_or_default()
        )
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
