//! Registration profile submitted when the backend signals that the account
//! needs registration.

use serde::{Deserialize, Serialize};

use super::email::{Email, EmailError};
use super::phone::{PhoneError, PhoneNumber};

/// Errors produced by client-side profile validation.
///
/// Validation runs before any network call; a profile that fails here is
/// never sent to the backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("last name is required")]
    MissingLastName,
    #[error("first name is required")]
    MissingFirstName,
    #[error("invalid phone number: {0}")]
    Phone(#[from] PhoneError),
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),
}

/// The registration payload: last name, first name, and phone are required;
/// middle name and email are optional.
///
/// Wire field names follow the backend contract (`last_name`, `first_name`,
/// `middle_name`, `phone_number`, `email`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProfile {
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub phone_number: PhoneNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

impl RegisterProfile {
    /// Build a validated profile from raw form input.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure: missing required name, a phone
    /// number that does not normalize to eleven digits, or a malformed email.
    pub fn from_form(
        last_name: &str,
        first_name: &str,
        middle_name: &str,
        phone: &str,
        email: &str,
    ) -> Result<Self, ProfileError> {
        if last_name.trim().is_empty() {
            return Err(ProfileError::MissingLastName);
        }
        if first_name.trim().is_empty() {
            return Err(ProfileError::MissingFirstName);
        }

        let phone_number = PhoneNumber::parse(phone)?;
        let email = if email.trim().is_empty() {
            None
        } else {
            Some(Email::parse(email.trim())?)
        };

        Ok(Self {
            last_name: last_name.trim().to_string(),
            first_name: first_name.trim().to_string(),
            middle_name: middle_name.trim().to_string(),
            phone_number,
            email,
        })
    }
}
