//! User-facing value objects: username, phone and plaintext password.

use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

/// Minimum accepted plaintext password length.
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Non-empty display name of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number in the `+7XXXXXXXXXX` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::EmptyPhone);
        }

        let well_formed = value
            .strip_prefix("+7")
            .map(|digits| digits.len() == 10 && digits.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false);

        if !well_formed {
            return Err(ValidationError::InvalidPhoneFormat(value));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password, only ever held long enough to be hashed or verified.
///
/// `Debug` is redacted so the value never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

macro_rules! string_conversions {
    ($($ty:ident),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = ValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.0
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

string_conversions!(Username, Phone);
