//! E.164-style phone numbers for SMS delivery.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Reasons a [`PhoneNumber`] can fail to parse.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number must start with a + country code")]
    MissingCountryCode,
    #[error("phone number must have between {min} and {max} digits")]
    BadLength { min: usize, max: usize },
}

/// A phone number reduced to `+` followed by 10 to 15 digits.
///
/// Spaces, dashes, dots and parentheses are stripped before validation, so
/// `"+234 (803) 555-0100"` becomes `"+2348035550100"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub const MIN_DIGITS: usize = 10;
    pub const MAX_DIGITS: usize = 15;

    /// Clean and validate a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] when the cleaned value lacks a leading `+` or has
    /// the wrong number of digits.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let cleaned: String = input
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();

        let digits = cleaned
            .strip_prefix('+')
            .ok_or(PhoneError::MissingCountryCode)?;

        if digits.len() < Self::MIN_DIGITS
            || digits.len() > Self::MAX_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PhoneError::BadLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(cleaned))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_formatting() {
        let phone = PhoneNumber::parse("+234 (803) 555-0100").unwrap();
        assert_eq!(phone.as_str(), "+2348035550100");
    }

    #[test]
    fn test_requires_country_code() {
        assert_eq!(
            PhoneNumber::parse("08035550100"),
            Err(PhoneError::MissingCountryCode)
        );
    }

    #[test]
    fn test_digit_bounds() {
        assert!(PhoneNumber::parse("+123456789").is_err());
        assert!(PhoneNumber::parse("+1234567890").is_ok());
        assert!(PhoneNumber::parse("+123456789012345").is_ok());
        assert!(PhoneNumber::parse("+1234567890123456").is_err());
    }

    #[test]
    fn test_plus_only_at_start() {
        assert!(PhoneNumber::parse("+12345+67890").is_err());
    }
}
