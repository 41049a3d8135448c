//! Minimal email address value object.
//!
//! Only the parse/format contract matters here: a value that parses keeps its
//! input spelling and formats back to it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

const MAX_LENGTH: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEmail(pub String);

impl fmt::Display for InvalidEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" is not a valid email address", self.0)
    }
}

impl std::error::Error for InvalidEmail {}

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, InvalidEmail> {
        let local_ok = raw
            .split_once('@')
            .map(|(local, _)| !local.starts_with('.') && !local.ends_with('.') && !local.contains(".."))
            .unwrap_or(false);

        if raw.len() <= MAX_LENGTH && local_ok && EMAIL_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidEmail(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, d)| d).unwrap_or_default()
    }
}

impl FromStr for EmailAddress {
    type Err = InvalidEmail;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        for raw in ["user@example.com", "first.last+tag@mail.example.org", "a@b.co"] {
            let email = EmailAddress::parse(raw).unwrap();
            assert_eq!(email.to_string(), raw);
        }
    }

    #[test]
    fn test_invalid_addresses() {
        for raw in ["", "plain", "@example.com", "user@", "user@localhost", "a..b@example.com", ".a@example.com"] {
            assert!(EmailAddress::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_domain() {
        let email: EmailAddress = "user@example.com".parse().unwrap();
        assert_eq!(email.domain(), "example.com");
    }
}
