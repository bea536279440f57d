//! # Network Names
//!
//! [`NetworkName`] is the key of every per-network map in the workspace.
//! Names are normalized at construction (trimmed, ASCII-lowercased) so that
//! `"Amoy"` and `"amoy"` resolve to the same network.
//!
//! ## Validation
//!
//! - 1 to 32 characters after trimming
//! - Characters from `[a-z0-9_-]`
//! - First character is alphanumeric

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_LEN: usize = 32;

/// A validated, normalized network identifier such as `amoy` or `bsc-testnet`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkName(String);

impl NetworkName {
    /// Create a network name, validating and normalizing the input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidNetworkName`] if the input is empty,
    /// longer than 32 characters, or contains characters outside `[a-z0-9_-]`.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = value.as_ref();
        let reject = |reason| ValidationError::InvalidNetworkName {
            name: raw.to_string(),
            reason,
        };

        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(reject("must be non-empty"));
        }
        if normalized.len() > MAX_LEN {
            return Err(reject("must be at most 32 characters"));
        }
        if !normalized
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            return Err(reject("must start with a letter or digit"));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(reject("may only contain letters, digits, '-' and '_'"));
        }

        Ok(Self(normalized))
    }

    /// Access the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as an environment-variable segment: uppercase, `-` mapped to `_`.
    pub fn env_segment(&self) -> String {
        self.0.to_ascii_uppercase().replace('-', "_")
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NetworkName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for NetworkName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NetworkName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NetworkName> for String {
    fn from(name: NetworkName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let name = NetworkName::new("  Amoy ").unwrap();
        assert_eq!(name.as_str(), "amoy");
        assert_eq!(name, NetworkName::new("amoy").unwrap());
    }

    #[test]
    fn accepts_dashes_and_underscores() {
        assert!(NetworkName::new("bsc-testnet").is_ok());
        assert!(NetworkName::new("alastria_t").is_ok());
        assert!(NetworkName::new("l2").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            NetworkName::new("   "),
            Err(ValidationError::InvalidNetworkName { .. })
        ));
    }

    #[test]
    fn rejects_leading_separator() {
        assert!(NetworkName::new("-amoy").is_err());
        assert!(NetworkName::new("_amoy").is_err());
    }

    #[test]
    fn rejects_disallowed_characters() {
        assert!(NetworkName::new("amoy/../etc").is_err());
        assert!(NetworkName::new("am oy").is_err());
        assert!(NetworkName::new("amóy").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let long = "a".repeat(33);
        assert!(NetworkName::new(&long).is_err());
        assert!(NetworkName::new("a".repeat(32)).is_ok());
    }

    #[test]
    fn env_segment_uppercases() {
        let name = NetworkName::new("bsc-testnet").unwrap();
        assert_eq!(name.env_segment(), "BSC_TESTNET");
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let ok: NetworkName = serde_json::from_str("\"North\"").unwrap();
        assert_eq!(ok.as_str(), "north");
        assert!(serde_json::from_str::<NetworkName>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"north\"");
    }
}
