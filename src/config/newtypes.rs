//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use std::fmt;

/// A validated Stripe API key.
///
/// This newtype ensures the key is non-empty and masks its value in debug
/// output to prevent accidental exposure in logs. The key is the sole
/// credential sent to the API.
///
/// # Security
///
/// The `Debug` implementation only reveals the key prefix (e.g. `sk_test`),
/// never the secret part.
///
/// # Example
///
/// ```rust
/// use stripe_api::ApiKey;
///
/// let key = ApiKey::new("sk_test_123").unwrap();
/// assert_eq!(key.as_ref(), "sk_test_123");
/// assert_eq!(format!("{:?}", key), "ApiKey(sk_test_*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }

    /// Returns `true` for test-mode keys (`sk_test_...`, `pk_test_...`).
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.0.split('_').nth(1) == Some("test")
    }

    /// Returns the non-secret prefix of the key, up to its last underscore.
    fn prefix(&self) -> &str {
        self.0.rfind('_').map_or("", |end| &self.0[..=end])
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}*****)", self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_empty_string() {
        assert!(matches!(ApiKey::new(""), Err(ConfigError::EmptyApiKey)));
        assert!(matches!(ApiKey::new("   "), Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn test_api_key_trims_whitespace() {
        let key = ApiKey::new("  sk_test_abc \n").unwrap();
        assert_eq!(key.as_ref(), "sk_test_abc");
    }

    #[test]
    fn test_api_key_masks_value_in_debug() {
        let key = ApiKey::new("sk_live_supersecret").unwrap();
        let debug_output = format!("{key:?}");
        assert_eq!(debug_output, "ApiKey(sk_live_*****)");
        assert!(!debug_output.contains("supersecret"));
    }

    #[test]
    fn test_api_key_without_prefix_is_fully_masked() {
        let key = ApiKey::new("opaque").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(*****)");
    }

    #[test]
    fn test_api_key_test_mode_detection() {
        assert!(ApiKey::new("sk_test_123").unwrap().is_test_mode());
        assert!(ApiKey::new("pk_test_123").unwrap().is_test_mode());
        assert!(!ApiKey::new("sk_live_123").unwrap().is_test_mode());
    }
}
