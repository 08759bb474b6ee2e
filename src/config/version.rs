//! Stripe API version definitions.
//!
//! This module provides the [`ApiVersion`] enum for specifying which version
//! of the Stripe API to use. The version selects both the `Stripe-Version`
//! request header and the manifest directory operations are loaded from.

use crate::error::ConfigError;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Stripe API version.
///
/// Stripe versions are release dates (`YYYY-MM-DD`), optionally followed by
/// a release name (`2024-09-30.acacia`). This enum provides variants for a
/// few well-known versions plus a `Custom` variant for everything else.
///
/// # Example
///
/// ```rust
/// use stripe_api::ApiVersion;
///
/// let version: ApiVersion = "2014-07-26".parse().unwrap();
/// assert_eq!(version, ApiVersion::V2014_07_26);
/// assert_eq!(version, ApiVersion::default());
///
/// let version: ApiVersion = "2020-01-01".parse().unwrap();
/// assert_eq!(version.to_string(), "2020-01-01");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ApiVersion {
    /// API version 2014-07-26, the version the bundled manifests describe.
    #[default]
    V2014_07_26,
    /// API version 2015-10-16.
    V2015_10_16,
    /// API version 2017-08-15.
    V2017_08_15,
    /// API version 2019-12-03.
    V2019_12_03,
    /// API version 2020-08-27.
    V2020_08_27,
    /// API version 2022-11-15.
    V2022_11_15,
    /// API version 2023-10-16.
    V2023_10_16,
    /// Any other validated version string.
    Custom(String),
}

impl ApiVersion {
    /// Returns the most recent version known to this crate.
    #[must_use]
    pub const fn latest() -> Self {
        Self::V2023_10_16
    }

    /// Returns `true` if this is one of the named variants.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Returns the version string as sent in the `Stripe-Version` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::V2014_07_26 => "2014-07-26",
            Self::V2015_10_16 => "2015-10-16",
            Self::V2017_08_15 => "2017-08-15",
            Self::V2019_12_03 => "2019-12-03",
            Self::V2020_08_27 => "2020-08-27",
            Self::V2022_11_15 => "2022-11-15",
            Self::V2023_10_16 => "2023-10-16",
            Self::Custom(s) => s,
        }
    }

    /// Returns the release date of this version.
    #[must_use]
    pub fn release_date(&self) -> Option<NaiveDate> {
        let date = self.as_str().split('.').next()?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }

    fn is_valid_version_format(s: &str) -> bool {
        let (date, name) = s.split_once('.').map_or((s, None), |(d, n)| (d, Some(n)));

        if date.len() != 10 || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return false;
        }

        name.map_or(true, |n| {
            !n.is_empty() && n.chars().all(|c| c.is_ascii_lowercase())
        })
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // ISO dates order lexicographically
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        match s.as_str() {
            "2014-07-26" => Ok(Self::V2014_07_26),
            "2015-10-16" => Ok(Self::V2015_10_16),
            "2017-08-15" => Ok(Self::V2017_08_15),
            "2019-12-03" => Ok(Self::V2019_12_03),
            "2020-08-27" => Ok(Self::V2020_08_27),
            "2022-11-15" => Ok(Self::V2022_11_15),
            "2023-10-16" => Ok(Self::V2023_10_16),
            _ => {
                if Self::is_valid_version_format(&s) {
                    Ok(Self::Custom(s))
                } else {
                    Err(ConfigError::InvalidApiVersion { version: s })
                }
            }
        }
    }
}
