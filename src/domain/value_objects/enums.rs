//! # Domain Enums
//!
//! Enumeration types for directory concepts.
//!
//! - [`ProviderStatus`] - Whether a provider is currently serving
//! - [`ProviderSortKey`] - Ordering applied to provider searches
//! - [`RateKind`] - Which of a provider's two rate sets a rate belongs to
//!
//! All enums implement `Display` and `FromStr` using the textual form
//! persisted by the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Service status advertised by a provider.
///
/// Stored as text. A missing value is read back as [`ProviderStatus::Offline`].
///
/// # Examples
///
/// ```
/// use provider_directory::domain::value_objects::enums::ProviderStatus;
///
/// let status: ProviderStatus = "online".parse().unwrap();
/// assert!(status.is_online());
/// assert_eq!(status.to_string(), "ONLINE");
/// assert_eq!(ProviderStatus::default(), ProviderStatus::Offline);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderStatus {
    /// Provider accepts new contracts.
    Online,
    /// Provider does not accept new contracts.
    #[default]
    Offline,
}

impl ProviderStatus {
    /// Returns the persisted text form.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }

    /// Returns true if the provider is online.
    #[inline]
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Maps a stored status column to a status.
    ///
    /// Empty text maps to the default ([`ProviderStatus::Offline`]).
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] if the text is neither empty nor a known status.
    pub fn from_stored(value: &str) -> Result<Self, ParseEnumError> {
        if value.trim().is_empty() {
            return Ok(Self::default());
        }
        value.parse()
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ONLINE" => Ok(Self::Online),
            "OFFLINE" => Ok(Self::Offline),
            _ => Err(ParseEnumError::InvalidValue("ProviderStatus", s.to_string())),
        }
    }
}

/// Sort order for provider searches.
///
/// The textual forms are the values clients send: an empty string means
/// no ordering.
///
/// # Examples
///
/// ```
/// use provider_directory::domain::value_objects::enums::ProviderSortKey;
///
/// assert_eq!("".parse::<ProviderSortKey>().unwrap(), ProviderSortKey::None);
/// assert_eq!("age".parse::<ProviderSortKey>().unwrap(), ProviderSortKey::Age);
/// assert!("height".parse::<ProviderSortKey>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSortKey {
    /// Unspecified order.
    #[default]
    None,
    /// Oldest providers first.
    Age,
    /// Most open contracts first.
    ContractCount,
    /// Highest total paid first.
    AmountPaid,
}

impl ProviderSortKey {
    /// Returns the textual form accepted by [`FromStr`].
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Age => "age",
            Self::ContractCount => "contract_count",
            Self::AmountPaid => "amount_paid",
        }
    }
}

impl fmt::Display for ProviderSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderSortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "age" => Ok(Self::Age),
            "contract_count" => Ok(Self::ContractCount),
            "amount_paid" => Ok(Self::AmountPaid),
            _ => Err(ParseEnumError::InvalidValue("ProviderSortKey", s.to_string())),
        }
    }
}

/// The two rate sets a provider publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    /// Flat price for a subscription contract.
    Subscription,
    /// Per-query price for a pay-as-you-go contract.
    PayAsYouGo,
}

impl RateKind {
    /// Returns the table holding rates of this kind.
    #[inline]
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Subscription => "provider_subscriber_rates",
            Self::PayAsYouGo => "provider_pay_as_you_go_rates",
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscription => write!(f, "subscription"),
            Self::PayAsYouGo => write!(f, "pay-as-you-go"),
        }
    }
}

/// Error returned when parsing an enum from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    /// The provided string value is not valid for the enum.
    InvalidValue(&'static str, String),
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(enum_name, value) => {
                write!(f, "invalid {} value: '{}'", enum_name, value)
            }
        }
    }
}

impl std::error::Error for ParseEnumError {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod provider_status {
        use super::*;

        #[test]
        fn parse_case_insensitive() {
            assert_eq!(
                "Online".parse::<ProviderStatus>().unwrap(),
                ProviderStatus::Online
            );
            assert_eq!(
                " OFFLINE ".parse::<ProviderStatus>().unwrap(),
                ProviderStatus::Offline
            );
        }

        #[test]
        fn stored_empty_is_offline() {
            assert_eq!(
                ProviderStatus::from_stored("").unwrap(),
                ProviderStatus::Offline
            );
        }

        #[test]
        fn stored_garbage_is_error() {
            let err = ProviderStatus::from_stored("PAUSED").unwrap_err();
            assert_eq!(err.to_string(), "invalid ProviderStatus value: 'PAUSED'");
        }

        #[test]
        fn serde_uppercase() {
            let json = serde_json::to_string(&ProviderStatus::Online).unwrap();
            assert_eq!(json, "\"ONLINE\"");
        }
    }

    mod provider_sort_key {
        use super::*;

        #[test]
        fn display_parse_agree() {
            for key in [
                ProviderSortKey::None,
                ProviderSortKey::Age,
                ProviderSortKey::ContractCount,
                ProviderSortKey::AmountPaid,
            ] {
                assert_eq!(key.to_string().parse::<ProviderSortKey>().unwrap(), key);
            }
        }

        #[test]
        fn parse_is_exact() {
            assert!("AGE".parse::<ProviderSortKey>().is_err());
            assert!(" age".parse::<ProviderSortKey>().is_err());
        }
    }

    #[test]
    fn rate_kind_tables_differ() {
        assert_ne!(RateKind::Subscription.table(), RateKind::PayAsYouGo.table());
    }
}
