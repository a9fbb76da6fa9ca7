//! # Provider Search Parameters
//!
//! Criteria accepted by provider searches. Every filter is optional and
//! filters combine conjunctively.
//!
//! # Examples
//!
//! ```
//! use provider_directory::domain::value_objects::search::ProviderSearchParams;
//! use provider_directory::domain::value_objects::enums::ProviderSortKey;
//!
//! let params = ProviderSearchParams::new()
//!     .with_service("btc-mainnet-fullnode")
//!     .with_min_free_rate_limit(10)
//!     .with_sort(ProviderSortKey::ContractCount);
//!
//! assert!(params.needs_metadata());
//! assert_eq!(params.sort_key, "contract_count");
//! ```

use super::coordinates::Coordinates;
use super::enums::ProviderSortKey;
use serde::{Deserialize, Serialize};

/// Distance filter around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFilter {
    /// Center of the search area.
    pub coordinates: Coordinates,
    /// Maximum distance from the center, in statute miles.
    pub max_distance: f64,
}

/// Search criteria for providers.
///
/// `sort_key` carries the client-supplied text unchanged so that an unknown
/// key is reported by the search instead of being dropped during decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSearchParams {
    /// Exact provider public key.
    pub pubkey: Option<String>,
    /// Exact service identifier.
    pub service: Option<String>,
    /// Distance filter against the provider's published location.
    pub near: Option<GeoFilter>,
    /// Minimum free-tier rate limit from the current metadata.
    pub min_free_rate_limit: Option<i64>,
    /// Minimum pay-as-you-go-tier rate limit from the current metadata.
    pub min_paygo_rate_limit: Option<i64>,
    /// Minimum subscription-tier rate limit from the current metadata.
    pub min_subscribe_rate_limit: Option<i64>,
    /// Minimum provider age in seconds.
    pub min_provider_age: Option<i64>,
    /// Minimum number of open contracts.
    pub min_open_contracts: Option<i64>,
    /// Minimum total amount paid to the provider.
    pub min_validator_payments: Option<i64>,
    /// Sort key text, see [`ProviderSortKey`]. Empty means unordered.
    pub sort_key: String,
}

impl ProviderSearchParams {
    /// Creates criteria matching every provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters on the provider public key.
    #[must_use]
    pub fn with_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.pubkey = Some(pubkey.into());
        self
    }

    /// Filters on the service identifier.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Keeps providers within `max_distance` miles of `coordinates`.
    #[must_use]
    pub fn with_max_distance(mut self, coordinates: Coordinates, max_distance: f64) -> Self {
        self.near = Some(GeoFilter {
            coordinates,
            max_distance,
        });
        self
    }

    /// Sets the minimum free-tier rate limit.
    #[must_use]
    pub fn with_min_free_rate_limit(mut self, limit: i64) -> Self {
        self.min_free_rate_limit = Some(limit);
        self
    }

    /// Sets the minimum pay-as-you-go-tier rate limit.
    #[must_use]
    pub fn with_min_paygo_rate_limit(mut self, limit: i64) -> Self {
        self.min_paygo_rate_limit = Some(limit);
        self
    }

    /// Sets the minimum subscription-tier rate limit.
    #[must_use]
    pub fn with_min_subscribe_rate_limit(mut self, limit: i64) -> Self {
        self.min_subscribe_rate_limit = Some(limit);
        self
    }

    /// Sets the minimum provider age in seconds.
    #[must_use]
    pub fn with_min_provider_age(mut self, age: i64) -> Self {
        self.min_provider_age = Some(age);
        self
    }

    /// Sets the minimum number of open contracts.
    #[must_use]
    pub fn with_min_open_contracts(mut self, count: i64) -> Self {
        self.min_open_contracts = Some(count);
        self
    }

    /// Sets the minimum total paid.
    #[must_use]
    pub fn with_min_validator_payments(mut self, amount: i64) -> Self {
        self.min_validator_payments = Some(amount);
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub fn with_sort(mut self, key: ProviderSortKey) -> Self {
        self.sort_key = key.as_str().to_string();
        self
    }

    /// Sets the raw sort key text as received from a client.
    #[must_use]
    pub fn with_sort_key(mut self, key: impl Into<String>) -> Self {
        self.sort_key = key.into();
        self
    }

    /// Returns true if any filter reads the provider's metadata snapshot.
    #[must_use]
    pub fn needs_metadata(&self) -> bool {
        self.near.is_some()
            || self.min_free_rate_limit.is_some()
            || self.min_paygo_rate_limit.is_some()
            || self.min_subscribe_rate_limit.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_everything() {
        let params = ProviderSearchParams::new();
        assert!(!params.needs_metadata());
        assert!(params.sort_key.is_empty());
    }

    #[test]
    fn geo_needs_metadata() {
        let params = ProviderSearchParams::new()
            .with_max_distance(Coordinates::new(1.0, 2.0).unwrap(), 50.0);
        assert!(params.needs_metadata());
    }

    #[test]
    fn age_does_not_need_metadata() {
        let params = ProviderSearchParams::new()
            .with_min_provider_age(60)
            .with_min_open_contracts(1)
            .with_min_validator_payments(5);
        assert!(!params.needs_metadata());
    }

    #[test]
    fn deserializes_partial_json() {
        let params: ProviderSearchParams =
            serde_json::from_str(r#"{"service":"rpc","sort_key":"age"}"#).unwrap();
        assert_eq!(params.service.as_deref(), Some("rpc"));
        assert_eq!(params.sort_key, "age");
        assert!(params.pubkey.is_none());
    }
}
