//! # Provider Entity
//!
//! A service seller in the directory, identified by [`ProviderKey`].
//!
//! # Examples
//!
//! ```
//! use provider_directory::domain::entities::Provider;
//! use provider_directory::domain::value_objects::{ProviderStatus, RateSet};
//!
//! let provider = Provider::new("arkeopub1abc", "btc-mainnet-fullnode")
//!     .with_bond("1000000")
//!     .with_status(ProviderStatus::Online)
//!     .with_subscription_rate("10uarkeo".parse::<RateSet>().unwrap());
//!
//! assert_eq!(provider.key().service, "btc-mainnet-fullnode");
//! assert_eq!(provider.bond_i64().unwrap(), 1_000_000);
//! ```

use super::entity::Entity;
use crate::domain::value_objects::{ProviderKey, ProviderStatus, RateSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// The bond text is not a decimal integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid bond '{bond}': {reason}")]
pub struct InvalidBondError {
    /// The rejected bond text.
    pub bond: String,
    /// Why it was rejected.
    pub reason: String,
}

/// A provider record with both rate sets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Provider {
    /// Store envelope. `None` until the provider has been read from or written to a store.
    #[serde(skip)]
    pub entity: Option<Entity>,
    /// Provider public key.
    pub pubkey: String,
    /// Service identifier.
    pub service: String,
    /// Bonded collateral as decimal integer text.
    pub bond: String,
    /// Location of the off-store metadata document.
    pub metadata_uri: String,
    /// Version of the metadata document last applied.
    pub metadata_nonce: u64,
    /// Service status.
    pub status: ProviderStatus,
    /// Shortest contract the provider accepts, in blocks.
    pub min_contract_duration: i64,
    /// Longest contract the provider accepts, in blocks.
    pub max_contract_duration: i64,
    /// Blocks after contract end before settlement.
    pub settlement_duration: i64,
    /// Subscription price.
    #[serde(rename = "subscription_rates")]
    pub subscription_rate: RateSet,
    /// Pay-as-you-go price.
    #[serde(rename = "paygo_rates")]
    pub pay_as_you_go_rate: RateSet,
}

impl Provider {
    /// Creates a provider with a zero bond and no rates.
    #[must_use]
    pub fn new(pubkey: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            service: service.into(),
            bond: "0".to_string(),
            ..Self::default()
        }
    }

    /// Returns the natural key.
    #[must_use]
    pub fn key(&self) -> ProviderKey {
        ProviderKey::new(self.pubkey.as_str(), self.service.as_str())
    }

    /// Sets the bond text.
    #[must_use]
    pub fn with_bond(mut self, bond: impl Into<String>) -> Self {
        self.bond = bond.into();
        self
    }

    /// Sets the metadata pointer.
    #[must_use]
    pub fn with_metadata(mut self, uri: impl Into<String>, nonce: u64) -> Self {
        self.metadata_uri = uri.into();
        self.metadata_nonce = nonce;
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: ProviderStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets contract and settlement durations.
    #[must_use]
    pub fn with_durations(mut self, min: i64, max: i64, settlement: i64) -> Self {
        self.min_contract_duration = min;
        self.max_contract_duration = max;
        self.settlement_duration = settlement;
        self
    }

    /// Sets the subscription rate set.
    #[must_use]
    pub fn with_subscription_rate(mut self, rates: RateSet) -> Self {
        self.subscription_rate = rates;
        self
    }

    /// Sets the pay-as-you-go rate set.
    #[must_use]
    pub fn with_pay_as_you_go_rate(mut self, rates: RateSet) -> Self {
        self.pay_as_you_go_rate = rates;
        self
    }

    /// Parses the bond as a 64-bit integer, as required on first creation.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBondError`] if the text is not an integer in `i64` range.
    pub fn bond_i64(&self) -> Result<i64, InvalidBondError> {
        self.bond
            .trim()
            .parse::<i64>()
            .map_err(|e| InvalidBondError {
                bond: self.bond.clone(),
                reason: e.to_string(),
            })
    }

    /// Parses the bond as a decimal integer of arbitrary size.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBondError`] if the text is not a whole number.
    pub fn bond_decimal(&self) -> Result<Decimal, InvalidBondError> {
        let value = Decimal::from_str(self.bond.trim()).map_err(|e| InvalidBondError {
            bond: self.bond.clone(),
            reason: e.to_string(),
        })?;
        if !value.fract().is_zero() {
            return Err(InvalidBondError {
                bond: self.bond.clone(),
                reason: "bond must be a whole number".to_string(),
            });
        }
        Ok(value)
    }

    /// Returns a copy without the store envelope, for comparing stored state.
    #[must_use]
    pub fn without_entity(&self) -> Self {
        Self {
            entity: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bond_i64_rejects_text() {
        let provider = Provider::new("pk", "svc").with_bond("lots");
        let err = provider.bond_i64().unwrap_err();
        assert_eq!(err.bond, "lots");
    }

    #[test]
    fn bond_decimal_accepts_large_values() {
        let provider = Provider::new("pk", "svc").with_bond("100000000000000000000");
        assert!(provider.bond_i64().is_err());
        assert_eq!(
            provider.bond_decimal().unwrap(),
            Decimal::from_str("100000000000000000000").unwrap()
        );
    }

    #[test]
    fn bond_decimal_rejects_fractions() {
        let provider = Provider::new("pk", "svc").with_bond("1.5");
        assert!(provider.bond_decimal().is_err());
    }

    #[test]
    fn new_provider_is_offline_with_zero_bond() {
        let provider = Provider::new("pk", "svc");
        assert_eq!(provider.status, ProviderStatus::Offline);
        assert_eq!(provider.bond, "0");
        assert!(provider.subscription_rate.is_empty());
        assert!(provider.entity.is_none());
    }

    #[test]
    fn serializes_rate_field_names() {
        let provider = Provider::new("pk", "svc");
        let json = serde_json::to_value(&provider).unwrap();
        assert!(json.get("subscription_rates").is_some());
        assert!(json.get("paygo_rates").is_some());
        assert!(json.get("entity").is_none());
    }
}
