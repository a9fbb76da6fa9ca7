//! # Provider Events
//!
//! On-chain events recorded for audit and replay. Payloads arrive from the
//! chain event decoder; amounts the decoder could not read are `None` and
//! are rejected before any write.

use crate::domain::value_objects::{ProviderKey, ProviderStatus, RateSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Provider bond changed.
    BondProvider,
    /// Provider terms or metadata pointer changed.
    ModProvider,
    /// Validator received a payout.
    ValidatorPayout,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BondProvider => write!(f, "BOND_PROVIDER"),
            Self::ModProvider => write!(f, "MOD_PROVIDER"),
            Self::ValidatorPayout => write!(f, "VALIDATOR_PAYOUT"),
        }
    }
}

/// A required amount was not present on an event payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} event is missing {field}")]
pub struct MissingAmountError {
    /// Event category.
    pub kind: EventKind,
    /// Name of the missing field.
    pub field: &'static str,
}

/// A provider's bond was changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondProviderEvent {
    /// Provider the bond belongs to.
    pub provider: ProviderKey,
    /// Change applied to the bond.
    pub bond_rel: Option<Decimal>,
    /// Bond after the change.
    pub bond_abs: Option<Decimal>,
}

impl BondProviderEvent {
    /// Returns `(relative, absolute)` if both amounts are present.
    ///
    /// # Errors
    ///
    /// Returns [`MissingAmountError`] naming the first absent amount.
    pub fn amounts(&self) -> Result<(Decimal, Decimal), MissingAmountError> {
        let missing = |field| MissingAmountError {
            kind: EventKind::BondProvider,
            field,
        };
        let abs = self.bond_abs.ok_or_else(|| missing("bond_abs"))?;
        let rel = self.bond_rel.ok_or_else(|| missing("bond_rel"))?;
        Ok((rel, abs))
    }
}

/// A provider modified its contract terms or metadata pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModProviderEvent {
    /// Provider that was modified.
    pub provider: ProviderKey,
    /// Block height of the modification.
    pub height: i64,
    /// Transaction hash.
    pub tx_id: String,
    /// New metadata URI.
    pub metadata_uri: String,
    /// New metadata nonce.
    pub metadata_nonce: u64,
    /// New status.
    pub status: ProviderStatus,
    /// New minimum contract duration.
    pub min_contract_duration: i64,
    /// New maximum contract duration.
    pub max_contract_duration: i64,
    /// New settlement duration.
    pub settlement_duration: i64,
    /// New subscription rates.
    pub subscription_rate: RateSet,
    /// New pay-as-you-go rates.
    pub pay_as_you_go_rate: RateSet,
}

/// A validator was paid its share of contract revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorPayoutEvent {
    /// Validator operator address.
    pub validator: String,
    /// Amount paid.
    pub reward: Option<Decimal>,
}

impl ValidatorPayoutEvent {
    /// Returns the reward if present.
    ///
    /// # Errors
    ///
    /// Returns [`MissingAmountError`] if the reward is absent.
    pub fn reward(&self) -> Result<Decimal, MissingAmountError> {
        self.reward.ok_or(MissingAmountError {
            kind: EventKind::ValidatorPayout,
            field: "reward",
        })
    }
}
