//! # Provider Metadata
//!
//! The off-store document a provider publishes at its metadata URI, and the
//! immutable per-nonce snapshot the store keeps of it.

use super::entity::Entity;
use crate::domain::value_objects::Coordinates;
use serde::{Deserialize, Serialize};

/// Self-description section of a metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfiguration {
    /// Display name.
    pub moniker: String,
    /// Provider website.
    pub website: String,
    /// Free-form description.
    pub description: String,
    /// Location as `"<latitude>,<longitude>"`. Any other text is tolerated.
    pub location: String,
    /// Requests per period served without a contract.
    pub free_tier_rate_limit: i64,
    /// Requests per period served under a subscription contract.
    pub subscribe_tier_rate_limit: i64,
    /// Requests per period served under a pay-as-you-go contract.
    pub paygo_tier_rate_limit: i64,
}

/// A metadata document as fetched from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderMetadata {
    /// Document format version.
    pub version: String,
    /// Provider self-description.
    pub configuration: ProviderConfiguration,
}

/// A stored metadata snapshot, keyed by (provider id, nonce).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadataSnapshot {
    /// Store envelope.
    pub entity: Entity,
    /// Owning provider's surrogate id.
    pub provider_id: i64,
    /// Metadata nonce this snapshot was taken at.
    pub nonce: i64,
    /// Display name.
    pub moniker: String,
    /// Provider website.
    pub website: String,
    /// Free-form description.
    pub description: String,
    /// Parsed location, `None` if the published text was not a valid position.
    pub location: Option<Coordinates>,
    /// Free-tier rate limit.
    pub free_rate_limit: i64,
    /// Subscription-tier rate limit.
    pub subscribe_rate_limit: i64,
    /// Pay-as-you-go-tier rate limit.
    pub paygo_rate_limit: i64,
}
