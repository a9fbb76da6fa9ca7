//! # Provider Key
//!
//! Natural identity of a provider: the pair (public key, service).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural key of a provider.
///
/// A single public key may sell several services; each (pubkey, service)
/// pair is a distinct provider.
///
/// # Examples
///
/// ```
/// use provider_directory::domain::value_objects::ProviderKey;
///
/// let key = ProviderKey::new("arkeopub1abc", "btc-mainnet-fullnode");
/// assert_eq!(key.to_string(), "arkeopub1abc/btc-mainnet-fullnode");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderKey {
    /// Bech32 public key of the provider.
    pub pubkey: String,
    /// Service identifier.
    pub service: String,
}

impl ProviderKey {
    /// Creates a provider key.
    #[must_use]
    pub fn new(pubkey: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pubkey, self.service)
    }
}
