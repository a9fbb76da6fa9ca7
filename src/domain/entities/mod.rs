//! # Domain Entities
//!
//! Records persisted by the directory.
//!
//! - [`Entity`]: store-assigned envelope (id, created, updated)
//! - [`Provider`]: service seller with its two rate sets
//! - [`ProviderMetadata`]: document published by a provider
//! - [`ProviderMetadataSnapshot`]: stored, per-nonce copy of that document

pub mod entity;
pub mod metadata;
pub mod provider;

pub use entity::Entity;
pub use metadata::{ProviderConfiguration, ProviderMetadata, ProviderMetadataSnapshot};
pub use provider::{InvalidBondError, Provider};
