//! # Repository Traits
//!
//! Port definitions for directory persistence.
//!
//! This module defines the repository traits (ports) that abstract
//! persistence operations. Implementations can use PostgreSQL or
//! in-memory storage.
//!
//! # Available Repositories
//!
//! - [`ProviderRepository`]: providers, their rate sets and metadata snapshots
//! - [`EventRepository`]: append-only on-chain event records
//!
//! # Examples
//!
//! ```no_run
//! use provider_directory::domain::value_objects::ProviderKey;
//! use provider_directory::infrastructure::persistence::{ProviderRepository, StoreResult};
//!
//! async fn show(repo: &impl ProviderRepository, key: &ProviderKey) -> StoreResult<()> {
//!     match repo.find_provider(key).await? {
//!         Some(provider) => println!("{} rates", provider.subscription_rate.len()),
//!         None => println!("no such provider"),
//!     }
//!     Ok(())
//! }
//! ```

use crate::domain::entities::{Entity, Provider, ProviderMetadata, ProviderMetadataSnapshot};
use crate::domain::events::{BondProviderEvent, ModProviderEvent, ValidatorPayoutEvent};
use crate::domain::value_objects::{ProviderKey, ProviderSearchParams};
use crate::infrastructure::persistence::query::QueryError;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Logical steps of the transactional provider upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsertStep {
    /// Opening the transaction.
    Begin,
    /// Insert-or-update of the provider row.
    UpsertProvider,
    /// Removing the previous subscription rates.
    DeleteSubscriptionRates,
    /// Removing the previous pay-as-you-go rates.
    DeletePayAsYouGoRates,
    /// Writing the new subscription rates.
    InsertSubscriptionRates,
    /// Writing the new pay-as-you-go rates.
    InsertPayAsYouGoRates,
    /// Committing the transaction.
    Commit,
}

impl fmt::Display for UpsertStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Begin => "begin transaction",
            Self::UpsertProvider => "upsert provider",
            Self::DeleteSubscriptionRates => "delete subscription rates",
            Self::DeletePayAsYouGoRates => "delete pay-as-you-go rates",
            Self::InsertSubscriptionRates => "insert subscription rates",
            Self::InsertPayAsYouGoRates => "insert pay-as-you-go rates",
            Self::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A connection could not be obtained.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Input rejected before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A step of the transactional upsert failed; the transaction was rolled back.
    #[error("Write error: {step} failed for provider {key}: {message}")]
    Write {
        /// Step that failed.
        step: UpsertStep,
        /// Provider being written.
        key: ProviderKey,
        /// Row identity captured before the failure, if the provider row was written.
        entity: Option<Entity>,
        /// Underlying cause.
        message: String,
    },

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// A stored value could not be mapped back.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an upsert step error.
    #[must_use]
    pub fn write(
        step: UpsertStep,
        key: ProviderKey,
        entity: Option<Entity>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Write {
            step,
            key,
            entity,
            message: msg.into(),
        }
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Returns true if this is a connection error.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the failed upsert step, if this is a write error.
    #[must_use]
    pub fn failed_step(&self) -> Option<UpsertStep> {
        match self {
            Self::Write { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Returns the entity captured before an upsert failed, if any.
    #[must_use]
    pub fn partial_entity(&self) -> Option<&Entity> {
        match self {
            Self::Write { entity, .. } => entity.as_ref(),
            _ => None,
        }
    }
}

impl From<QueryError> for StoreError {
    fn from(err: QueryError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Repository for providers, rate sets and metadata snapshots.
#[async_trait]
pub trait ProviderRepository: Send + Sync + fmt::Debug {
    /// Creates a provider row from its key and bond.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the bond is not an `i64` integer;
    /// nothing is written in that case.
    async fn insert_provider(&self, provider: &Provider) -> StoreResult<Entity>;

    /// Writes a provider and replaces both of its rate sets in one transaction.
    ///
    /// Inserts the provider row if absent, otherwise updates every mutable field.
    /// Either all steps take effect or none do.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for an unparseable bond or metadata nonce
    /// before any I/O, and `StoreError::Write` naming the failed step otherwise.
    async fn upsert_provider(&self, provider: &Provider) -> StoreResult<Entity>;

    /// Looks up a provider with both rate sets.
    ///
    /// Returns `Ok(None)` when no provider matches.
    async fn find_provider(&self, key: &ProviderKey) -> StoreResult<Option<Provider>>;

    /// Searches providers. Results carry no rate sets.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for an unknown sort key, without
    /// running a query.
    async fn search_providers(&self, params: &ProviderSearchParams) -> StoreResult<Vec<Provider>>;

    /// Stores a metadata snapshot for `(provider_id, nonce)`.
    ///
    /// An unparseable location is stored as null. A repeated
    /// `(provider_id, nonce)` returns the existing snapshot unchanged.
    async fn upsert_provider_metadata(
        &self,
        provider_id: i64,
        nonce: i64,
        metadata: &ProviderMetadata,
    ) -> StoreResult<Entity>;

    /// Reads back a metadata snapshot.
    async fn find_provider_metadata(
        &self,
        provider_id: i64,
        nonce: i64,
    ) -> StoreResult<Option<ProviderMetadataSnapshot>>;
}

/// Repository for on-chain event records.
#[async_trait]
pub trait EventRepository: Send + Sync + fmt::Debug {
    /// Records a validator payout, keyed by (validator, height).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the reward is missing.
    async fn upsert_validator_payout_event(
        &self,
        event: &ValidatorPayoutEvent,
        height: i64,
    ) -> StoreResult<Entity>;

    /// Appends a bond event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if either bond amount is missing.
    async fn insert_bond_provider_event(
        &self,
        provider_id: i64,
        event: &BondProviderEvent,
        height: i64,
        tx_id: &str,
    ) -> StoreResult<Entity>;

    /// Appends a provider modification event.
    async fn insert_mod_provider_event(
        &self,
        provider_id: i64,
        event: &ModProviderEvent,
    ) -> StoreResult<Entity>;
}
