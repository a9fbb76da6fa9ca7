//! # Persistence Layer
//!
//! Repository ports and their implementations.
//!
//! ## Repository Traits (Ports)
//!
//! - [`ProviderRepository`]: providers, rate sets and metadata snapshots
//! - [`EventRepository`]: on-chain event records
//!
//! ## Implementations
//!
//! - `postgres`: PostgreSQL via sqlx
//! - `in_memory`: in-memory store for tests
//!
//! ## Building Blocks
//!
//! - `query`: provider search composer
//! - `rates`: rate-set bulk insert serialization

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod rates;
pub mod traits;

pub use query::{QueryError, SearchQuery, SqlArg, compose_search};
pub use traits::{
    EventRepository, ProviderRepository, StoreError, StoreResult, UpsertStep,
};
