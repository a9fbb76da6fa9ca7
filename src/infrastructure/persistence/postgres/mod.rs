//! # PostgreSQL Persistence
//!
//! sqlx-backed implementation of the directory repositories. The schema it
//! expects ships in `migrations/` and is applied by
//! [`PostgresDirectoryStore::migrate`].

pub mod provider_store;
mod sql;

pub use provider_store::PostgresDirectoryStore;
