//! # In-Memory Persistence
//!
//! In-memory implementation of the directory repositories for testing
//! without database dependencies.
//!
//! ## Thread Safety
//!
//! State lives behind `Arc<RwLock<_>>`; clones of a store share it.

pub mod provider_store;

pub use provider_store::InMemoryDirectoryStore;
