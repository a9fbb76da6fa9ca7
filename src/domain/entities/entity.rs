//! # Entity Envelope
//!
//! Surrogate identity and write timestamps assigned by the store to every
//! persisted row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identity of a persisted row.
///
/// Callers never construct these for writes; they are returned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Surrogate row id.
    pub id: i64,
    /// When the row was first written.
    pub created: DateTime<Utc>,
    /// When the row was last written.
    pub updated: DateTime<Utc>,
}

impl Entity {
    /// Creates an envelope from stored values.
    #[must_use]
    pub const fn new(id: i64, created: DateTime<Utc>, updated: DateTime<Utc>) -> Self {
        Self {
            id,
            created,
            updated,
        }
    }
}
