//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`ProviderKey`]: (public key, service) natural key
//!
//! ## Pricing
//!
//! - [`Coin`]: a (denomination, amount) pair
//! - [`RateSet`]: an ordered list of coins forming a price
//!
//! ## Location
//!
//! - [`Coordinates`]: latitude/longitude parsed from free text
//!
//! ## Search
//!
//! - [`ProviderSearchParams`]: optional filters and sort key
//!
//! ## Domain Enums
//!
//! - `ProviderStatus`: Online or Offline
//! - `ProviderSortKey`: search ordering
//! - `RateKind`: subscription or pay-as-you-go

pub mod coin;
pub mod coordinates;
pub mod enums;
pub mod provider_key;
pub mod search;

pub use coin::{Coin, RateError, RateSet};
pub use coordinates::{CoordinateError, Coordinates, parse_coordinates};
pub use enums::{ParseEnumError, ProviderSortKey, ProviderStatus, RateKind};
pub use provider_key::ProviderKey;
pub use search::{GeoFilter, ProviderSearchParams};
