//! # Domain Events
//!
//! Append-only on-chain facts recorded for audit and replay.
//!
//! - [`BondProviderEvent`]: provider bond changed
//! - [`ModProviderEvent`]: provider terms changed
//! - [`ValidatorPayoutEvent`]: validator payout

pub mod provider_events;

pub use provider_events::{
    BondProviderEvent, EventKind, MissingAmountError, ModProviderEvent, ValidatorPayoutEvent,
};
