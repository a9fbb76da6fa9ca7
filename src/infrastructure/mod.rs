//! # Infrastructure Layer
//!
//! Persistence adapters for the directory.

pub mod persistence;
