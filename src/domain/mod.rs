//! # Domain Layer
//!
//! Provider entities, the value objects they are built from and the
//! on-chain events recorded against them. Nothing here performs I/O.

pub mod entities;
pub mod events;
pub mod value_objects;
