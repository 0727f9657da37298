//! MIRRA Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout MIRRA:
//! - Identifiers (ShortId, EndpointId, ObjectId)
//! - Change flag bitsets
//! - Material model mirrored to observers
//! - Error types and configuration

pub mod config;
pub mod error;
pub mod flags;
pub mod id;
pub mod material;

pub use config::*;
pub use error::*;
pub use flags::*;
pub use id::*;
pub use material::*;
