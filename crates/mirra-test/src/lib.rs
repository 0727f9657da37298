//! MIRRA Test Harness - End-to-end synchronization validation
//!
//! This crate provides:
//! - A recording transport with failure injection
//! - An authoring/observer mirror harness
//! - End-to-end renderer scenarios

pub mod harness;
pub mod integration;
pub mod transport;

pub use harness::*;
pub use integration::*;
pub use transport::*;
