//! MIRRA Sync - Component synchronization framework
//!
//! This crate implements the authoring and observer plumbing:
//! - Per-instance delta lifecycle (complete on attach, delta per tick)
//! - Component services keyed by ShortId
//! - Synchronization manager: endpoints, tick driver, inbound dispatch

pub mod component;
pub mod manager;
pub mod registry;
pub mod service;
pub mod transport;

pub use component::*;
pub use manager::*;
pub use registry::*;
pub use service::*;
pub use transport::*;
