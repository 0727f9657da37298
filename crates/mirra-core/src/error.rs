//! Error types for MIRRA

use thiserror::Error;

use crate::{EndpointId, ObjectId, ShortId};

/// Core MIRRA errors
#[derive(Error, Debug)]
pub enum MirraError {
    // Registration errors
    #[error("Invalid short id: {0:?}")]
    InvalidShortId(String),

    #[error("Duplicate short id: {0} is already registered")]
    DuplicateShortId(ShortId),

    // Wire errors
    #[error("Invalid wire format: {0}")]
    InvalidWireFormat(String),

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Unsupported change flags 0x{flags:02x} for {id}")]
    UnsupportedChangeFlags { id: ShortId, flags: u8 },

    // Mirror errors
    #[error("Unknown object: {0:?}")]
    UnknownObject(ObjectId),

    // Transport errors
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Connection failed: endpoint {0}")]
    ConnectionFailed(EndpointId),
}

/// Result type for MIRRA operations
pub type MirraResult<T> = Result<T, MirraError>;
