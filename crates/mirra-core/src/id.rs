//! Identity types for MIRRA
//!
//! `ShortId` is the 3-byte wire tag naming a component kind. Endpoints and
//! host objects are plain integer handles owned by the manager and the scene.

use std::fmt;

use crate::{MirraError, MirraResult};

/// Width of a short id on the wire
pub const SHORT_ID_LEN: usize = 3;

/// Component kind identifier - 3 ASCII bytes, unique per process
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortId([u8; SHORT_ID_LEN]);

impl ShortId {
    /// Build a short id at compile time.
    ///
    /// Panics (at const evaluation) if any byte is not printable ASCII.
    pub const fn from_static(bytes: &[u8; SHORT_ID_LEN]) -> Self {
        let mut i = 0;
        while i < SHORT_ID_LEN {
            assert!(
                bytes[i].is_ascii_graphic(),
                "short id must be printable ASCII"
            );
            i += 1;
        }
        ShortId(*bytes)
    }

    /// Parse a short id from a string
    pub fn new(id: &str) -> MirraResult<Self> {
        let bytes = id.as_bytes();
        if bytes.len() != SHORT_ID_LEN || !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(MirraError::InvalidShortId(id.to_string()));
        }
        Ok(ShortId([bytes[0], bytes[1], bytes[2]]))
    }

    /// Recover a short id from wire bytes
    pub fn from_bytes(bytes: [u8; SHORT_ID_LEN]) -> MirraResult<Self> {
        if !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(MirraError::InvalidShortId(
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }
        Ok(ShortId(bytes))
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; SHORT_ID_LEN] {
        self.0
    }

    pub fn as_str(&self) -> &str {
        // Constructors only admit ASCII
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Debug for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortId({})", self.as_str())
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connected remote observer
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EndpointId(pub u64);

impl EndpointId {
    #[inline]
    pub fn new(id: u64) -> Self {
        EndpointId(id)
    }
}

impl fmt::Debug for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({})", self.0)
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host scene object carrying synchronized components
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub u32);

impl ObjectId {
    #[inline]
    pub fn new(id: u32) -> Self {
        ObjectId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        ObjectId(u32::from_le_bytes(bytes))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:08x})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
