//! Component message header
//!
//! Header is 4 bytes:
//! - Bytes 0-2: ShortId (ASCII)
//! - Byte 3: Change flags

use mirra_core::{MirraError, MirraResult, ShortId, SHORT_ID_LEN};

/// Header size in bytes
pub const HEADER_SIZE: usize = SHORT_ID_LEN + 1;

/// Header of a component message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    /// Component kind
    pub id: ShortId,
    /// Raw change flags
    pub flags: u8,
}

impl MessageHeader {
    pub fn new(id: ShortId, flags: u8) -> Self {
        MessageHeader { id, flags }
    }

    /// Read only the short id, leaving the flags to the owning service
    pub fn peek_id(buf: &[u8]) -> MirraResult<ShortId> {
        if buf.len() < SHORT_ID_LEN {
            return Err(MirraError::BufferTooShort {
                expected: SHORT_ID_LEN,
                actual: buf.len(),
            });
        }
        ShortId::from_bytes([buf[0], buf[1], buf[2]])
    }

    /// Parse header from bytes
    pub fn parse(buf: &[u8]) -> MirraResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(MirraError::BufferTooShort {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let id = Self::peek_id(buf)?;
        Ok(MessageHeader {
            id,
            flags: buf[SHORT_ID_LEN],
        })
    }

    /// Parse header and return the payload that follows it
    pub fn split(buf: &[u8]) -> MirraResult<(Self, &[u8])> {
        let header = Self::parse(buf)?;
        Ok((header, &buf[HEADER_SIZE..]))
    }

    /// Serialize header into the front of `buf`
    pub fn serialize(&self, buf: &mut [u8]) -> MirraResult<()> {
        if buf.len() < HEADER_SIZE {
            return Err(MirraError::BufferTooShort {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        buf[..SHORT_ID_LEN].copy_from_slice(&self.id.to_bytes());
        buf[SHORT_ID_LEN] = self.flags;
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let id = self.id.to_bytes();
        [id[0], id[1], id[2], self.flags]
    }
}
