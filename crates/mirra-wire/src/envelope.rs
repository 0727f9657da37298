//! Object routing envelope
//!
//! Component messages carry no object identity of their own. The manager
//! prefixes each one with the id of the host object it describes:
//! `[object:u32 LE][component message]`.

use bytes::{BufMut, Bytes, BytesMut};
use mirra_core::{MirraError, MirraResult, ObjectId};

/// Envelope prefix size in bytes
pub const ENVELOPE_SIZE: usize = 4;

/// Wrap a component message for the given object
pub fn wrap_envelope(object: ObjectId, message: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(ENVELOPE_SIZE + message.len());
    buf.put_slice(&object.to_bytes());
    buf.put_slice(message);
    buf.freeze()
}

/// Split an envelope into its object id and component message
pub fn open_envelope(buf: &[u8]) -> MirraResult<(ObjectId, &[u8])> {
    if buf.len() < ENVELOPE_SIZE {
        return Err(MirraError::BufferTooShort {
            expected: ENVELOPE_SIZE,
            actual: buf.len(),
        });
    }
    let object = ObjectId::from_bytes([buf[0], buf[1], buf[2], buf[3]]);
    Ok((object, &buf[ENVELOPE_SIZE..]))
}
