//! Message writer
//!
//! A `MessageWriter` owns the output buffer for exactly one message. It is
//! created inside the send call and either frozen into `Bytes` or dropped,
//! so no buffer outlives the message it was built for.

use bytes::{BufMut, Bytes, BytesMut};
use mirra_core::{MirraError, MirraResult, PropertyValue, ShortId};

use crate::{MessageHeader, HEADER_SIZE};

/// Typical message capacity; grows as needed
const INITIAL_CAPACITY: usize = 64;

/// Little-endian binary writer for one component message
#[derive(Debug, Default)]
pub struct MessageWriter {
    buf: BytesMut,
}

impl MessageWriter {
    pub fn new() -> Self {
        MessageWriter {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Start a message with its header already written
    pub fn begin(id: ShortId, flags: u8) -> Self {
        let mut writer = Self::new();
        writer.write_header(MessageHeader::new(id, flags));
        writer
    }

    pub fn write_header(&mut self, header: MessageHeader) {
        self.buf.put_slice(&header.to_bytes());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.put_u8(v as u8);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.put_u16_le(v);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.put_i32_le(v);
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.put_f32_le(v);
    }

    pub fn write_f32x4(&mut self, v: [f32; 4]) {
        for c in v {
            self.buf.put_f32_le(c);
        }
    }

    /// Write a `u16` element count
    pub fn write_len(&mut self, len: usize) -> MirraResult<()> {
        let len = u16::try_from(len)
            .map_err(|_| MirraError::InvalidWireFormat(format!("Count too large: {}", len)))?;
        self.buf.put_u16_le(len);
        Ok(())
    }

    /// Write a string as `[len:u16][utf8]`
    pub fn write_str(&mut self, s: &str) -> MirraResult<()> {
        self.write_len(s.len())?;
        self.buf.put_slice(s.as_bytes());
        Ok(())
    }

    /// Write a tagged property value
    pub fn write_value(&mut self, value: &PropertyValue) {
        self.buf.put_u8(value.kind().to_byte());
        match *value {
            PropertyValue::Float(v) => self.write_f32(v),
            PropertyValue::Int(v) => self.write_i32(v),
            PropertyValue::Vector(v) | PropertyValue::Color(v) => self.write_f32x4(v),
            PropertyValue::Texture(v) => self.write_u64(v),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes written after the header
    pub fn payload_len(&self) -> usize {
        self.buf.len().saturating_sub(HEADER_SIZE)
    }

    /// Freeze the message
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Freeze the message, rejecting it if it exceeds `max_size`
    pub fn finish_bounded(self, max_size: usize) -> MirraResult<Bytes> {
        if self.buf.len() > max_size {
            return Err(MirraError::InvalidWireFormat(format!(
                "Message too large: {} > {}",
                self.buf.len(),
                max_size
            )));
        }
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_writes_header() {
        let writer = MessageWriter::begin(ShortId::from_static(b"MSH"), 0x02);
        assert_eq!(writer.len(), HEADER_SIZE);
        assert_eq!(writer.payload_len(), 0);
        assert_eq!(&writer.finish()[..], b"MSH\x02");
    }

    #[test]
    fn test_little_endian_layout() {
        let mut writer = MessageWriter::new();
        writer.write_u16(0x0102);
        writer.write_u32(0x03040506);
        writer.write_bool(true);
        assert_eq!(&writer.finish()[..], &[0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0x01]);
    }

    #[test]
    fn test_string_prefix() {
        let mut writer = MessageWriter::new();
        writer.write_str("abc").unwrap();
        assert_eq!(&writer.finish()[..], &[3, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_value_widths() {
        for value in [
            PropertyValue::Float(1.0),
            PropertyValue::Int(-1),
            PropertyValue::Vector([1.0; 4]),
            PropertyValue::Color([0.5; 4]),
            PropertyValue::Texture(7),
        ] {
            let mut writer = MessageWriter::new();
            writer.write_value(&value);
            assert_eq!(writer.len(), 1 + value.kind().value_size());
        }
    }

    #[test]
    fn test_finish_bounded() {
        let mut writer = MessageWriter::new();
        writer.write_u64(0);
        assert!(matches!(
            writer.finish_bounded(4),
            Err(MirraError::InvalidWireFormat(_))
        ));
    }
}
