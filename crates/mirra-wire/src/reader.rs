//! Message reader
//!
//! Bounds-checked counterpart of `MessageWriter`. Every read fails with
//! `BufferTooShort` instead of panicking on truncated input.

use mirra_core::{MirraError, MirraResult, PropertyKind, PropertyValue};

/// Little-endian binary reader over a received payload
#[derive(Debug)]
pub struct MessageReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> MessageReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        MessageReader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> MirraResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(MirraError::BufferTooShort {
                expected: self.pos + n,
                actual: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> MirraResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> MirraResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> MirraResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(MirraError::InvalidWireFormat(format!("Invalid bool byte: {}", b))),
        }
    }

    pub fn read_u16(&mut self) -> MirraResult<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> MirraResult<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> MirraResult<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> MirraResult<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> MirraResult<f32> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32x4(&mut self) -> MirraResult<[f32; 4]> {
        Ok([
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ])
    }

    /// Read a `u16` element count
    pub fn read_len(&mut self) -> MirraResult<usize> {
        Ok(self.read_u16()? as usize)
    }

    pub fn read_str(&mut self) -> MirraResult<String> {
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| MirraError::InvalidWireFormat("String is not UTF-8".into()))
    }

    /// Read a tagged property value
    pub fn read_value(&mut self) -> MirraResult<PropertyValue> {
        let tag = self.read_u8()?;
        let kind = PropertyKind::from_byte(tag)
            .ok_or_else(|| MirraError::InvalidWireFormat(format!("Unknown value tag: {}", tag)))?;
        Ok(match kind {
            PropertyKind::Float => PropertyValue::Float(self.read_f32()?),
            PropertyKind::Int => PropertyValue::Int(self.read_i32()?),
            PropertyKind::Vector => PropertyValue::Vector(self.read_f32x4()?),
            PropertyKind::Color => PropertyValue::Color(self.read_f32x4()?),
            PropertyKind::Texture => PropertyValue::Texture(self.read_u64()?),
        })
    }

    /// Fail if any bytes are left unread
    pub fn expect_end(&self) -> MirraResult<()> {
        if self.remaining() != 0 {
            return Err(MirraError::InvalidWireFormat(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }
}
