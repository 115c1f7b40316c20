//! # Byte Streams
//!
//! Little-endian primitive reader and writer shared by every record type.
//!
//! ## Layout
//!
//! - Integers and floats are little-endian
//! - Strings are a `u8` byte length followed by UTF-8 bytes
//! - `Byte3` is 3x`u8`, `Ushort3` 3x`u16`, `Float3` 3x`f32`
//!
//! Block grids are copied in bulk through `bytemuck` on little-endian
//! hosts instead of being converted cell by cell.

use fancade_core::{Byte3, Float3, Ushort3};

use crate::error::{CodecError, CodecResult};

/// Longest string a one-byte length prefix can describe.
pub const MAX_STRING_LEN: usize = u8::MAX as usize;

/// Reads primitives from a borrowed buffer.
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Current read offset.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Takes the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::Truncated {
                needed: len - remaining,
            });
        }
        let slice = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a u16 in little-endian format.
    #[inline]
    pub fn read_u16(&mut self) -> CodecResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Reads a u32 in little-endian format.
    #[inline]
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads a f32 in little-endian format.
    #[inline]
    pub fn read_f32(&mut self) -> CodecResult<f32> {
        self.read_u32().map(f32::from_bits)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> CodecResult<String> {
        let len = usize::from(self.read_u8()?);
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    /// Reads three bytes.
    pub fn read_byte3(&mut self) -> CodecResult<Byte3> {
        let [x, y, z] = self.read_array()?;
        Ok(Byte3::new(x, y, z))
    }

    /// Reads three u16 values.
    pub fn read_ushort3(&mut self) -> CodecResult<Ushort3> {
        Ok(Ushort3::new(self.read_u16()?, self.read_u16()?, self.read_u16()?))
    }

    /// Reads three f32 values.
    pub fn read_float3(&mut self) -> CodecResult<Float3> {
        Ok(Float3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Reads `count` little-endian u16 values.
    pub fn read_u16_slice(&mut self, count: usize) -> CodecResult<Vec<u16>> {
        let len = count.checked_mul(2).ok_or(CodecError::Truncated { needed: usize::MAX })?;
        let bytes = self.read_bytes(len)?;
        if cfg!(target_endian = "little") {
            let mut cells = vec![0u16; count];
            bytemuck::cast_slice_mut::<u16, u8>(&mut cells).copy_from_slice(bytes);
            Ok(cells)
        } else {
            Ok(bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect())
        }
    }
}

/// Appends primitives to a growable buffer.
#[derive(Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer, returning the buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing was written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a u16 in little-endian format.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a u32 in little-endian format.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a f32 in little-endian format.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> CodecResult<()> {
        let len = u8::try_from(value.len()).map_err(|_| CodecError::StringTooLong(value.len()))?;
        self.write_u8(len);
        self.write_bytes(value.as_bytes());
        Ok(())
    }

    /// Writes three bytes.
    pub fn write_byte3(&mut self, value: Byte3) {
        self.write_bytes(&[value.x, value.y, value.z]);
    }

    /// Writes three u16 values.
    pub fn write_ushort3(&mut self, value: Ushort3) {
        self.write_u16(value.x);
        self.write_u16(value.y);
        self.write_u16(value.z);
    }

    /// Writes three f32 values.
    pub fn write_float3(&mut self, value: Float3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    /// Writes u16 values in little-endian format.
    pub fn write_u16_slice(&mut self, values: &[u16]) {
        if cfg!(target_endian = "little") {
            self.write_bytes(bytemuck::cast_slice(values));
        } else {
            self.buffer.reserve(values.len() * 2);
            for &value in values {
                self.write_u16(value);
            }
        }
    }

    /// Writes a list length as a u16 count.
    pub fn write_count_u16(&mut self, len: usize) -> CodecResult<()> {
        let count = u16::try_from(len).map_err(|_| CodecError::TooManyItems(len))?;
        self.write_u16(count);
        Ok(())
    }

    /// Writes a list length as a u32 count.
    pub fn write_count_u32(&mut self, len: usize) -> CodecResult<()> {
        let count = u32::try_from(len).map_err(|_| CodecError::TooManyItems(len))?;
        self.write_u32(count);
        Ok(())
    }
}
