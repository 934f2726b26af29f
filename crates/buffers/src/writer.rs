//! Auto-growing binary buffer writer.

use crate::{BufferError, Primitive, LONG_STRING_MARKER};

/// A big-endian writer appending to an owned, growable buffer.
///
/// Every `Writer` method is the byte-for-byte inverse of the [`Reader`]
/// method of the same name. Already written bytes can be overwritten with
/// [`Writer::patch_u32`], which is how byte counts are backpatched once a
/// record's length is known.
///
/// [`Reader`]: crate::Reader
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
    offset: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            offset: 0,
        }
    }

    /// Creates a writer whose first byte sits at absolute position `offset`.
    pub fn with_offset(offset: usize) -> Self {
        Self {
            buf: Vec::new(),
            offset,
        }
    }

    /// Absolute position of the next byte to be written.
    pub fn position(&self) -> usize {
        self.offset + self.buf.len()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Takes the written bytes, leaving the writer empty at the same offset.
    pub fn flush(&mut self) -> Vec<u8> {
        let out = std::mem::take(&mut self.buf);
        self.offset += out.len();
        out
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Overwrites four already written bytes at absolute position `pos`.
    pub fn patch_u32(&mut self, pos: usize, value: u32) -> Result<(), BufferError> {
        let start = pos
            .checked_sub(self.offset)
            .filter(|x| x + 4 <= self.buf.len())
            .ok_or(BufferError::InvalidSeek {
                pos,
                start: self.offset,
                end: self.position(),
            })?;
        self.buf[start..start + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Appends raw bytes.
    pub fn buf(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    #[inline]
    pub fn i8(&mut self, value: i8) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Writes a ROOT string. Lengths below 255 take a single length byte,
    /// longer ones the 255 escape followed by a 32-bit length.
    pub fn string(&mut self, value: impl AsRef<[u8]>) -> Result<(), BufferError> {
        let bytes = value.as_ref();
        match bytes.len() {
            n if n < LONG_STRING_MARKER as usize => self.u8(n as u8),
            n => {
                let n = u32::try_from(n).map_err(|_| BufferError::Overflow { len: n })?;
                self.u8(LONG_STRING_MARKER);
                self.u32(n);
            }
        }
        self.buf(bytes);
        Ok(())
    }

    /// Writes a NUL-terminated string, truncated at its first embedded NUL.
    pub fn cstring(&mut self, value: impl AsRef<[u8]>) {
        let bytes = value.as_ref();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.buf(&bytes[..end]);
        self.u8(0);
    }

    /// Writes consecutive primitives with no length prefix.
    pub fn fixed_array<T: Primitive>(&mut self, values: &[T]) {
        self.buf.reserve(values.len() * T::SIZE);
        for &v in values {
            v.write_to(self);
        }
    }
}
