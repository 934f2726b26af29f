//! Binary buffer reader with cursor tracking.

use crate::{BufferError, Primitive, RootString, LONG_STRING_MARKER};

/// A bounds-checked, big-endian reader over a byte slice.
///
/// Positions reported by [`Reader::position`] and accepted by [`Reader::seek`]
/// are absolute: they include the `offset` the reader was created with, so
/// that they line up with offsets computed by the layer that cut the slice
/// out of a larger region (object tags are such offsets).
///
/// # Example
///
/// ```
/// use rootio_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.u16().unwrap(), 0x0203);
/// assert!(reader.u16().is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    data: &'a [u8],
    x: usize,
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_offset(data, 0)
    }

    /// Creates a reader whose first byte sits at absolute position `offset`.
    pub fn with_offset(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            x: 0,
            offset,
        }
    }

    /// The whole underlying slice, independent of the cursor.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Absolute position of the first byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute position of the cursor.
    pub fn position(&self) -> usize {
        self.offset + self.x
    }

    /// Absolute position one past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.data.len()
    }

    /// Moves the cursor to the absolute position `pos`.
    pub fn seek(&mut self, pos: usize) -> Result<(), BufferError> {
        if pos < self.offset || pos > self.end() {
            return Err(BufferError::InvalidSeek {
                pos,
                start: self.offset,
                end: self.end(),
            });
        }
        self.x = pos - self.offset;
        Ok(())
    }

    /// Returns the number of remaining bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.x
    }

    pub fn is_eof(&self) -> bool {
        self.x == self.data.len()
    }

    fn ensure(&self, wanted: usize) -> Result<(), BufferError> {
        if wanted > self.remaining() {
            return Err(BufferError::EndOfBuffer {
                pos: self.position(),
                wanted,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Advances the cursor by the given number of bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.ensure(length)?;
        self.x += length;
        Ok(())
    }

    /// Returns a subslice of the given size and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.ensure(size)?;
        let start = self.x;
        self.x += size;
        Ok(&self.data[start..self.x])
    }

    #[inline]
    fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.x..self.x + N]);
        self.x += N;
        Ok(out)
    }

    /// Reads a big-endian u32 without advancing the cursor.
    pub fn peek_u32(&self) -> Result<u32, BufferError> {
        let mut probe = *self;
        probe.u32()
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.array::<1>()?[0])
    }

    /// Reads a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self) -> Result<i8, BufferError> {
        Ok(i8::from_be_bytes(self.array()?))
    }

    /// Reads an unsigned 16-bit integer (big-endian).
    #[inline]
    pub fn u16(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    /// Reads a signed 16-bit integer (big-endian).
    #[inline]
    pub fn i16(&mut self) -> Result<i16, BufferError> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    /// Reads an unsigned 32-bit integer (big-endian).
    #[inline]
    pub fn u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Reads a signed 32-bit integer (big-endian).
    #[inline]
    pub fn i32(&mut self) -> Result<i32, BufferError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    /// Reads an unsigned 64-bit integer (big-endian).
    #[inline]
    pub fn u64(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    /// Reads a signed 64-bit integer (big-endian).
    #[inline]
    pub fn i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    /// Reads a 32-bit floating point number (big-endian).
    #[inline]
    pub fn f32(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    /// Reads a 64-bit floating point number (big-endian).
    #[inline]
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    /// Reads a boolean stored as one byte; any nonzero value is `true`.
    #[inline]
    pub fn bool(&mut self) -> Result<bool, BufferError> {
        Ok(self.u8()? != 0)
    }

    /// Reads a ROOT string: one length byte, escaped to a 32-bit length when
    /// it equals 255, followed by that many raw bytes.
    pub fn string(&mut self) -> Result<RootString, BufferError> {
        let start = self.x;
        let n = match self.u8()? {
            LONG_STRING_MARKER => self.u32()? as usize,
            n => n as usize,
        };
        match self.buf(n) {
            Ok(bytes) => Ok(RootString::from(bytes)),
            Err(err) => {
                self.x = start;
                Err(err)
            }
        }
    }

    /// Reads a NUL-terminated string of at most `max` bytes.
    ///
    /// The terminator is consumed but not returned. When no terminator shows
    /// up within `max` bytes, the `max` bytes read so far are returned.
    pub fn cstring(&mut self, max: usize) -> Result<RootString, BufferError> {
        let window = &self.data[self.x..];
        let limit = window.len().min(max);
        match window[..limit].iter().position(|&b| b == 0) {
            Some(nul) => {
                let bytes = self.buf(nul)?;
                self.x += 1;
                Ok(RootString::from(bytes))
            }
            None if limit == max => Ok(RootString::from(self.buf(limit)?)),
            None => Err(BufferError::EndOfBuffer {
                pos: self.position(),
                wanted: limit + 1,
                remaining: self.remaining(),
            }),
        }
    }

    /// Reads `count` consecutive primitives with no length prefix.
    ///
    /// The whole extent is checked before anything is allocated, so a bogus
    /// count read from a corrupted stream fails fast.
    pub fn fixed_array<T: Primitive>(&mut self, count: usize) -> Result<Vec<T>, BufferError> {
        let size = count
            .checked_mul(T::SIZE)
            .ok_or(BufferError::Overflow { len: count })?;
        self.ensure(size)?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(T::read_from(self)?);
        }
        Ok(out)
    }
}
