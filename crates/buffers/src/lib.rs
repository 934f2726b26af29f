//! Binary buffer primitives for the ROOT object codec.
//!
//! This crate provides bounds-checked reading and writing of the primitive
//! values every ROOT record is made of. All multi-byte values use the
//! big-endian byte order of the ROOT on-disk format.
//!
//! # Overview
//!
//! - [`Reader`] - Reads primitives from a byte slice with cursor tracking
//! - [`Writer`] - Writes primitives to an auto-growing buffer, with backpatching
//! - [`Primitive`] - Element codec used by the fixed-array helpers
//! - [`RootString`] - Length-prefixed byte string, not required to be UTF-8
//!
//! # Example
//!
//! ```
//! use rootio_buffers::{Reader, Writer};
//!
//! // Write some data
//! let mut writer = Writer::new();
//! writer.u8(0x01);
//! writer.u16(0x0203);
//! writer.string("hello").unwrap();
//! let data = writer.flush();
//!
//! // Read it back
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8().unwrap(), 0x01);
//! assert_eq!(reader.u16().unwrap(), 0x0203);
//! assert_eq!(reader.string().unwrap(), "hello");
//! ```

mod primitive;
mod reader;
mod string;
mod writer;

pub use primitive::Primitive;
pub use reader::Reader;
pub use string::RootString;
pub use writer::Writer;

/// Length byte announcing a 32-bit length after it (strings of 255+ bytes).
pub const LONG_STRING_MARKER: u8 = 255;

/// Error type for buffer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer {
        /// Absolute position of the failed read.
        pos: usize,
        /// Number of bytes the read needed.
        wanted: usize,
        /// Number of bytes left in the buffer.
        remaining: usize,
    },
    /// Seek or patch target outside the buffer.
    InvalidSeek {
        /// Requested absolute position.
        pos: usize,
        /// First valid absolute position.
        start: usize,
        /// One past the last valid absolute position.
        end: usize,
    },
    /// A length does not fit the 32-bit field that must carry it.
    Overflow {
        /// The offending length.
        len: usize,
    },
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::EndOfBuffer {
                pos,
                wanted,
                remaining,
            } => write!(
                f,
                "end of buffer at offset {pos}: wanted {wanted} bytes, {remaining} left"
            ),
            BufferError::InvalidSeek { pos, start, end } => {
                write!(f, "invalid offset {pos} (buffer spans {start}..{end})")
            }
            BufferError::Overflow { len } => write!(f, "length {len} overflows a 32-bit field"),
        }
    }
}

impl std::error::Error for BufferError {}
