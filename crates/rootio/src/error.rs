//! Decode and encode error types.

use rootio_buffers::BufferError;
use thiserror::Error;

/// Failure raised while decoding a record.
///
/// Most kinds are fatal: the decode is aborted and the session is rolled
/// back. [`DecodeError::UnknownClass`] and [`DecodeError::ByteCountMismatch`]
/// are not; they are collected as warnings on an otherwise complete record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of buffer at offset {pos}: wanted {wanted} bytes, {remaining} left")]
    UnexpectedEof {
        pos: usize,
        wanted: usize,
        remaining: usize,
    },
    #[error("invalid offset {pos} (buffer spans {start}..{end})")]
    InvalidSeek { pos: usize, start: usize, end: usize },
    #[error("{class}: on-disk version {found} is newer than the newest supported version {max}")]
    VersionTooNew { class: String, found: i16, max: i16 },
    #[error("unknown class {class:?}, kept as an opaque record")]
    UnknownClass { class: String },
    #[error("{class}: byte count mismatch (declared {expected} bytes, consumed {actual})")]
    ByteCountMismatch {
        class: String,
        expected: usize,
        actual: usize,
    },
    #[error("invalid object tag {tag:#x} at offset {pos}")]
    InvalidTag { tag: u32, pos: usize },
    #[error("invalid class tag {tag:#x}")]
    InvalidClassTag { tag: u32 },
    #[error("length {len} does not fit in memory")]
    LengthOverflow { len: usize },
    #[error("{class}: {reason}")]
    Malformed { class: String, reason: String },
    #[error("records nested {depth} levels deep, limit is {max}")]
    TooDeep { depth: usize, max: usize },
}

impl DecodeError {
    /// Whether the error aborts the decode. Non-fatal errors are reported as
    /// warnings and the record is still produced.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DecodeError::UnknownClass { .. } | DecodeError::ByteCountMismatch { .. }
        )
    }

    pub(crate) fn malformed(class: &str, reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            class: class.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer {
                pos,
                wanted,
                remaining,
            } => DecodeError::UnexpectedEof {
                pos,
                wanted,
                remaining,
            },
            BufferError::InvalidSeek { pos, start, end } => {
                DecodeError::InvalidSeek { pos, start, end }
            }
            BufferError::Overflow { len } => DecodeError::LengthOverflow { len },
        }
    }
}

/// Failure raised while encoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{class}: record of {size} bytes exceeds the byte-count limit")]
    RecordTooLarge { class: String, size: usize },
    #[error("string of {len} bytes exceeds the 32-bit length field")]
    StringTooLong { len: usize },
    #[error("{class}: {len} elements exceed the 32-bit count field")]
    TooManyElements { class: String, len: usize },
    #[error("stream offset {pos} cannot be used as an object tag")]
    TagOverflow { pos: usize },
    #[error("cannot patch offset {pos}")]
    InvalidPatch { pos: usize },
}

impl From<BufferError> for EncodeError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::Overflow { len } => EncodeError::StringTooLong { len },
            BufferError::InvalidSeek { pos, .. } | BufferError::EndOfBuffer { pos, .. } => {
                EncodeError::InvalidPatch { pos }
            }
        }
    }
}
