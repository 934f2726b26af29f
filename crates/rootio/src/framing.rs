//! Version and byte-count envelope shared by every record.
//!
//! A record payload is preceded by one of two headers:
//!
//! - short form: a 16-bit version;
//! - long form: a 32-bit byte count with [`BYTE_COUNT_MASK`] set, then the
//!   16-bit version. The count covers everything after the count field
//!   itself, so a record starting at `start` ends at
//!   `start + count + BYTE_COUNT_BIAS`.
//!
//! The reader tells the two apart by probing four bytes and rewinding when
//! the discriminator bit is clear. The writer always emits the long form.

use rootio_buffers::{BufferError, Reader, Writer};

use crate::error::EncodeError;

/// Discriminator bit of a long-form byte count.
pub const BYTE_COUNT_MASK: u32 = 0x4000_0000;
/// The same discriminator as seen from the high half of the count word.
pub const BYTE_COUNT_VMASK: u16 = 0x4000;
/// Marks a tag word as a class reference.
pub const CLASS_MASK: u32 = 0x8000_0000;
/// Tag word announcing a class name that follows in the stream.
pub const NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;
/// Distance between a stream position and the tag that refers to it.
pub const MAP_OFFSET: usize = 2;
/// Width of the byte-count field, which the count does not include.
pub const BYTE_COUNT_BIAS: usize = 4;
/// Largest byte count the 30 usable bits can carry.
pub const MAX_BYTE_COUNT: u32 = 0x3FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderForm {
    Short,
    Long,
}

/// A decoded version header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    /// Version found on disk.
    pub version: i16,
    /// Declared byte count, present for the long form only.
    pub byte_count: Option<u32>,
    /// Absolute position of the first header byte.
    pub start: usize,
}

impl WireHeader {
    pub fn form(&self) -> HeaderForm {
        match self.byte_count {
            Some(_) => HeaderForm::Long,
            None => HeaderForm::Short,
        }
    }

    /// Absolute position one past the record, when the header declares it.
    pub fn end(&self) -> Option<usize> {
        self.byte_count
            .map(|n| self.start + n as usize + BYTE_COUNT_BIAS)
    }

    /// Length of the header itself.
    pub fn len(&self) -> usize {
        match self.form() {
            HeaderForm::Short => 2,
            HeaderForm::Long => BYTE_COUNT_BIAS + 2,
        }
    }
}

/// A record whose consumed length disagrees with its declared byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteCountMismatch {
    /// Declared byte count.
    pub expected: usize,
    /// Bytes actually consumed after the count field.
    pub actual: usize,
    /// Absolute position where the record should have ended.
    pub end: usize,
}

/// Reads a short or long header without judging its version.
///
/// On failure the cursor is left where it was.
pub fn probe_header(r: &mut Reader<'_>) -> Result<WireHeader, BufferError> {
    let start = r.position();
    if r.remaining() >= BYTE_COUNT_BIAS + 2 {
        let word = r.u32()?;
        if word & BYTE_COUNT_MASK != 0 {
            let version = r.i16()?;
            return Ok(WireHeader {
                version,
                byte_count: Some(word & MAX_BYTE_COUNT),
                start,
            });
        }
        r.seek(start)?;
    }
    let version = r.i16()?;
    Ok(WireHeader {
        version,
        byte_count: None,
        start,
    })
}

/// Compares the cursor position against the extent a header declares.
pub fn check_byte_count(header: &WireHeader, pos: usize) -> Option<ByteCountMismatch> {
    let end = header.end()?;
    if pos == end {
        return None;
    }
    Some(ByteCountMismatch {
        expected: end - header.start - BYTE_COUNT_BIAS,
        actual: pos.saturating_sub(header.start + BYTE_COUNT_BIAS),
        end,
    })
}

/// Start of a long-form header whose byte count is not known yet.
#[derive(Debug)]
#[must_use = "the byte count must be backpatched with finish_header"]
pub struct HeaderToken {
    pub(crate) start: usize,
}

impl HeaderToken {
    pub fn start(&self) -> usize {
        self.start
    }
}

/// Writes a long-form header with a placeholder byte count.
pub fn write_header(w: &mut Writer, version: i16) -> HeaderToken {
    let start = w.position();
    w.u32(0);
    w.i16(version);
    HeaderToken { start }
}

/// Writes a short-form header.
pub fn write_short_header(w: &mut Writer, version: i16) {
    w.i16(version);
}

/// Backpatches the byte count opened by [`write_header`] and returns the
/// number of bytes written for the record, header included.
pub fn finish_header(w: &mut Writer, token: HeaderToken, class: &str) -> Result<usize, EncodeError> {
    let total = w.position() - token.start;
    let count = u32::try_from(total - BYTE_COUNT_BIAS)
        .ok()
        .filter(|&n| n <= MAX_BYTE_COUNT)
        .ok_or_else(|| EncodeError::RecordTooLarge {
            class: class.to_owned(),
            size: total,
        })?;
    w.patch_u32(token.start, count | BYTE_COUNT_MASK)?;
    Ok(total)
}
