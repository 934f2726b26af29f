//! Fallback record for classes without a registered constructor.

use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};
use crate::framing::HeaderForm;
use crate::rbuffer::RBuffer;
use crate::record::Record;
use crate::wbuffer::WBuffer;

/// Raw bytes of a record whose layout is unknown.
///
/// The extent of the record is taken from the enclosing object envelope,
/// else from its own byte count, else it runs to the end of the buffer. The
/// bytes are kept verbatim, header included, so encoding writes back
/// exactly what was read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opaque {
    class: String,
    version: Option<i16>,
    form: Option<HeaderForm>,
    raw: Vec<u8>,
}

impl Opaque {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Self::default()
        }
    }

    /// Version found in the header, when the bytes start with one.
    pub fn version(&self) -> Option<i16> {
        self.version
    }

    pub fn form(&self) -> Option<HeaderForm> {
        self.form
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl Record for Opaque {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn max_known_version(&self) -> i16 {
        i16::MAX
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        let start = r.pos();
        let hdr = r.peek_header().ok();
        let end = r
            .envelope_end()
            .or_else(|| hdr.and_then(|h| h.end()))
            .unwrap_or_else(|| r.end());
        if end < start {
            return Err(DecodeError::malformed(
                &self.class,
                format!("record ends at {end} before it starts at {start}"),
            ));
        }
        self.version = hdr.map(|h| h.version);
        self.form = hdr.map(|h| h.form());
        self.raw = r.read_bytes(end - start)?.to_vec();
        Ok(())
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        w.write_bytes(&self.raw);
        Ok(self.raw.len())
    }

    fn to_json(&self) -> Value {
        json!({
            "class": self.class,
            "opaque": true,
            "version": self.version,
            "len": self.raw.len(),
        })
    }
}
