use std::fmt;

use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};
use crate::rbuffer::RBuffer;
use crate::record::Record;
use crate::wbuffer::WBuffer;

/// `TUUID`: a 16-byte universally unique identifier behind a 16-bit version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Uuid {
    pub version: u16,
    pub bytes: [u8; 16],
}

impl Uuid {
    pub const CLASS: &'static str = "TUUID";
    pub const VERSION: i16 = 1;

    pub fn new(bytes: [u8; 16]) -> Self {
        Self {
            version: Self::VERSION as u16,
            bytes,
        }
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.bytes.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl Record for Uuid {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn max_known_version(&self) -> i16 {
        Self::VERSION
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        let version = r.read_u16()?;
        let found = i16::try_from(version).unwrap_or(i16::MAX);
        r.ensure_version(Self::CLASS, found, Self::VERSION)?;
        self.version = version;
        self.bytes.copy_from_slice(r.read_bytes(16)?);
        Ok(())
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        w.write_u16(self.version);
        w.write_bytes(&self.bytes);
        Ok(2 + self.bytes.len())
    }

    fn to_json(&self) -> Value {
        json!({ "class": Self::CLASS, "uuid": self.to_string() })
    }
}
