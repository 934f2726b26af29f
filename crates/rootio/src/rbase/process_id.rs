use serde_json::{json, Value};

use super::{Named, Object};
use crate::error::{DecodeError, EncodeError};
use crate::rbuffer::RBuffer;
use crate::record::Record;
use crate::wbuffer::WBuffer;

/// `TProcessID`: names the process that created a set of referenced objects.
/// References resolve through the process they were written by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessId {
    pub named: Named,
}

impl ProcessId {
    pub const CLASS: &'static str = "TProcessID";
    pub const VERSION: i16 = 1;

    pub fn new(name: &str, title: &str) -> Self {
        Self {
            named: Named::new(name, title),
        }
    }
}

impl Record for ProcessId {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn max_known_version(&self) -> i16 {
        Self::VERSION
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        let hdr = r.read_version(Self::CLASS, Self::VERSION)?;
        self.named.decode(r)?;
        r.check_byte_count(&hdr, Self::CLASS)
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        let token = w.write_version(Self::VERSION);
        self.named.encode(w)?;
        w.set_byte_count(token, Self::CLASS)
    }

    fn object(&self) -> Option<&Object> {
        Some(&self.named.obj)
    }

    fn to_json(&self) -> Value {
        json!({
            "class": Self::CLASS,
            "name": self.named.name.to_string(),
            "title": self.named.title.to_string(),
        })
    }
}
