use rootio_buffers::RootString;
use serde_json::{json, Value};

use super::Object;
use crate::error::{DecodeError, EncodeError};
use crate::rbuffer::RBuffer;
use crate::record::Record;
use crate::wbuffer::WBuffer;

/// `TObjString`: a string wrapped in an object, also used for streams that
/// name their class `"string"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjString {
    pub obj: Object,
    pub value: RootString,
}

impl ObjString {
    pub const CLASS: &'static str = "TObjString";
    pub const VERSION: i16 = 1;

    pub fn new(value: impl Into<RootString>) -> Self {
        Self {
            obj: Object::new(),
            value: value.into(),
        }
    }
}

impl Record for ObjString {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn max_known_version(&self) -> i16 {
        Self::VERSION
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        let hdr = r.read_version(Self::CLASS, Self::VERSION)?;
        self.obj.decode(r)?;
        self.value = r.read_string()?;
        r.check_byte_count(&hdr, Self::CLASS)
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        let token = w.write_version(Self::VERSION);
        self.obj.encode(w)?;
        w.write_string(&self.value)?;
        w.set_byte_count(token, Self::CLASS)
    }

    fn object(&self) -> Option<&Object> {
        Some(&self.obj)
    }

    fn to_json(&self) -> Value {
        json!({ "class": Self::CLASS, "value": self.value.to_string() })
    }
}
