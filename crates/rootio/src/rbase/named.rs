use rootio_buffers::RootString;
use serde_json::{json, Value};

use super::Object;
use crate::error::{DecodeError, EncodeError};
use crate::rbuffer::RBuffer;
use crate::record::Record;
use crate::wbuffer::WBuffer;

/// `TNamed`: an object with a name and a title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Named {
    pub obj: Object,
    pub name: RootString,
    pub title: RootString,
}

impl Named {
    pub const CLASS: &'static str = "TNamed";
    pub const VERSION: i16 = 1;

    pub fn new(name: impl Into<RootString>, title: impl Into<RootString>) -> Self {
        Self {
            obj: Object::new(),
            name: name.into(),
            title: title.into(),
        }
    }
}

impl Record for Named {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn max_known_version(&self) -> i16 {
        Self::VERSION
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        let hdr = r.read_version(Self::CLASS, Self::VERSION)?;
        self.obj.decode(r)?;
        self.name = r.read_string()?;
        self.title = r.read_string()?;
        r.check_byte_count(&hdr, Self::CLASS)
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        let token = w.write_version(Self::VERSION);
        self.obj.encode(w)?;
        w.write_string(&self.name)?;
        w.write_string(&self.title)?;
        w.set_byte_count(token, Self::CLASS)
    }

    fn object(&self) -> Option<&Object> {
        Some(&self.obj)
    }

    fn to_json(&self) -> Value {
        json!({
            "class": Self::CLASS,
            "name": self.name.to_string(),
            "title": self.title.to_string(),
        })
    }
}
