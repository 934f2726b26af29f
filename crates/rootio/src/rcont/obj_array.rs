use rootio_buffers::RootString;
use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};
use crate::rbase::Object;
use crate::rbuffer::RBuffer;
use crate::record::{ObjectRef, Record};
use crate::wbuffer::WBuffer;

/// `TObjArray`: a resizable array of records with nullable slots.
///
/// The `TObject` base appears from v3 and the name from v2.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjArray {
    pub obj: Object,
    pub name: RootString,
    /// Index of the first slot.
    pub low: i32,
    pub slots: Vec<Option<ObjectRef>>,
}

impl ObjArray {
    pub const CLASS: &'static str = "TObjArray";
    pub const VERSION: i16 = 3;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The record at `index`, counted from the lower bound.
    pub fn at(&self, index: i32) -> Option<&ObjectRef> {
        let i = usize::try_from(index.checked_sub(self.low)?).ok()?;
        self.slots.get(i)?.as_ref()
    }
}

impl Record for ObjArray {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn max_known_version(&self) -> i16 {
        Self::VERSION
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        let hdr = r.read_version(Self::CLASS, Self::VERSION)?;
        if hdr.version > 2 {
            self.obj.decode(r)?;
        }
        if hdr.version > 1 {
            self.name = r.read_string()?;
        }
        let n = r.read_count(Self::CLASS)?;
        self.low = r.read_i32()?;
        self.slots = Vec::with_capacity(n.min(r.remaining() / 4));
        for _ in 0..n {
            self.slots.push(r.read_object_any()?);
        }
        r.check_byte_count(&hdr, Self::CLASS)
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        let token = w.write_version(Self::VERSION);
        self.obj.encode(w)?;
        w.write_string(&self.name)?;
        w.write_count(Self::CLASS, self.slots.len())?;
        w.write_i32(self.low);
        for slot in &self.slots {
            w.write_object_any(slot.as_ref())?;
        }
        w.set_byte_count(token, Self::CLASS)
    }

    fn object(&self) -> Option<&Object> {
        Some(&self.obj)
    }

    fn to_json(&self) -> Value {
        let slots: Vec<Value> = self
            .slots
            .iter()
            .map(|s| s.as_ref().map_or(Value::Null, |o| o.to_json()))
            .collect();
        json!({
            "class": Self::CLASS,
            "name": self.name.to_string(),
            "low": self.low,
            "slots": slots,
        })
    }
}
