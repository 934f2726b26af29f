use rootio_buffers::RootString;
use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};
use crate::rbase::Object;
use crate::rbuffer::RBuffer;
use crate::record::{ObjectRef, Record};
use crate::wbuffer::WBuffer;

/// `TMap`: key/value pairs of records of any class, in stream order.
///
/// Pairs whose key decodes as null are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    pub obj: Object,
    pub name: RootString,
    pub pairs: Vec<(ObjectRef, Option<ObjectRef>)>,
}

impl Map {
    pub const CLASS: &'static str = "TMap";
    pub const VERSION: i16 = 3;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ObjectRef, value: Option<ObjectRef>) {
        self.pairs.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The value stored under the first key equal to `key`.
    pub fn get(&self, key: &dyn Record) -> Option<&ObjectRef> {
        self.pairs
            .iter()
            .find(|(k, _)| **k == *key)
            .and_then(|(_, v)| v.as_ref())
    }
}

impl Record for Map {
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
        self.pairs = Vec::with_capacity(n.min(r.remaining() / 8));
        for _ in 0..n {
            let key = r.read_object_any()?;
            let value = r.read_object_any()?;
            if let Some(key) = key {
                self.pairs.push((key, value));
            }
        }
        r.check_byte_count(&hdr, Self::CLASS)
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        let token = w.write_version(Self::VERSION);
        self.obj.encode(w)?;
        w.write_string(&self.name)?;
        w.write_count(Self::CLASS, self.pairs.len())?;
        for (key, value) in &self.pairs {
            w.write_object_any(Some(key))?;
            w.write_object_any(value.as_ref())?;
        }
        w.set_byte_count(token, Self::CLASS)
    }

    fn object(&self) -> Option<&Object> {
        Some(&self.obj)
    }

    fn to_json(&self) -> Value {
        let pairs: Vec<Value> = self
            .pairs
            .iter()
            .map(|(k, v)| {
                json!({
                    "key": k.to_json(),
                    "value": v.as_ref().map_or(Value::Null, |v| v.to_json()),
                })
            })
            .collect();
        json!({
            "class": Self::CLASS,
            "name": self.name.to_string(),
            "pairs": pairs,
        })
    }
}
