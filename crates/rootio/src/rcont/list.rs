use rootio_buffers::RootString;
use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};
use crate::rbase::Object;
use crate::rbuffer::RBuffer;
use crate::record::{ObjectRef, Record};
use crate::wbuffer::WBuffer;

/// One element of a [`List`] and the option string it was added with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListEntry {
    pub obj: Option<ObjectRef>,
    pub option: RootString,
}

/// `TList`: a doubly linked list of records of any class.
///
/// Layouts by version:
/// - v1: element count and elements;
/// - v2: adds the name;
/// - v3: adds the `TObject` base;
/// - v4: adds an option string per element, with a one-byte length;
/// - v5: option lengths of 255 and more use the 32-bit escape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct List {
    pub obj: Object,
    pub name: RootString,
    pub entries: Vec<ListEntry>,
}

impl List {
    pub const CLASS: &'static str = "TList";
    pub const VERSION: i16 = 5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, obj: ObjectRef) {
        self.push_with_option(obj, "");
    }

    pub fn push_with_option(&mut self, obj: ObjectRef, option: impl Into<RootString>) {
        self.entries.push(ListEntry {
            obj: Some(obj),
            option: option.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectRef> {
        self.entries.iter().filter_map(|e| e.obj.as_ref())
    }
}

impl Record for List {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn max_known_version(&self) -> i16 {
        Self::VERSION
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        let hdr = r.read_version(Self::CLASS, Self::VERSION)?;
        let vers = hdr.version;
        if vers > 2 {
            self.obj.decode(r)?;
        }
        if vers > 1 {
            self.name = r.read_string()?;
        }
        let n = r.read_count(Self::CLASS)?;
        self.entries = Vec::with_capacity(n.min(r.remaining() / 4));
        for _ in 0..n {
            let obj = r.read_object_any()?;
            let option = match vers {
                v if v > 4 => r.read_string()?,
                4 => {
                    let nch = r.read_u8()? as usize;
                    RootString::from(r.read_bytes(nch)?)
                }
                _ => RootString::new(),
            };
            self.entries.push(ListEntry { obj, option });
        }
        r.check_byte_count(&hdr, Self::CLASS)
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        let token = w.write_version(Self::VERSION);
        self.obj.encode(w)?;
        w.write_string(&self.name)?;
        w.write_count(Self::CLASS, self.entries.len())?;
        for entry in &self.entries {
            w.write_object_any(entry.obj.as_ref())?;
            w.write_string(&entry.option)?;
        }
        w.set_byte_count(token, Self::CLASS)
    }

    fn object(&self) -> Option<&Object> {
        Some(&self.obj)
    }

    fn to_json(&self) -> Value {
        let entries: Vec<Value> = self
            .entries
            .iter()
            .map(|e| e.obj.as_ref().map_or(Value::Null, |o| o.to_json()))
            .collect();
        json!({
            "class": Self::CLASS,
            "name": self.name.to_string(),
            "entries": entries,
        })
    }
}
