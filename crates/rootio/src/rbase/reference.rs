use std::sync::OnceLock;

use rootio_buffers::RootString;
use serde_json::{json, Value};

use super::{Object, HAS_UUID};
use crate::error::{DecodeError, EncodeError};
use crate::identity::IdentityTable;
use crate::rbuffer::RBuffer;
use crate::record::{ObjectRef, Record};
use crate::wbuffer::WBuffer;

/// `TRef`: a non-owning pointer to another record by unique id.
///
/// The target may be decoded before or after the reference. Resolution is
/// lazy: [`Ref::resolve`] looks the id up in the session's identity table
/// and caches the target once found. Id 0 is the null reference.
#[derive(Debug, Clone, Default)]
pub struct Ref {
    /// Identity whose unique id is the target id.
    pub obj: Object,
    /// Target UUID, present when [`HAS_UUID`] is set.
    pub uuid: Option<RootString>,
    /// Index of the process the target belongs to.
    pub pidf: u16,
    target: OnceLock<ObjectRef>,
}

impl Ref {
    pub const CLASS: &'static str = "TRef";
    pub const VERSION: i16 = 1;

    pub fn new(target_id: u32) -> Self {
        Self {
            obj: Object {
                id: target_id,
                ..Object::new()
            },
            ..Self::default()
        }
    }

    pub fn target_id(&self) -> u32 {
        self.obj.id
    }

    pub fn is_null(&self) -> bool {
        self.obj.id == 0
    }

    /// Whether the target has been found already.
    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }

    /// The target record, if it has been materialized in `table`.
    pub fn resolve(&self, table: &IdentityTable) -> Option<ObjectRef> {
        if let Some(target) = self.target.get() {
            return Some(target.clone());
        }
        let target = table.get(self.obj.id)?;
        Some(self.target.get_or_init(|| target).clone())
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.obj == other.obj && self.uuid == other.uuid && self.pidf == other.pidf
    }
}

impl Record for Ref {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn max_known_version(&self) -> i16 {
        Self::VERSION
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        self.obj.decode(r)?;
        if self.obj.test_bits(HAS_UUID) {
            self.uuid = Some(r.read_string()?);
        } else {
            self.pidf = r.read_u16()?;
        }
        r.identity_mut().note_reference(self.obj.id);
        Ok(())
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        let beg = w.pos();
        self.obj.encode(w)?;
        if self.obj.test_bits(HAS_UUID) {
            let uuid = self.uuid.as_ref().map(RootString::as_bytes).unwrap_or_default();
            w.write_string(uuid)?;
        } else {
            w.write_u16(self.pidf);
        }
        Ok(w.pos() - beg)
    }

    fn object(&self) -> Option<&Object> {
        Some(&self.obj)
    }

    fn to_json(&self) -> Value {
        json!({
            "class": Self::CLASS,
            "target": self.obj.id,
            "bound": self.is_bound(),
        })
    }
}
