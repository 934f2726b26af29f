use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};
use crate::rbuffer::RBuffer;
use crate::record::Record;
use crate::wbuffer::WBuffer;

/// Object lives on the heap.
pub const IS_ON_HEAP: u32 = 0x0100_0000;
/// Object has not been deleted.
pub const NOT_DELETED: u32 = 0x0200_0000;
/// Object is the target of a reference; a process index follows its bits.
pub const IS_REFERENCED: u32 = 1 << 4;
/// Reference is resolved through a UUID rather than a process index.
pub const HAS_UUID: u32 = 1 << 5;

/// `TObject`: the identity base shared by most record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Object {
    /// Unique id, 0 when unassigned.
    pub id: u32,
    pub bits: u32,
    /// Process index, present on disk only when [`IS_REFERENCED`] is set.
    pub pidf: u16,
}

impl Object {
    pub const CLASS: &'static str = "TObject";
    pub const VERSION: i16 = 1;

    pub fn new() -> Self {
        Self {
            id: 0,
            bits: IS_ON_HEAP | NOT_DELETED,
            pidf: 0,
        }
    }

    /// An object flagged as a reference target under `id`.
    pub fn referenced(id: u32) -> Self {
        Self {
            id,
            bits: IS_ON_HEAP | NOT_DELETED | IS_REFERENCED,
            pidf: 0,
        }
    }

    pub fn test_bits(&self, bits: u32) -> bool {
        self.bits & bits == bits
    }

    pub fn is_referenced(&self) -> bool {
        self.test_bits(IS_REFERENCED)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Object {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn max_known_version(&self) -> i16 {
        Self::VERSION
    }

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
        let hdr = r.read_version(Self::CLASS, Self::VERSION)?;
        self.id = r.read_u32()?;
        self.bits = r.read_u32()?;
        r.identity_mut().assign_id(self);
        self.pidf = if self.is_referenced() {
            r.read_u16()?
        } else {
            0
        };
        r.check_byte_count(&hdr, Self::CLASS)
    }

    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
        let beg = w.pos();
        w.write_short_version(Self::VERSION);
        w.write_u32(self.id);
        w.write_u32(self.bits);
        if self.is_referenced() {
            w.write_u16(self.pidf);
        }
        Ok(w.pos() - beg)
    }

    fn object(&self) -> Option<&Object> {
        Some(self)
    }

    fn to_json(&self) -> Value {
        json!({ "class": Self::CLASS, "id": self.id, "bits": self.bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityTable;

    #[test]
    fn test_layout() {
        let mut w = WBuffer::new();
        assert_eq!(Object::new().encode(&mut w).unwrap(), 10);
        assert_eq!(w.bytes(), &[0, 1, 0, 0, 0, 0, 0x03, 0, 0, 0]);
    }

    #[test]
    fn test_referenced_carries_pidf() {
        let mut obj = Object::referenced(7);
        obj.pidf = 3;
        let mut w = WBuffer::new();
        assert_eq!(obj.encode(&mut w).unwrap(), 12);
        let data = w.into_bytes();

        let mut table = IdentityTable::new();
        let mut r = RBuffer::new(&data, &mut table);
        let got = r.decode_record::<Object>().unwrap().record;
        assert_eq!(got, obj);
    }

    #[test]
    fn test_decode_forces_on_heap() {
        let data = [0, 1, 0, 0, 0, 5, 0, 0, 0, 0];
        let mut table = IdentityTable::new();
        let mut r = RBuffer::new(&data, &mut table);
        let got = r.decode_record::<Object>().unwrap().record;
        assert_eq!(got.id, 5);
        assert!(got.test_bits(IS_ON_HEAP));
    }
}
