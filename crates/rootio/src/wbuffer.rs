//! Encode session producing one byte region.

use std::collections::HashMap;
use std::sync::Arc;

use rootio_buffers::{Primitive, Writer};

use crate::error::EncodeError;
use crate::framing::{
    self, HeaderToken, BYTE_COUNT_BIAS, BYTE_COUNT_MASK, CLASS_MASK, MAP_OFFSET, MAX_BYTE_COUNT,
    NEW_CLASS_TAG,
};
use crate::record::ObjectRef;

/// Writes records into a growable buffer.
///
/// Remembers which classes and which records were already written, so that
/// a record shared by several pointers is written once and referred to by
/// its tag afterwards.
#[derive(Debug, Default)]
pub struct WBuffer {
    w: Writer,
    objects: HashMap<usize, (u32, ObjectRef)>,
    classes: HashMap<String, u32>,
}

macro_rules! write_primitive {
    ($($name:ident => $ty:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self, v: $ty) {
                self.w.$ty(v);
            }
        )*
    };
}

/// Object tags are stream positions and must leave the mask bits clear.
fn tag_for(pos: usize) -> Result<u32, EncodeError> {
    u32::try_from(pos)
        .ok()
        .filter(|&tag| tag <= MAX_BYTE_COUNT)
        .ok_or(EncodeError::TagOverflow { pos })
}

fn address(obj: &ObjectRef) -> usize {
    Arc::as_ptr(obj) as *const () as usize
}

impl WBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the first byte at absolute position `offset`.
    pub fn with_offset(offset: usize) -> Self {
        Self {
            w: Writer::with_offset(offset),
            ..Self::default()
        }
    }

    pub fn pos(&self) -> usize {
        self.w.position()
    }

    pub fn bytes(&self) -> &[u8] {
        self.w.as_slice()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.w.into_bytes()
    }

    write_primitive! {
        write_u8 => u8,
        write_i8 => i8,
        write_u16 => u16,
        write_i16 => i16,
        write_u32 => u32,
        write_i32 => i32,
        write_u64 => u64,
        write_i64 => i64,
        write_f32 => f32,
        write_f64 => f64,
        write_bool => bool,
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.w.buf(bytes);
    }

    pub fn write_string(&mut self, s: impl AsRef<[u8]>) -> Result<(), EncodeError> {
        Ok(self.w.string(s)?)
    }

    pub fn write_cstring(&mut self, s: impl AsRef<[u8]>) {
        self.w.cstring(s);
    }

    pub fn write_fixed_array<T: Primitive>(&mut self, values: &[T]) {
        self.w.fixed_array(values);
    }

    /// Writes a count field for `len` elements of `class`.
    pub fn write_count(&mut self, class: &str, len: usize) -> Result<(), EncodeError> {
        let n = i32::try_from(len).map_err(|_| EncodeError::TooManyElements {
            class: class.to_owned(),
            len,
        })?;
        self.w.i32(n);
        Ok(())
    }

    /// Opens a long-form header; close it with
    /// [`set_byte_count`](Self::set_byte_count).
    pub fn write_version(&mut self, version: i16) -> HeaderToken {
        framing::write_header(&mut self.w, version)
    }

    pub fn write_short_version(&mut self, version: i16) {
        framing::write_short_header(&mut self.w, version);
    }

    /// Backpatches the byte count of the header behind `token` and returns
    /// the record's length, header included.
    pub fn set_byte_count(&mut self, token: HeaderToken, class: &str) -> Result<usize, EncodeError> {
        framing::finish_header(&mut self.w, token, class)
    }

    /// Writes a pointer to a record of any class.
    ///
    /// `None` is written as a null tag and a record already written by this
    /// buffer as its object tag. Anything else is written in full inside a
    /// byte-count envelope, preceded by its class name the first time the
    /// class appears and by a class tag afterwards.
    pub fn write_object_any(&mut self, obj: Option<&ObjectRef>) -> Result<(), EncodeError> {
        let Some(obj) = obj else {
            self.w.u32(0);
            return Ok(());
        };
        let addr = address(obj);
        if let Some(&(tag, _)) = self.objects.get(&addr) {
            self.w.u32(tag);
            return Ok(());
        }

        let beg = self.pos();
        self.w.u32(0);
        let start = self.pos();
        let class = obj.class_name();
        match self.classes.get(class) {
            Some(&tag) => self.w.u32(tag | CLASS_MASK),
            None => {
                let tag = tag_for(start + MAP_OFFSET)?;
                self.w.u32(NEW_CLASS_TAG);
                self.w.cstring(class);
                self.classes.insert(class.to_owned(), tag);
            }
        }

        self.objects
            .insert(addr, (tag_for(beg + MAP_OFFSET)?, obj.clone()));
        obj.encode(self)?;

        let total = self.pos() - beg;
        let count = u32::try_from(total - BYTE_COUNT_BIAS)
            .ok()
            .filter(|&n| n <= MAX_BYTE_COUNT)
            .ok_or_else(|| EncodeError::RecordTooLarge {
                class: class.to_owned(),
                size: total,
            })?;
        self.w.patch_u32(beg, count | BYTE_COUNT_MASK)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbase::ObjString;

    #[test]
    fn test_null_pointer() {
        let mut w = WBuffer::new();
        w.write_object_any(None).unwrap();
        assert_eq!(w.bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_new_class_layout() {
        let obj: ObjectRef = Arc::new(ObjString::new("x"));
        let mut w = WBuffer::new();
        w.write_object_any(Some(&obj)).unwrap();
        let data = w.into_bytes();

        let word = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        assert_eq!(word & BYTE_COUNT_MASK, BYTE_COUNT_MASK);
        assert_eq!((word & MAX_BYTE_COUNT) as usize, data.len() - 4);
        assert_eq!(&data[4..8], &[0xFF; 4]);
        assert_eq!(&data[8..19], b"TObjString\0");
    }

    #[test]
    fn test_second_instance_uses_class_tag() {
        let a: ObjectRef = Arc::new(ObjString::new("a"));
        let b: ObjectRef = Arc::new(ObjString::new("b"));
        let mut w = WBuffer::new();
        w.write_object_any(Some(&a)).unwrap();
        let second = w.pos();
        w.write_object_any(Some(&b)).unwrap();
        let data = w.into_bytes();

        let tag = u32::from_be_bytes([
            data[second + 4],
            data[second + 5],
            data[second + 6],
            data[second + 7],
        ]);
        assert_eq!(tag, (4 + MAP_OFFSET as u32) | CLASS_MASK);
    }

    #[test]
    fn test_shared_record_written_once() {
        let obj: ObjectRef = Arc::new(ObjString::new("shared"));
        let mut w = WBuffer::new();
        w.write_object_any(Some(&obj)).unwrap();
        let first = w.pos();
        w.write_object_any(Some(&obj)).unwrap();
        assert_eq!(w.pos() - first, 4);
        assert_eq!(&w.bytes()[first..], &[0, 0, 0, MAP_OFFSET as u8]);
    }

    #[test]
    fn test_write_count_overflow() {
        let mut w = WBuffer::new();
        assert!(w.write_count("TList", 3).is_ok());
        assert_eq!(
            w.write_count("TList", usize::MAX),
            Err(EncodeError::TooManyElements {
                class: "TList".into(),
                len: usize::MAX
            })
        );
    }
}
