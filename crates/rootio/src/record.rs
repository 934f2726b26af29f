//! The capability every concrete record type implements.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};
use crate::rbase::Object;
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

/// A shared handle to a decoded record of any class.
pub type ObjectRef = Arc<dyn Record>;

/// A concrete on-disk type.
///
/// Decoders follow one convention: read the header with
/// [`RBuffer::read_version`], branch on the version to pick the layout that
/// was current when the record was written, then close the record with
/// [`RBuffer::check_byte_count`]. Fields introduced after the on-disk
/// version keep their defaults.
///
/// Encoders always write the newest layout.
pub trait Record: AnyRecord + fmt::Debug + Send + Sync {
    /// Class name as stored in the stream.
    fn class_name(&self) -> &str;

    /// Newest on-disk version this type can decode.
    fn max_known_version(&self) -> i16;

    fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError>;

    /// Returns the number of bytes written.
    fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError>;

    /// The identity base of this record, for types deriving from `TObject`.
    fn object(&self) -> Option<&Object> {
        None
    }

    /// A diagnostic JSON view of the record.
    fn to_json(&self) -> Value {
        json!({ "class": self.class_name() })
    }
}

/// Type-erasure helpers, implemented for every comparable record type.
pub trait AnyRecord: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
}

impl<T: Any + PartialEq> AnyRecord for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

impl PartialEq for dyn Record {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other.as_any())
    }
}

impl dyn Record {
    pub fn is<T: Record>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Record>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Progress of the outermost record of a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordState {
    #[default]
    Unstarted,
    HeaderRead,
    FieldsDecoding,
    Complete,
    Faulted,
}

/// A successfully decoded record together with the non-fatal problems met
/// while decoding it.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub record: T,
    pub state: RecordState,
    pub warnings: Vec<DecodeError>,
}

impl<T> Decoded<T> {
    /// Whether any warning was recorded.
    pub fn is_flagged(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_byte_count_mismatch(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, DecodeError::ByteCountMismatch { .. }))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            record: f(self.record),
            state: self.state,
            warnings: self.warnings,
        }
    }
}
