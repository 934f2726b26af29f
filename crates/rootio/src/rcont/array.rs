//! Fixed-size arrays of primitives (`TArrayC`, `TArrayI`, ...).
//!
//! On disk: a 32-bit element count followed by the elements, no header.

use serde_json::{json, Value};

use crate::error::{DecodeError, EncodeError};
use crate::rbuffer::RBuffer;
use crate::record::Record;
use crate::wbuffer::WBuffer;

macro_rules! root_array {
    ($(#[$meta:meta])* $name:ident, $class:literal, $elem:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            pub data: Vec<$elem>,
        }

        impl $name {
            pub const CLASS: &'static str = $class;
            pub const VERSION: i16 = 1;

            pub fn new(data: Vec<$elem>) -> Self {
                Self { data }
            }

            pub fn len(&self) -> usize {
                self.data.len()
            }

            pub fn is_empty(&self) -> bool {
                self.data.is_empty()
            }
        }

        impl From<Vec<$elem>> for $name {
            fn from(data: Vec<$elem>) -> Self {
                Self { data }
            }
        }

        impl Record for $name {
            fn class_name(&self) -> &str {
                Self::CLASS
            }

            fn max_known_version(&self) -> i16 {
                Self::VERSION
            }

            fn decode(&mut self, r: &mut RBuffer<'_>) -> Result<(), DecodeError> {
                let n = r.read_count(Self::CLASS)?;
                self.data = r.read_fixed_array::<$elem>(n)?;
                Ok(())
            }

            fn encode(&self, w: &mut WBuffer) -> Result<usize, EncodeError> {
                let beg = w.pos();
                w.write_count(Self::CLASS, self.data.len())?;
                w.write_fixed_array(&self.data);
                Ok(w.pos() - beg)
            }

            fn to_json(&self) -> Value {
                json!({ "class": Self::CLASS, "data": self.data })
            }
        }
    };
}

root_array!(
    /// `TArrayC`: array of 8-bit integers.
    ArrayC, "TArrayC", i8
);
root_array!(
    /// `TArrayS`: array of 16-bit integers.
    ArrayS, "TArrayS", i16
);
root_array!(
    /// `TArrayI`: array of 32-bit integers.
    ArrayI, "TArrayI", i32
);
root_array!(
    /// `TArrayL`: array of `long`, stored as 64-bit integers.
    ArrayL, "TArrayL", i64
);
root_array!(
    /// `TArrayL64`: array of 64-bit integers.
    ArrayL64, "TArrayL64", i64
);
root_array!(
    /// `TArrayF`: array of single-precision floats.
    ArrayF, "TArrayF", f32
);
root_array!(
    /// `TArrayD`: array of double-precision floats.
    ArrayD, "TArrayD", f64
);
