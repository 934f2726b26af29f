//! Element codec for fixed-size primitives.

use crate::{BufferError, Reader, Writer};

/// A fixed-width value that can be read and written without framing.
///
/// Used by [`Reader::fixed_array`] and [`Writer::fixed_array`] to stream
/// runs of primitives whose count is known from an earlier field.
pub trait Primitive: Copy + Sized {
    /// Encoded width in bytes.
    const SIZE: usize;

    fn read_from(reader: &mut Reader<'_>) -> Result<Self, BufferError>;

    fn write_to(self, writer: &mut Writer);
}

macro_rules! impl_primitive {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn read_from(reader: &mut Reader<'_>) -> Result<Self, BufferError> {
                    reader.$ty()
                }

                #[inline]
                fn write_to(self, writer: &mut Writer) {
                    writer.$ty(self);
                }
            }
        )*
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Primitive for bool {
    const SIZE: usize = 1;

    #[inline]
    fn read_from(reader: &mut Reader<'_>) -> Result<Self, BufferError> {
        reader.bool()
    }

    #[inline]
    fn write_to(self, writer: &mut Writer) {
        writer.bool(self);
    }
}
