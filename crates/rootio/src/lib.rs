//! Versioned, polymorphic binary object codec for the ROOT file format.
//!
//! The crate decodes and encodes records as they appear inside a ROOT file
//! once the file layer has located and decompressed them: each record is a
//! version header, optionally a byte count, and a payload whose layout
//! depends on the version. Records point at each other through class-tagged
//! object pointers and through unique ids.
//!
//! # Overview
//!
//! - [`RBuffer`] / [`WBuffer`] - Decode and encode sessions over one byte region
//! - [`Record`] - The capability every concrete type implements
//! - [`TypeRegistry`] - Class name to constructor map, with an opaque fallback
//! - [`IdentityTable`] - Unique-id table resolving references within a session
//! - [`framing`] - Version and byte-count envelope
//! - [`rbase`] / [`rcont`] - Built-in base and container record types
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rootio::rbase::Named;
//! use rootio::rcont::List;
//! use rootio::{IdentityTable, RBuffer, Record, WBuffer};
//!
//! let mut list = List::new();
//! list.push(Arc::new(Named::new("h1", "first histogram")));
//!
//! let mut w = WBuffer::new();
//! list.encode(&mut w).unwrap();
//! let data = w.into_bytes();
//!
//! let mut table = IdentityTable::new();
//! let mut r = RBuffer::new(&data, &mut table);
//! let decoded = r.decode_record::<List>().unwrap();
//! assert_eq!(decoded.record, list);
//! assert!(!decoded.is_flagged());
//! ```

mod config;
mod error;
mod identity;
mod opaque;
mod rbuffer;
mod record;
mod registry;
mod wbuffer;

pub mod framing;
pub mod rbase;
pub mod rcont;

pub use config::{
    ByteCountPolicy, CodecConfig, FutureVersionPolicy, DEFAULT_MAX_CLASS_NAME_LEN, DEFAULT_MAX_DEPTH,
};
pub use error::{DecodeError, EncodeError};
pub use framing::{HeaderForm, HeaderToken, WireHeader};
pub use identity::{Checkpoint, IdentityTable};
pub use opaque::Opaque;
pub use rbuffer::RBuffer;
pub use record::{AnyRecord, Decoded, ObjectRef, Record, RecordState};
pub use registry::{global as global_registry, ClassEntry, Constructor, Resolution, TypeRegistry};
pub use wbuffer::WBuffer;

pub use rootio_buffers::RootString;

/// Encodes `record` into a fresh buffer.
pub fn to_bytes(record: &dyn Record) -> Result<Vec<u8>, EncodeError> {
    let mut w = WBuffer::new();
    record.encode(&mut w)?;
    Ok(w.into_bytes())
}
