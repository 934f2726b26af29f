//! Decode session over one byte region.

use std::collections::HashMap;
use std::sync::Arc;

use rootio_buffers::{BufferError, Primitive, Reader, RootString};
use tracing::{debug, trace, warn};

use crate::config::{ByteCountPolicy, CodecConfig, FutureVersionPolicy};
use crate::error::DecodeError;
use crate::framing::{
    self, WireHeader, BYTE_COUNT_BIAS, BYTE_COUNT_MASK, CLASS_MASK, MAP_OFFSET, MAX_BYTE_COUNT,
    NEW_CLASS_TAG,
};
use crate::identity::{self, IdentityTable};
use crate::opaque::Opaque;
use crate::rbase::IS_REFERENCED;
use crate::record::{Decoded, ObjectRef, Record, RecordState};
use crate::registry::{self, ClassEntry, TypeRegistry};

/// What a stream tag refers to.
#[derive(Clone)]
enum TagEntry {
    Class(ClassEntry),
    Object(ObjectRef),
}

struct Snapshot {
    pos: usize,
    identity: identity::Checkpoint,
    tags: usize,
    warnings: usize,
    depth: usize,
}

/// Reads records out of one byte region.
///
/// Holds the cursor, the class and object tags seen so far in the region,
/// and a borrow of the session's [`IdentityTable`]. Positions are absolute:
/// a buffer created with [`RBuffer::with_offset`] reports and resolves tags
/// relative to the enclosing region, like the writer that produced it.
pub struct RBuffer<'a> {
    r: Reader<'a>,
    identity: &'a mut IdentityTable,
    registry: &'a TypeRegistry,
    config: CodecConfig,
    tags: HashMap<usize, TagEntry>,
    tag_log: Vec<(usize, Option<TagEntry>)>,
    envelopes: Vec<Option<usize>>,
    warnings: Vec<DecodeError>,
    depth: usize,
    state: RecordState,
}

macro_rules! read_primitive {
    ($($name:ident => $ty:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self) -> Result<$ty, DecodeError> {
                self.read(|r| r.$ty())
            }
        )*
    };
}

impl<'a> RBuffer<'a> {
    /// A session reader using the global registry and the default config.
    pub fn new(data: &'a [u8], identity: &'a mut IdentityTable) -> Self {
        Self {
            r: Reader::new(data),
            identity,
            registry: registry::global(),
            config: CodecConfig::default(),
            tags: HashMap::new(),
            tag_log: Vec::new(),
            envelopes: Vec::new(),
            warnings: Vec::new(),
            depth: 0,
            state: RecordState::Unstarted,
        }
    }

    /// Places the first byte at absolute position `offset`.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.r = Reader::with_offset(self.r.as_slice(), offset);
        self
    }

    pub fn with_registry(mut self, registry: &'a TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    pub fn identity(&self) -> &IdentityTable {
        &*self.identity
    }

    pub fn identity_mut(&mut self) -> &mut IdentityTable {
        &mut *self.identity
    }

    /// State of the outermost record being decoded.
    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Warnings not yet handed out through a [`Decoded`].
    pub fn warnings(&self) -> &[DecodeError] {
        &self.warnings
    }

    pub fn pos(&self) -> usize {
        self.r.position()
    }

    pub fn end(&self) -> usize {
        self.r.end()
    }

    pub fn remaining(&self) -> usize {
        self.r.remaining()
    }

    pub fn seek(&mut self, pos: usize) -> Result<(), DecodeError> {
        Ok(self.r.seek(pos)?)
    }

    /// End of the innermost object envelope being decoded, if it has one.
    pub fn envelope_end(&self) -> Option<usize> {
        self.envelopes.last().copied().flatten()
    }

    #[inline]
    fn read<T>(
        &mut self,
        f: impl FnOnce(&mut Reader<'a>) -> Result<T, BufferError>,
    ) -> Result<T, DecodeError> {
        let opening = self.state == RecordState::Unstarted && self.depth > 0;
        if opening || self.state == RecordState::HeaderRead {
            self.state = RecordState::FieldsDecoding;
        }
        Ok(f(&mut self.r)?)
    }

    read_primitive! {
        read_u8 => u8,
        read_i8 => i8,
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_f32 => f32,
        read_f64 => f64,
        read_bool => bool,
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.read(|r| r.buf(n))
    }

    pub fn read_string(&mut self) -> Result<RootString, DecodeError> {
        self.read(|r| r.string())
    }

    pub fn read_cstring(&mut self, max: usize) -> Result<RootString, DecodeError> {
        self.read(|r| r.cstring(max))
    }

    pub fn read_fixed_array<T: Primitive>(&mut self, count: usize) -> Result<Vec<T>, DecodeError> {
        self.read(|r| r.fixed_array(count))
    }

    /// Reads a count field, rejecting negative values.
    pub fn read_count(&mut self, class: &str) -> Result<usize, DecodeError> {
        let n = self.read_i32()?;
        usize::try_from(n).map_err(|_| DecodeError::malformed(class, format!("negative count {n}")))
    }

    /// Reads the header that opens a record of `class`.
    ///
    /// A version of 0 or less is followed by a layout checksum when the
    /// registry knows checksums for `class`; the checksum is consumed and
    /// replaced by the version it stands for.
    ///
    /// Fails with [`DecodeError::VersionTooNew`] when the on-disk version is
    /// newer than `max`.
    pub fn read_version(&mut self, class: &str, max: i16) -> Result<WireHeader, DecodeError> {
        let mut hdr = framing::probe_header(&mut self.r)?;
        if hdr.version <= 0 && self.registry.has_checksums(class) {
            let checksum = self.r.u32()?;
            match self.registry.checksum_version(class, checksum) {
                Some(version) => hdr.version = version,
                None => debug!(class, checksum, "unknown class checksum"),
            }
        }
        trace!(
            class,
            version = hdr.version,
            byte_count = ?hdr.byte_count,
            start = hdr.start,
            "read header"
        );
        self.ensure_version(class, hdr.version, max)?;
        if self.depth == 0 || self.state == RecordState::Unstarted {
            self.state = RecordState::HeaderRead;
        }
        self.depth += 1;
        Ok(hdr)
    }

    /// Reads the next header without consuming it or judging its version.
    pub fn peek_header(&self) -> Result<WireHeader, DecodeError> {
        let mut ahead = self.r;
        Ok(framing::probe_header(&mut ahead)?)
    }

    /// Rejects a version newer than `max`.
    pub fn ensure_version(&self, class: &str, found: i16, max: i16) -> Result<(), DecodeError> {
        if found > max {
            return Err(DecodeError::VersionTooNew {
                class: class.to_owned(),
                found,
                max,
            });
        }
        Ok(())
    }

    /// Closes a record opened with [`read_version`](Self::read_version).
    ///
    /// The state only becomes [`RecordState::Complete`] here for a record
    /// decoded outside [`decode_record`](Self::decode_record) and
    /// [`decode_any`](Self::decode_any), which complete it themselves.
    ///
    /// A cursor that is not where the byte count says the record ends is
    /// reported according to [`CodecConfig::byte_count`]; under the default
    /// policy the mismatch is recorded as a warning and the cursor moved to
    /// the declared end.
    pub fn check_byte_count(&mut self, hdr: &WireHeader, class: &str) -> Result<(), DecodeError> {
        self.depth = self.depth.saturating_sub(1);
        if let Some(end) = hdr.end() {
            self.settle(class, hdr.start, end)?;
        }
        if self.depth == 0 {
            self.state = RecordState::Complete;
        }
        Ok(())
    }

    /// Reports a cursor that is not at the declared end `end` of a record.
    ///
    /// An end past the buffer leaves the cursor where it is.
    fn settle(&mut self, class: &str, start: usize, end: usize) -> Result<(), DecodeError> {
        let pos = self.r.position();
        if pos == end {
            return Ok(());
        }
        let err = DecodeError::ByteCountMismatch {
            class: class.to_owned(),
            expected: end - start - BYTE_COUNT_BIAS,
            actual: pos.saturating_sub(start + BYTE_COUNT_BIAS),
        };
        match self.config.byte_count {
            ByteCountPolicy::Strict => Err(err),
            ByteCountPolicy::Warn => {
                warn!(class, pos, end, "byte count mismatch");
                if end <= self.r.end() {
                    self.r.seek(end)?;
                }
                self.warnings.push(err);
                Ok(())
            }
        }
    }

    fn set_tag(&mut self, key: usize, entry: TagEntry) {
        let prev = self.tags.insert(key, entry);
        self.tag_log.push((key, prev));
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.r.position(),
            identity: self.identity.checkpoint(),
            tags: self.tag_log.len(),
            warnings: self.warnings.len(),
            depth: self.depth,
        }
    }

    fn restore(&mut self, snap: Snapshot) -> Result<(), DecodeError> {
        self.identity.rollback(snap.identity);
        while self.tag_log.len() > snap.tags {
            let Some((key, prev)) = self.tag_log.pop() else { break };
            match prev {
                Some(prev) => self.tags.insert(key, prev),
                None => self.tags.remove(&key),
            };
        }
        self.warnings.truncate(snap.warnings);
        self.depth = snap.depth;
        self.r.seek(snap.pos)?;
        Ok(())
    }

    /// Resolves a class name read from the stream, warning when it falls
    /// back to an opaque record.
    fn resolve_class(&mut self, class: &str) -> ClassEntry {
        let entry = self.registry.resolve(class);
        if entry.is_opaque() {
            warn!(class, "unknown class, keeping raw bytes");
            self.warnings.push(DecodeError::UnknownClass {
                class: class.to_owned(),
            });
        }
        entry
    }

    /// Decodes one record of an already resolved class at the cursor.
    ///
    /// Under [`FutureVersionPolicy::SkipAsOpaque`], a record that turns out
    /// to be too new is captured as an [`Opaque`] record instead, provided
    /// its extent is known.
    fn decode_entry(&mut self, entry: &ClassEntry) -> Result<ObjectRef, DecodeError> {
        let depth = self.envelopes.len();
        if depth > self.config.max_depth {
            return Err(DecodeError::TooDeep {
                depth,
                max: self.config.max_depth,
            });
        }
        let snap = self.snapshot();
        let mut record = entry.instantiate();
        match record.decode(self) {
            Ok(()) => {}
            Err(err @ DecodeError::VersionTooNew { .. })
                if self.config.future_version == FutureVersionPolicy::SkipAsOpaque =>
            {
                let start = snap.pos;
                self.restore(snap)?;
                let known_end = self.envelope_end().is_some()
                    || self.peek_header().ok().and_then(|h| h.end()).is_some();
                if !known_end {
                    return Err(err);
                }
                warn!(class = %entry.name, %err, "skipping record as opaque");
                let mut opaque = Opaque::new(entry.name.clone());
                opaque.decode(self)?;
                trace!(class = %entry.name, start, len = opaque.len(), "captured opaque record");
                self.warnings.push(err);
                record = Box::new(opaque);
            }
            Err(err) => return Err(err),
        }
        Ok(self.promote(record))
    }

    /// Shares a decoded record, entering it into the identity table when it
    /// is flagged as referenced.
    fn promote(&mut self, record: Box<dyn Record>) -> ObjectRef {
        let record: ObjectRef = Arc::from(record);
        let referenced = record
            .object()
            .filter(|obj| obj.bits & IS_REFERENCED != 0)
            .map(|obj| obj.id);
        if let Some(id) = referenced {
            debug!(id, class = record.class_name(), "promoting referenced record");
            self.identity.put(id, record.clone());
        }
        record
    }

    /// Reads a pointer to a record of any class.
    ///
    /// Returns `None` for a null pointer and for a tag that refers to
    /// nothing decoded in this region, in which case the enveloped bytes are
    /// skipped.
    pub fn read_object_any(&mut self) -> Result<Option<ObjectRef>, DecodeError> {
        let beg = self.r.position();
        let word = self.read_u32()?;

        let (tag, envelope) = if word & BYTE_COUNT_MASK == 0 || word == NEW_CLASS_TAG {
            (word, None)
        } else {
            let start = self.r.position();
            let tag = self.read_u32()?;
            let end = beg + (word & MAX_BYTE_COUNT) as usize + BYTE_COUNT_BIAS;
            (tag, Some((start, end)))
        };

        if tag & CLASS_MASK == 0 {
            return match tag {
                0 => Ok(None),
                1 => Err(DecodeError::InvalidTag { tag, pos: beg }),
                _ => match self.tags.get(&(tag as usize)) {
                    Some(TagEntry::Object(obj)) => Ok(Some(obj.clone())),
                    Some(TagEntry::Class(_)) => Err(DecodeError::InvalidTag { tag, pos: beg }),
                    None => {
                        debug!(tag, pos = beg, "skipping unknown object tag");
                        if let Some((_, end)) = envelope {
                            self.r.seek(end)?;
                        }
                        Ok(None)
                    }
                },
            };
        }

        let entry = if tag == NEW_CLASS_TAG {
            let max = self.config.max_class_name_len;
            let name = self.read_cstring(max)?.to_string_lossy().into_owned();
            let entry = self.resolve_class(&name);
            let key = match envelope {
                Some((start, _)) => start + MAP_OFFSET,
                None => self.tags.len() + 1,
            };
            self.set_tag(key, TagEntry::Class(entry.clone()));
            entry
        } else {
            let key = tag & !CLASS_MASK;
            match self.tags.get(&(key as usize)) {
                Some(TagEntry::Class(entry)) => entry.clone(),
                _ => return Err(DecodeError::InvalidClassTag { tag: key }),
            }
        };

        self.envelopes.push(envelope.map(|(_, end)| end));
        let res = self.decode_entry(&entry);
        self.envelopes.pop();
        let record = res?;

        let key = match envelope {
            Some(_) => beg + MAP_OFFSET,
            None => self.tags.len() + 1,
        };
        self.set_tag(key, TagEntry::Object(record.clone()));
        if let Some((_, end)) = envelope {
            self.settle(&entry.name, beg, end)?;
        }
        Ok(Some(record))
    }

    /// Opens a top-level decode. The call itself counts as one level, so
    /// the record stays incomplete until [`finish`](Self::finish).
    fn begin(&mut self) -> Snapshot {
        self.state = RecordState::Unstarted;
        self.depth = 1;
        self.snapshot()
    }

    fn finish<T>(&mut self, snap: Snapshot, res: Result<T, DecodeError>) -> Result<Decoded<T>, DecodeError> {
        match res {
            Ok(record) => {
                self.state = RecordState::Complete;
                self.depth = 0;
                let warnings = self.warnings.split_off(snap.warnings.min(self.warnings.len()));
                Ok(Decoded {
                    record,
                    state: RecordState::Complete,
                    warnings,
                })
            }
            Err(err) => {
                debug!(%err, pos = snap.pos, "decode faulted, rolling back");
                self.restore(snap)?;
                self.depth = 0;
                self.state = RecordState::Faulted;
                Err(err)
            }
        }
    }

    /// Decodes a top-level record of a statically known type.
    ///
    /// On a fatal error the session is rolled back: the cursor, the identity
    /// table and the tag map are left as they were before the call.
    pub fn decode_record<T: Record + Default>(&mut self) -> Result<Decoded<T>, DecodeError> {
        let snap = self.begin();
        let mut record = T::default();
        let res = record.decode(self).map(|()| record);
        self.finish(snap, res)
    }

    /// Decodes a top-level record whose class is known only by name.
    ///
    /// Unknown classes degrade to [`Opaque`] records with an
    /// [`DecodeError::UnknownClass`] warning.
    pub fn decode_any(&mut self, class: &str) -> Result<Decoded<ObjectRef>, DecodeError> {
        let snap = self.begin();
        let entry = self.resolve_class(class);
        self.envelopes.push(None);
        let res = self.decode_entry(&entry);
        self.envelopes.pop();
        self.finish(snap, res)
    }
}
