//! Per-session object identity table.
//!
//! Records deriving from `TObject` carry a unique id. When such a record is
//! flagged as referenced, it is entered here under its id so that `TRef`
//! values decoded anywhere in the same session can find it, in either order.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::rbase::{Object, IS_ON_HEAP};
use crate::record::ObjectRef;

enum Undo {
    Put {
        id: u32,
        prev: Option<ObjectRef>,
        was_pending: bool,
    },
    Pending { id: u32 },
}

/// Position in the table's history, see [`IdentityTable::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Maps unique ids to materialized records within one decode session.
///
/// Id 0 is the null id: it is never stored and never resolves.
#[derive(Default)]
pub struct IdentityTable {
    objects: HashMap<u32, ObjectRef>,
    pending: BTreeSet<u32>,
    log: Vec<Undo>,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a freshly decoded identity as live and returns its id.
    ///
    /// Ids come from the stream as is, referenced or not; 0 stays 0.
    pub fn assign_id(&mut self, obj: &mut Object) -> u32 {
        obj.bits |= IS_ON_HEAP;
        obj.id
    }

    /// Stores `record` under `id`, returning the record it replaces.
    pub fn put(&mut self, id: u32, record: ObjectRef) -> Option<ObjectRef> {
        if id == 0 {
            return None;
        }
        let was_pending = self.pending.remove(&id);
        if was_pending {
            debug!(id, class = record.class_name(), "resolved pending reference");
        }
        let prev = self.objects.insert(id, record);
        self.log.push(Undo::Put {
            id,
            prev: prev.clone(),
            was_pending,
        });
        prev
    }

    pub fn get(&self, id: u32) -> Option<ObjectRef> {
        if id == 0 {
            return None;
        }
        self.objects.get(&id).cloned()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.objects.contains_key(&id)
    }

    /// Records that something points at `id`. Ids without a target yet are
    /// kept as pending until the target is [`put`](Self::put).
    pub fn note_reference(&mut self, id: u32) {
        if id == 0 || self.objects.contains_key(&id) {
            return;
        }
        if self.pending.insert(id) {
            self.log.push(Undo::Pending { id });
        }
    }

    pub fn is_pending(&self, id: u32) -> bool {
        self.pending.contains(&id)
    }

    /// Ids referenced but not materialized so far, in ascending order.
    pub fn pending(&self) -> impl Iterator<Item = u32> + '_ {
        self.pending.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.log.len())
    }

    /// Undoes every change made since `cp`.
    pub fn rollback(&mut self, cp: Checkpoint) {
        let from = cp.0.min(self.log.len());
        let undone: Vec<Undo> = self.log.drain(from..).collect();
        for undo in undone.into_iter().rev() {
            match undo {
                Undo::Put {
                    id,
                    prev,
                    was_pending,
                } => {
                    match prev {
                        Some(prev) => self.objects.insert(id, prev),
                        None => self.objects.remove(&id),
                    };
                    if was_pending {
                        self.pending.insert(id);
                    }
                }
                Undo::Pending { id } => {
                    self.pending.remove(&id);
                }
            }
        }
    }
}

impl std::fmt::Debug for IdentityTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("IdentityTable")
            .field("ids", &ids)
            .field("pending", &self.pending)
            .finish()
    }
}
