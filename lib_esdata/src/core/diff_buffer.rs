//! # Diff Buffer
//!
//! The per-entity accumulation of changed fields between two dispatches.
//!
//! ## Core Functionality:
//!
//! - **Merge, not replace**: writing fields for an entity overlays them on what
//!   is already pending for it. The latest value for a field name wins; other
//!   fields of the entry are kept.
//!
//! - **Atomic drain**: `drain` swaps the whole map out for an empty one in a
//!   single step under the caller's lock. A write either lands before the swap
//!   (and leaves with the snapshot) or after it (and starts the next buffer);
//!   it can never be half-drained, lost, or delivered twice.
//!
//! - **Bounded**: if a write pushes the entity count over `max_entities`, the
//!   whole buffer is discarded, never trimmed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::model::{EntityId, FieldMap};

/// What a dispatch takes out of the buffer. Serializes to the wire document.
pub type DiffSnapshot = BTreeMap<EntityId, FieldMap>;

/// The buffer as shared between the host thread and the send task.
pub type SharedDiffBuffer = Arc<Mutex<DiffBuffer>>;

/// Result of a `merge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing to write.
    Unchanged,
    /// Fields merged into the entry.
    Merged,
    /// The entity bound was exceeded and this many entities were dropped.
    Discarded(usize),
}

/// # Diff Buffer
#[derive(Debug, Clone)]
pub struct DiffBuffer {
    entries: DiffSnapshot,
    max_entities: usize,
}

impl DiffBuffer {
    /// Creates an empty buffer holding at most `max_entities` entities.
    pub fn new(max_entities: usize) -> Self {
        Self {
            entries: DiffSnapshot::new(),
            max_entities,
        }
    }

    /// Wraps a new buffer for sharing with the poster.
    pub fn shared(max_entities: usize) -> SharedDiffBuffer {
        Arc::new(Mutex::new(Self::new(max_entities)))
    }

    /// Overlays `fields` on the pending entry for `id`.
    pub fn merge(&mut self, id: EntityId, fields: FieldMap) -> MergeOutcome {
        if fields.is_empty() {
            return MergeOutcome::Unchanged;
        }
        self.entries.entry(id).or_default().extend(fields);

        if self.entries.len() > self.max_entities {
            let dropped = self.entries.len();
            self.entries.clear();
            return MergeOutcome::Discarded(dropped);
        }
        MergeOutcome::Merged
    }

    /// Takes everything pending and leaves the buffer empty.
    pub fn drain(&mut self) -> DiffSnapshot {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The pending entry for `id`, if any.
    pub fn get(&self, id: &EntityId) -> Option<&FieldMap> {
        self.entries.get(id)
    }
}

/// Locks the shared buffer, taking over a poisoned lock. Every mutation is a
/// single call, so the map is never torn.
pub fn lock(shared: &Mutex<DiffBuffer>) -> MutexGuard<'_, DiffBuffer> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValue;
    use std::thread;

    fn id(s: &str) -> EntityId {
        EntityId::parse(s).unwrap()
    }

    fn fields(pairs: &[(&str, FieldValue)]) -> FieldMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn last_write_wins_and_unrelated_fields_survive() {
        let mut buf = DiffBuffer::new(10);
        buf.merge(id("SAS123"), fields(&[("squawk", "1234".into())]));
        buf.merge(id("SAS123"), fields(&[("cfl", 5000i64.into())]));
        buf.merge(id("SAS123"), fields(&[("cfl", 7000i64.into())]));

        let entry = buf.get(&id("SAS123")).unwrap();
        assert_eq!(entry.get("squawk"), Some(&FieldValue::Str("1234".into())));
        assert_eq!(entry.get("cfl"), Some(&FieldValue::Int(7000)));
        assert_eq!(entry.len(), 2);
    }

    #[test]
    fn empty_write_creates_no_entry() {
        let mut buf = DiffBuffer::new(10);
        assert_eq!(buf.merge(id("SAS123"), FieldMap::new()), MergeOutcome::Unchanged);
        assert!(buf.is_empty());
    }

    #[test]
    fn drain_leaves_buffer_empty() {
        let mut buf = DiffBuffer::new(10);
        buf.merge(id("SAS1"), fields(&[("ahdg", 90i64.into())]));
        buf.merge(id("SAS2"), fields(&[("ahdg", 180i64.into())]));

        let snapshot = buf.drain();
        assert_eq!(snapshot.len(), 2);
        assert!(buf.is_empty());
        assert!(buf.drain().is_empty());
    }

    #[test]
    fn overflow_discards_everything() {
        let mut buf = DiffBuffer::new(1000);
        for i in 0..1000 {
            let outcome = buf.merge(id(&format!("AC{i}")), fields(&[("rfl", 100i64.into())]));
            assert_eq!(outcome, MergeOutcome::Merged);
        }
        assert_eq!(buf.len(), 1000);

        // Updating a known entity does not grow the buffer.
        buf.merge(id("AC0"), fields(&[("rfl", 200i64.into())]));
        assert_eq!(buf.len(), 1000);

        let outcome = buf.merge(id("AC1000"), fields(&[("rfl", 100i64.into())]));
        assert_eq!(outcome, MergeOutcome::Discarded(1001));
        assert!(buf.is_empty());
    }

    #[test]
    fn concurrent_writes_are_never_lost_or_duplicated() {
        const WRITERS: usize = 4;
        const WRITES: usize = 500;

        let shared = DiffBuffer::shared(100);
        let mut handles = Vec::new();
        for w in 0..WRITERS {
            let shared = Arc::clone(&shared);
            handles.push(thread::spawn(move || {
                for n in 0..WRITES {
                    let key = format!("n{n}");
                    let pending = fields(&[(key.as_str(), FieldValue::Int(n as i64))]);
                    lock(&shared).merge(id(&format!("W{w}")), pending);
                }
            }));
        }

        let mut delivered = 0usize;
        while handles.iter().any(|h| !h.is_finished()) {
            let snapshot = lock(&shared).drain();
            delivered += snapshot.values().map(|f| f.len()).sum::<usize>();
        }
        for h in handles {
            h.join().unwrap();
        }
        delivered += lock(&shared)
            .drain()
            .values()
            .map(|f| f.len())
            .sum::<usize>();

        assert_eq!(delivered, WRITERS * WRITES);
    }
}
