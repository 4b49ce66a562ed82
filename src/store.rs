//! Bounded, ordered history of snapshots

use tracing::info;

use crate::constants;
use crate::snapshot::Snapshot;

/// Ordered snapshot history, oldest first. The count never exceeds the
/// capacity: adding beyond it evicts the oldest entries. Eviction is
/// deliberately the simplest deterministic policy, drop oldest, with no
/// priority weights.
#[derive(Debug)]
pub struct SnapshotStore {
    snapshots: Vec<Snapshot>,
    capacity: usize,
}

impl SnapshotStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn add(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
        while self.snapshots.len() > self.capacity {
            let evicted = self.snapshots.remove(0);
            info!(
                snapshot = %evicted.display_name(),
                "store over capacity, evicting oldest snapshot"
            );
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Snapshot> {
        if index < self.snapshots.len() {
            Some(self.snapshots.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// All retained snapshots, oldest first.
    pub fn list(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(constants::store::CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Snapshot {
        Snapshot::from_records(Some(name.to_string()), Vec::new())
    }

    #[test]
    fn add_keeps_insertion_order() {
        let mut store = SnapshotStore::new(5);
        store.add(named("first"));
        store.add(named("second"));
        let names: Vec<_> = store.list().iter().map(|s| s.display_name()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn add_beyond_capacity_drops_oldest() {
        let mut store = SnapshotStore::new(3);
        for name in ["a", "b", "c", "d", "e"] {
            store.add(named(name));
        }
        assert_eq!(store.len(), 3);
        let names: Vec<_> = store.list().iter().map(|s| s.display_name()).collect();
        assert_eq!(names, ["c", "d", "e"]);
    }

    #[test]
    fn remove_is_plain_list_mutation() {
        let mut store = SnapshotStore::new(3);
        store.add(named("a"));
        store.add(named("b"));
        let removed = store.remove(0).unwrap();
        assert_eq!(removed.display_name(), "a");
        assert_eq!(store.len(), 1);
        assert!(store.remove(5).is_none());
    }

    #[test]
    fn count_never_exceeds_capacity() {
        let mut store = SnapshotStore::default();
        for i in 0..100 {
            store.add(named(&format!("s{i}")));
            assert!(store.len() <= crate::constants::store::CAPACITY);
        }
    }
}
