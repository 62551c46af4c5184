//! Open-addressed probe index over the entry arena.
//!
//! The index is an accelerator, never authoritative: each occupied slot
//! stores the entry's cached hash plus a non-owning arena key back into
//! the store. Deletion is lazy: a removed slot becomes a [`Slot::Tombstone`]
//! so probe chains for other keys keep walking past it, and tombstones
//! are only reclaimed when the owner rebuilds the whole index.
//!
//! Probing invariant: every mutation leaves at least one `Empty` slot in
//! the table (the owner rebuilds before consuming the last one, see
//! [`ProbeIndex::saturated`]), so the probe loops below always terminate.

use slotmap::DefaultKey;

/// One probe slot. `Occupied` and `Tombstone` are distinct states so a
/// lookup never mistakes a deleted slot for the end of a chain.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Slot {
    Empty,
    Tombstone,
    Occupied { hash: u32, entry: DefaultKey },
}

#[derive(Debug)]
pub(crate) struct ProbeIndex {
    slots: Vec<Slot>,
    /// Occupied + Tombstone slots. Tombstones keep counting until a
    /// rebuild clears them.
    used: usize,
}

impl ProbeIndex {
    /// Index sized for a store of `capacity` entries: 1.5x, keeping the
    /// average probe length bounded at full occupancy.
    pub(crate) fn for_capacity(capacity: usize) -> Self {
        ProbeIndex {
            slots: vec![Slot::Empty; capacity + (capacity >> 1)],
            used: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when one more insert would consume the final `Empty` slot.
    /// The owner must rebuild first; lookups in a table with no `Empty`
    /// slot would not terminate.
    pub(crate) fn saturated(&self) -> bool {
        self.used + 1 >= self.slots.len()
    }

    #[inline]
    fn next(&self, i: usize) -> usize {
        if i + 1 == self.slots.len() {
            0
        } else {
            i + 1
        }
    }

    /// Probe for the entry with this hash whose key satisfies `eq`.
    ///
    /// Walks from `hash mod len`, skipping tombstones and occupied slots
    /// with a different hash (or an equal hash but different key; `eq`
    /// resolves genuine collisions against the store), stopping at the
    /// first `Empty` slot.
    pub(crate) fn find(&self, hash: u32, mut eq: impl FnMut(DefaultKey) -> bool) -> Option<DefaultKey> {
        let mut i = hash as usize % self.slots.len();
        loop {
            match self.slots[i] {
                Slot::Empty => return None,
                Slot::Occupied { hash: h, entry } if h == hash && eq(entry) => {
                    return Some(entry)
                }
                _ => i = self.next(i),
            }
        }
    }

    /// Register a new entry. Scans past occupied and tombstone slots and
    /// writes the first `Empty` one; tombstones are never reused here, so
    /// a chain that has reached an `Empty` slot has provably seen every
    /// live member hashing earlier in it.
    ///
    /// The caller guarantees the key is not already present and that the
    /// table is not saturated.
    pub(crate) fn insert(&mut self, hash: u32, entry: DefaultKey) {
        let mut i = hash as usize % self.slots.len();
        loop {
            match self.slots[i] {
                Slot::Empty => {
                    self.slots[i] = Slot::Occupied { hash, entry };
                    self.used += 1;
                    return;
                }
                _ => i = self.next(i),
            }
        }
    }

    /// Tombstone the slot for this key and hand back its arena key.
    /// Absent keys are a no-op (`None`).
    pub(crate) fn remove(
        &mut self,
        hash: u32,
        mut eq: impl FnMut(DefaultKey) -> bool,
    ) -> Option<DefaultKey> {
        let mut i = hash as usize % self.slots.len();
        loop {
            match self.slots[i] {
                Slot::Empty => return None,
                Slot::Occupied { hash: h, entry } if h == hash && eq(entry) => {
                    self.slots[i] = Slot::Tombstone;
                    return Some(entry);
                }
                _ => i = self.next(i),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<DefaultKey> {
        let mut arena: SlotMap<DefaultKey, ()> = SlotMap::new();
        (0..n).map(|_| arena.insert(())).collect()
    }

    /// Invariant: entries with identical hashes chain linearly and each
    /// resolves through its own equality check.
    #[test]
    fn colliding_hashes_chain() {
        let ks = keys(3);
        let mut idx = ProbeIndex::for_capacity(8);
        for &k in &ks {
            idx.insert(7, k);
        }
        for &k in &ks {
            assert_eq!(idx.find(7, |e| e == k), Some(k));
        }
        assert_eq!(idx.find(7, |_| false), None);
    }

    /// Invariant: probing wraps at the end of the table instead of
    /// falling off it.
    #[test]
    fn probe_wraps_around() {
        let ks = keys(3);
        let mut idx = ProbeIndex::for_capacity(2); // 3 slots
        let last = (idx.len() - 1) as u32;
        for &k in &ks[..2] {
            idx.insert(last, k); // home slot is the final one
        }
        assert_eq!(idx.find(last, |e| e == ks[1]), Some(ks[1]));
    }

    /// Invariant: a tombstone does not terminate someone else's chain.
    /// With a shared hash, removing the first-inserted entry must leave
    /// the later entry reachable.
    #[test]
    fn tombstone_keeps_chain_walkable() {
        let ks = keys(2);
        let mut idx = ProbeIndex::for_capacity(8);
        idx.insert(3, ks[0]);
        idx.insert(3, ks[1]);
        assert_eq!(idx.remove(3, |e| e == ks[0]), Some(ks[0]));
        assert_eq!(idx.find(3, |e| e == ks[1]), Some(ks[1]));
        // Removing again is a miss, not a panic.
        assert_eq!(idx.remove(3, |e| e == ks[0]), None);
    }

    /// Invariant: inserts skip tombstones rather than reuse them, and
    /// `used` keeps counting them until a rebuild.
    #[test]
    fn tombstones_accumulate_until_rebuild() {
        let ks = keys(4);
        let mut idx = ProbeIndex::for_capacity(2); // 3 slots
        idx.insert(0, ks[0]);
        idx.remove(0, |e| e == ks[0]);
        idx.insert(0, ks[1]);
        // One tombstone + one occupied: the next insert would eat the
        // last Empty slot.
        assert!(idx.saturated());

        // The owner's rebuild: fresh table, reinsert live entries.
        let mut fresh = ProbeIndex::for_capacity(2);
        fresh.insert(0, ks[1]);
        assert!(!fresh.saturated());
        assert_eq!(fresh.find(0, |e| e == ks[1]), Some(ks[1]));
    }
}
