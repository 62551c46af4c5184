//! Dictionary: the entry arena composed with the probe index.
//!
//! The arena ([`SlotMap`]) is the authoritative record of what the
//! dictionary holds; the [`ProbeIndex`] only accelerates lookups and is
//! rebuilt wholesale whenever the dictionary grows. Arena keys are the
//! non-owning back-references stored in the index, so growth never
//! leaves the index dangling.
//!
//! Every dictionary is bound to one value [`Policy`]: flat text values
//! (each `set` stores an owned copy of the caller's string) or nested
//! tables (each `set_table` takes exclusive ownership of a child
//! dictionary, and dropping the parent drops the whole subtree). An
//! entry may hold a key with no value at all; that state is observable
//! through [`Lookup::Undefined`] and is distinct from a missing key.

use crate::hash::{KeyHash, SuperFastHash};
use crate::index::ProbeIndex;
use slotmap::{DefaultKey, SlotMap};
use std::fmt;
use std::io;
use thiserror::Error;

/// Smallest entry-store capacity; size hints below this are rounded up.
pub const MIN_CAPACITY: usize = 128;

/// Value interpretation bound to a dictionary instance.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Policy {
    /// Values are owned strings (the default).
    #[default]
    Text,
    /// Values are exclusively-owned child dictionaries.
    Tables,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Text => f.write_str("text"),
            Policy::Tables => f.write_str("nested-table"),
        }
    }
}

/// A stored value: an owned string or an owned child dictionary.
pub enum Value<H: KeyHash = SuperFastHash> {
    Text(String),
    Table(Dictionary<H>),
}

impl<H: KeyHash> Value<H> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Dictionary<H>> {
        match self {
            Value::Text(_) => None,
            Value::Table(t) => Some(t),
        }
    }
}

impl<H: KeyHash> fmt::Debug for Value<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Table(t) => f.debug_tuple("Table").field(t).finish(),
        }
    }
}

/// Result of a key lookup. `Undefined` means the key exists but carries
/// no value; callers that want a default only for truly missing keys
/// must treat the two cases differently.
pub enum Lookup<'a, H: KeyHash = SuperFastHash> {
    Absent,
    Undefined,
    Defined(&'a Value<H>),
}

impl<'a, H: KeyHash> Lookup<'a, H> {
    /// The value, if the key exists and has one.
    pub fn value(self) -> Option<&'a Value<H>> {
        match self {
            Lookup::Defined(v) => Some(v),
            _ => None,
        }
    }
}

impl<H: KeyHash> fmt::Debug for Lookup<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Absent => f.write_str("Absent"),
            Lookup::Undefined => f.write_str("Undefined"),
            Lookup::Defined(v) => f.debug_tuple("Defined").field(v).finish(),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum DictError {
    /// The operation's value kind does not match the dictionary's policy.
    #[error("dictionary is bound to the {0} value policy")]
    PolicyMismatch(Policy),
    /// The policy can only be (re)bound while the dictionary is empty.
    #[error("value policy can only change while the dictionary is empty")]
    PolicyLocked,
}

#[derive(Debug, Error)]
pub enum DumpError {
    /// A dictionary of nested tables has no flat text form.
    #[error("cannot dump a nested-table dictionary as flat text")]
    NestedPolicy,
    #[error(transparent)]
    Io(#[from] io::Error),
}

struct Entry<H: KeyHash> {
    key: String,
    hash: u32,
    value: Option<Value<H>>,
}

/// String-keyed dictionary with open-addressed lookup and lazy deletion.
pub struct Dictionary<H: KeyHash = SuperFastHash> {
    hasher: H,
    policy: Policy,
    /// Logical entry-store capacity; doubles when an insert finds the
    /// store full, triggering an index rebuild.
    capacity: usize,
    entries: SlotMap<DefaultKey, Entry<H>>,
    index: ProbeIndex,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// A dictionary sized for roughly `hint` entries. `0` is fine when
    /// the eventual size is unknown.
    pub fn with_capacity(hint: usize) -> Self {
        Self::with_capacity_and_hasher(hint, SuperFastHash)
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: KeyHash> Dictionary<H> {
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(hint: usize, hasher: H) -> Self {
        let capacity = hint.max(MIN_CAPACITY);
        Dictionary {
            hasher,
            policy: Policy::Text,
            capacity,
            entries: SlotMap::with_capacity(capacity),
            index: ProbeIndex::for_capacity(capacity),
        }
    }

    /// Number of live entries (keys with or without a value).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Bind the value policy. Only legal while the dictionary is empty,
    /// so every stored value was checked against the policy in force.
    pub fn set_policy(&mut self, policy: Policy) -> Result<(), DictError> {
        if !self.entries.is_empty() {
            return Err(DictError::PolicyLocked);
        }
        self.policy = policy;
        Ok(())
    }

    /// Look up `key`, distinguishing a missing key from a key that was
    /// set with no value.
    pub fn get(&self, key: &str) -> Lookup<'_, H> {
        match self.locate(key) {
            None => Lookup::Absent,
            Some(id) => match self.entries.get(id).and_then(|e| e.value.as_ref()) {
                None => Lookup::Undefined,
                Some(v) => Lookup::Defined(v),
            },
        }
    }

    /// The text value for `key`, if the key exists and holds one.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).value().and_then(Value::as_text)
    }

    /// The child table for `key`, if the key exists and holds one. The
    /// reference stays parent-owned and is only valid until the entry is
    /// overwritten or removed.
    pub fn get_table(&self, key: &str) -> Option<&Dictionary<H>> {
        self.get(key).value().and_then(Value::as_table)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.locate(key).is_some()
    }

    /// Insert or overwrite a text value. The dictionary stores its own
    /// copy of `value`; `None` records the key with no value.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), DictError> {
        if self.policy != Policy::Text {
            return Err(DictError::PolicyMismatch(self.policy));
        }
        self.set_value(key, value.map(|v| Value::Text(v.to_owned())));
        Ok(())
    }

    /// Insert or overwrite a nested table, taking ownership of it.
    /// Overwriting or removing the entry later drops the whole subtree.
    pub fn set_table(&mut self, key: &str, table: Option<Dictionary<H>>) -> Result<(), DictError> {
        if self.policy != Policy::Tables {
            return Err(DictError::PolicyMismatch(self.policy));
        }
        self.set_value(key, table.map(Value::Table));
        Ok(())
    }

    /// Remove `key` if present; a miss is a no-op. The index slot becomes
    /// a tombstone so other probe chains keep walking past it.
    pub fn unset(&mut self, key: &str) {
        let hash = self.hasher.hash_key(key);
        let removed = self.index.remove(hash, |id| {
            self.entries.get(id).map(|e| e.key == key).unwrap_or(false)
        });
        if let Some(id) = removed {
            self.entries.remove(id);
        }
    }

    /// Write `key = value` lines (or `key = UNDEF` for valueless keys) in
    /// entry-store order. An empty dictionary emits a single sentinel
    /// line. Only meaningful under the text policy.
    pub fn dump<W: io::Write>(&self, out: &mut W) -> Result<(), DumpError> {
        if self.policy == Policy::Tables {
            return Err(DumpError::NestedPolicy);
        }
        if self.entries.is_empty() {
            writeln!(out, "empty dictionary")?;
            return Ok(());
        }
        for (key, value) in self.iter() {
            match value {
                Some(Value::Text(v)) => writeln!(out, "{key} = {v}")?,
                // Not reachable under the text policy.
                Some(Value::Table(_)) => return Err(DumpError::NestedPolicy),
                None => writeln!(out, "{key} = UNDEF")?,
            }
        }
        Ok(())
    }

    /// Iterate `(key, value)` pairs in entry-store order. The iterator
    /// is lazy and finite; call again to restart.
    pub fn iter(&self) -> Iter<'_, H> {
        Iter {
            it: self.entries.iter(),
        }
    }

    fn locate(&self, key: &str) -> Option<DefaultKey> {
        let hash = self.hasher.hash_key(key);
        self.index.find(hash, |id| {
            self.entries.get(id).map(|e| e.key == key).unwrap_or(false)
        })
    }

    fn set_value(&mut self, key: &str, value: Option<Value<H>>) {
        let hash = self.hasher.hash_key(key);
        let found = self.index.find(hash, |id| {
            self.entries.get(id).map(|e| e.key == key).unwrap_or(false)
        });
        if let Some(id) = found {
            // Overwrite in place: the old value drops here (recursing
            // into nested tables), key and arena slot stay put.
            if let Some(entry) = self.entries.get_mut(id) {
                entry.value = value;
            }
            return;
        }

        if self.entries.len() == self.capacity {
            self.grow();
        } else if self.index.saturated() {
            // Tombstones have eaten the index's slack; rebuild at the
            // same size to reclaim them before probing for a free slot.
            self.rebuild_index();
        }

        let id = self.entries.insert(Entry {
            key: key.to_owned(),
            hash,
            value,
        });
        self.index.insert(hash, id);
    }

    /// Double the capacity and rebuild the index at the new size. Live
    /// entries keep their arena keys, so only the index needs rewriting.
    fn grow(&mut self) {
        self.capacity *= 2;
        self.entries.reserve(self.capacity - self.entries.len());
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        let mut index = ProbeIndex::for_capacity(self.capacity);
        for (id, entry) in &self.entries {
            index.insert(entry.hash, id);
        }
        self.index = index;
    }
}

impl<H: KeyHash> fmt::Debug for Dictionary<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over a dictionary's entries in store order.
pub struct Iter<'a, H: KeyHash = SuperFastHash> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<H>>,
}

impl<'a, H: KeyHash> Iterator for Iter<'a, H> {
    type Item = (&'a str, Option<&'a Value<H>>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(_, e)| (e.key.as_str(), e.value.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: creation floors the capacity; explicit hints above the
    /// floor are honored.
    #[test]
    fn capacity_floor() {
        assert_eq!(Dictionary::new().capacity(), MIN_CAPACITY);
        assert_eq!(Dictionary::with_capacity(0).capacity(), MIN_CAPACITY);
        assert_eq!(Dictionary::with_capacity(1000).capacity(), 1000);
    }

    /// Invariant: the policy binds before first use and stays locked
    /// while any entry exists.
    #[test]
    fn policy_locks_while_nonempty() {
        let mut d = Dictionary::new();
        assert_eq!(d.policy(), Policy::Text);
        d.set("k", Some("v")).unwrap();
        assert_eq!(d.set_policy(Policy::Tables), Err(DictError::PolicyLocked));

        d.unset("k");
        d.set_policy(Policy::Tables).unwrap();
        assert_eq!(d.policy(), Policy::Tables);
        assert_eq!(
            d.set("k", Some("v")),
            Err(DictError::PolicyMismatch(Policy::Tables))
        );
    }

    /// Invariant: setting a table into a text dictionary is rejected
    /// without mutating it.
    #[test]
    fn table_rejected_under_text_policy() {
        let mut d = Dictionary::new();
        let child = Dictionary::new();
        assert_eq!(
            d.set_table("sub", Some(child)),
            Err(DictError::PolicyMismatch(Policy::Text))
        );
        assert_eq!(d.len(), 0);
    }

    /// Invariant: overwriting replaces the value in place; the entry
    /// count does not move.
    #[test]
    fn overwrite_in_place() {
        let mut d = Dictionary::new();
        d.set("host", Some("alpha")).unwrap();
        d.set("host", Some("beta")).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.get_text("host"), Some("beta"));
    }

    /// Invariant: a key set with no value is present but undefined,
    /// which is distinct from a key that was never set.
    #[test]
    fn undefined_is_not_absent() {
        let mut d = Dictionary::new();
        d.set("ghost", None).unwrap();
        assert!(matches!(d.get("ghost"), Lookup::Undefined));
        assert!(matches!(d.get("nothing"), Lookup::Absent));
        assert!(d.contains_key("ghost"));
        assert!(!d.contains_key("nothing"));
        assert_eq!(d.get_text("ghost"), None);
        assert_eq!(d.len(), 1);
    }

    /// Invariant: long set/unset churn at fixed capacity stays live.
    /// Deletions only tombstone the index, so without same-size rebuilds
    /// the probe table would run out of empty slots and lookups would
    /// spin; this drives far past that point.
    #[test]
    fn churn_survives_tombstone_buildup() {
        let mut d = Dictionary::new();
        for i in 0..2000 {
            let key = format!("churn{i}");
            d.set(&key, Some("v")).unwrap();
            assert_eq!(d.get_text(&key), Some("v"));
            d.unset(&key);
            assert_eq!(d.len(), 0);
        }
        assert_eq!(d.capacity(), MIN_CAPACITY);
        d.set("survivor", Some("yes")).unwrap();
        assert_eq!(d.get_text("survivor"), Some("yes"));
    }

    /// Invariant: growth doubles from the floor and keeps every entry
    /// reachable afterward.
    #[test]
    fn growth_preserves_entries() {
        let mut d = Dictionary::new();
        let n = MIN_CAPACITY + 1;
        for i in 0..n {
            let v = i.to_string();
            d.set(&format!("key{i}"), Some(v.as_str())).unwrap();
        }
        assert_eq!(d.len(), n);
        assert_eq!(d.capacity(), MIN_CAPACITY * 2);
        for i in 0..n {
            assert_eq!(d.get_text(&format!("key{i}")), Some(i.to_string().as_str()));
        }
    }

    /// Invariant: Debug formatting walks entries without touching the
    /// index (smoke check for the manual impls).
    #[test]
    fn debug_formats() {
        let mut d = Dictionary::new();
        d.set("a", Some("1")).unwrap();
        d.set("b", None).unwrap();
        let s = format!("{d:?}");
        assert!(s.contains("\"a\""));
        assert!(s.contains("Text"));
    }
}
