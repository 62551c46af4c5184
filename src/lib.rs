//! ini-dict: a single-threaded, string-keyed dictionary with
//! open-addressed hashing and lazy deletion, built as the backing store
//! for INI-style configuration data.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the authoritative data and the lookup accelerator in
//!   separate, individually verifiable layers.
//! - Layers:
//!   - hash: `KeyHash` seam with the SuperFastHash default; tests swap
//!     in degenerate hashers to force collisions.
//!   - index: `ProbeIndex`, an open-addressed table of tri-state slots
//!     (Empty / Tombstone / Occupied) holding cached hashes plus
//!     non-owning arena keys; linear probing, lazy deletion, rebuilt
//!     wholesale on growth.
//!   - dict: `Dictionary`, the slotmap entry arena composed with the
//!     index; value policy (text vs nested tables), growth, dump,
//!     iteration.
//!   - ini: the text layer, reader/writer and typed getters that map
//!     `[section]` / `name = value` files onto composite `section:key`
//!     entries.
//!
//! Constraints
//! - Single-threaded by design: no interior mutability, mutation goes
//!   through `&mut Dictionary`.
//! - The index is never authoritative; dropping it and rebuilding from
//!   the arena must always reproduce it.
//! - Entries may hold a key with no value; lookups report that state
//!   separately from a missing key.
//! - Tombstones are only reclaimed by a full index rebuild, so the
//!   dictionary rebuilds before an insert could consume the index's
//!   last empty slot.
//!
//! Why this split?
//! - Localize invariants: probing and tombstone rules live entirely in
//!   `index`; ownership and policy rules live entirely in `dict`.
//! - The arena's stable keys make index rebuilds mechanical: no entry
//!   moves, only the accelerator is rewritten.
//! - The INI layer stays a thin consumer: composite keys are opaque
//!   strings to the core.

pub mod dict;
mod dict_proptest;
pub mod hash;
mod index;
pub mod ini;

// Public surface
pub use dict::{DictError, Dictionary, DumpError, Iter, Lookup, Policy, Value, MIN_CAPACITY};
pub use hash::{KeyHash, SuperFastHash};
pub use ini::IniError;
