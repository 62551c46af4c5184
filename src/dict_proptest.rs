#![cfg(test)]

// Property tests for Dictionary kept inside the crate so they can reach
// internal invariants without feature gates.

use crate::dict::{Dictionary, Lookup};
use crate::hash::KeyHash;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, Option<i32>),
    Unset(usize),
    Get(usize),
    Contains(String),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), proptest::option::of(any::<i32>())).prop_map(|(i, v)| OpI::Set(i, v)),
            idx.clone().prop_map(OpI::Unset),
            idx.clone().prop_map(OpI::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drive one op sequence against the model. Invariants checked after
// every op:
// - set-then-get returns the set value (or Undefined for valueless keys);
// - unset is idempotent and only removes its own key;
// - contains/len parity with the model;
// - iteration yields each live entry exactly once.
fn check_ops<H: KeyHash>(
    mut sut: Dictionary<H>,
    pool: &[String],
    ops: &[OpI],
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, Option<String>> = HashMap::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = &pool[*i];
                let v = v.map(|n| n.to_string());
                sut.set(k, v.as_deref()).unwrap();
                model.insert(k.clone(), v);
            }
            OpI::Unset(i) => {
                let k = &pool[*i];
                sut.unset(k);
                model.remove(k);
                // Second unset of the same key must be a no-op.
                sut.unset(k);
            }
            OpI::Get(i) => {
                let k = &pool[*i];
                match (sut.get(k), model.get(k)) {
                    (Lookup::Absent, None) => {}
                    (Lookup::Undefined, Some(None)) => {}
                    (Lookup::Defined(v), Some(Some(m))) => {
                        prop_assert_eq!(v.as_text(), Some(m.as_str()));
                    }
                    (got, want) => {
                        prop_assert!(false, "lookup mismatch: {:?} vs {:?}", got, want)
                    }
                }
            }
            OpI::Contains(k) => {
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            OpI::Iterate => {
                let seen: BTreeMap<String, Option<String>> = sut
                    .iter()
                    .map(|(k, v)| {
                        (
                            k.to_owned(),
                            v.and_then(|v| v.as_text()).map(str::to_owned),
                        )
                    })
                    .collect();
                let want: BTreeMap<String, Option<String>> =
                    model.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                prop_assert_eq!(seen, want);
            }
        }
        prop_assert_eq!(sut.len(), model.len());
    }
    Ok(())
}

// Property: state-machine equivalence against std HashMap under the real
// hash function.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        check_ops(Dictionary::new(), &pool, &ops)?;
    }
}

// Property: the same equivalence when every key collides. All probing
// decisions then ride on stored-hash equality plus key comparison, so
// this leans hard on chain traversal and tombstone handling.
#[derive(Clone, Copy, Debug, Default)]
struct ConstHash;

impl KeyHash for ConstHash {
    fn hash_key(&self, _key: &str) -> u32 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_full_collisions((pool, ops) in arb_scenario()) {
        check_ops(Dictionary::with_hasher(ConstHash), &pool, &ops)?;
    }
}
