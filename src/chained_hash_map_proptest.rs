#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can
// inspect bucket layout and the structural version.

use crate::chained_hash_map::ChainedHashMap;
use crate::config::TableConfig;
use crate::error::Error;
use crate::node::{bucket_index, Chain};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Get(usize),
    Remove(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            8 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            3 => idx.clone().prop_map(Op::Get),
            3 => idx.clone().prop_map(Op::Remove),
            2 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = TableConfig> {
    (1usize..=32, prop_oneof![Just(0.25), Just(0.5), Just(0.75), Just(1.0), Just(3.0)])
        .prop_map(|(c, lf)| TableConfig::new().with_capacity(c).with_load_factor(lf))
}

/// Structural invariants that must hold whenever control is back with the
/// caller.
fn check_structure<K, V, S>(m: &ChainedHashMap<K, V, S>) -> Result<(), TestCaseError>
where
    K: Eq + Hash + Clone + Ord + fmt::Debug,
{
    prop_assert!(m.capacity().is_power_of_two());
    prop_assert!(m.len() <= m.threshold(), "len {} over threshold {}", m.len(), m.threshold());
    let mut reached = 0usize;
    for (i, &head) in m.buckets.iter().enumerate() {
        let mut chain_keys = BTreeSet::new();
        for (_, n) in Chain::new(&m.nodes, head) {
            prop_assert_eq!(bucket_index(n.hash, m.capacity()), i);
            prop_assert!(chain_keys.insert(n.key.clone()), "duplicate key {:?} in chain", n.key);
            reached += 1;
        }
    }
    prop_assert_eq!(reached, m.len());
    Ok(())
}

fn run_model<S>(mut sut: ChainedHashMap<Key, i32, S>, pool: Vec<String>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        let before = sut.version;
        match op {
            Op::Put(i, v) => {
                let k = key_from(&pool, i);
                let expected = model.insert(k.clone(), v);
                let is_new = expected.is_none();
                prop_assert_eq!(sut.put(k.clone(), v), expected);
                prop_assert_eq!(sut.get(&k), Some(&v));
                if is_new {
                    prop_assert!(sut.version > before, "new key must bump version");
                } else {
                    prop_assert_eq!(sut.version, before, "overwrite must not bump version");
                }
            }
            Op::Get(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            Op::Remove(i) => {
                let k = key_from(&pool, i);
                let expected = model.remove(&k);
                let len_before = sut.len();
                let present = expected.is_some();
                prop_assert_eq!(sut.remove(&k), expected);
                prop_assert!(sut.get(&k).is_none());
                if present {
                    prop_assert_eq!(sut.len(), len_before - 1);
                    prop_assert!(sut.version > before);
                } else {
                    prop_assert_eq!(sut.version, before);
                }
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.saturating_add(d);
                }
                if let Some(mv) = model.get_mut(&k) {
                    *mv = mv.saturating_add(d);
                }
                prop_assert_eq!(sut.version, before);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert!(sut.version > before);
            }
            Op::Iterate => {
                let entries: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(entries.len(), model.len());
                let keys: BTreeSet<Key> = entries.iter().map(|(k, _)| k.clone()).collect();
                prop_assert_eq!(keys.len(), entries.len(), "iteration yielded a key twice");
                for (k, v) in &entries {
                    prop_assert_eq!(model.get(k), Some(v));
                }
                let view_keys: BTreeSet<Key> = sut.keys().iter().cloned().collect();
                prop_assert_eq!(view_keys, keys);
            }
        }

        check_structure(&sut)?;
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - put/get/remove return values match the model.
// - Version bumps exactly on structural mutations.
// - After every op: power-of-two capacity, `len <= threshold`, every node in
//   the bucket its hash selects, no duplicate keys per chain.
// - Iteration yields each live entry once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(cfg in arb_config(), (pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32> = ChainedHashMap::with_config(cfg).unwrap();
        run_model(sut, pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key lands in one chain.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants as above under worst-case collisions. This
// stresses chain append, unlink at head/middle/tail, and relinking a single
// long chain during resize.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(cfg in arb_config(), (pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32, ConstBuildHasher> =
            ChainedHashMap::with_config_and_hasher(cfg, ConstBuildHasher).unwrap();
        run_model(sut, pool, ops)?;
    }
}

// Property: after inserting `n` distinct keys starting from a single
// bucket, capacity is the smallest power of two whose threshold admits `n`.
proptest! {
    #[test]
    fn prop_capacity_is_minimal(n in 0usize..600, lf in prop_oneof![Just(0.5), Just(0.75), Just(1.0), Just(2.0)]) {
        let mut m: ChainedHashMap<usize, ()> = ChainedHashMap::with_capacity_and_load_factor(1, lf).unwrap();
        for i in 0..n {
            m.put(i, ());
        }
        let mut want = 1usize;
        while (want as f64 * lf) < n as f64 {
            want *= 2;
        }
        prop_assert_eq!(m.capacity(), want);
    }
}

// Property: a cursor that removes a random subset through itself never
// reports interference, visits every entry once, and leaves exactly the
// unremoved entries behind.
proptest! {
    #[test]
    fn prop_cursor_self_removal(keys in proptest::collection::btree_set(any::<u16>(), 0..200), mask in any::<u64>()) {
        let mut m: ChainedHashMap<u16, u16> = ChainedHashMap::with_capacity(1).unwrap();
        for &k in &keys {
            m.put(k, k);
        }
        let mut c = m.entries().cursor();
        let mut seen = BTreeSet::new();
        let mut kept = BTreeSet::new();
        while c.has_next() {
            let (k, v) = c.advance(&m).map(|(k, v)| (*k, *v)).map_err(fail)?;
            prop_assert_eq!(k, v);
            prop_assert!(seen.insert(k));
            if (mask >> (k % 64)) & 1 == 1 {
                let (rk, _) = c.remove(&mut m).map_err(fail)?;
                prop_assert_eq!(rk, k);
            } else {
                kept.insert(k);
            }
        }
        prop_assert_eq!(&seen, &keys);
        prop_assert_eq!(m.keys().iter().copied().collect::<BTreeSet<_>>(), kept);
        prop_assert!(matches!(c.advance(&m), Err(Error::NoSuchElement)));
    }
}

fn fail(e: Error) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}
