#![cfg(test)]

// Property tests for FishTable, checked against std::collections::HashMap as
// the model.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::hash::Hasher;

use proptest::prelude::*;

use crate::error::Error;
use crate::fish_table::FishTable;
use crate::hash::BuildIdHasher;
use crate::hash::DefaultHashBuilder;
use crate::hash::IdHasher;

// Keeps only the low three bits of the id hash so that keys pile up in a few
// long chains.
#[derive(Clone, Default)]
struct CrowdedHasher(BuildIdHasher);

impl BuildHasher for CrowdedHasher {
    type Hasher = Crowded;

    fn build_hasher(&self) -> Self::Hasher {
        Crowded(self.0.build_hasher())
    }
}

struct Crowded(IdHasher);

impl Hasher for Crowded {
    fn finish(&self) -> u64 {
        self.0.finish() & 0b111
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes);
    }

    fn write_u16(&mut self, i: u16) {
        self.0.write_u16(i);
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    Upsert(u16, i32),
    GetOrInit(u16),
    GetOrInsertWith(u16, i32),
    Mutate(u16, i32),
    Remove(u16),
    RemovePair(u16, i32),
    Get(u16),
    Reserve(u8),
    Clear,
    Iterate,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // A small key space keeps hits frequent.
    let key = 0u16..48;
    let value = -4i32..4;
    let op = prop_oneof![
        4 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Upsert(k, v)),
        2 => key.clone().prop_map(Op::GetOrInit),
        2 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::GetOrInsertWith(k, v)),
        2 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Mutate(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => (key.clone(), value).prop_map(|(k, v)| Op::RemovePair(k, v)),
        3 => key.prop_map(Op::Get),
        1 => any::<u8>().prop_map(Op::Reserve),
        1 => Just(Op::Clear),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..200)
}

fn initial_value(key: &u16) -> i32 {
    i32::from(*key) * 3
}

fn run_against_model<S>(mut sut: FishTable<u16, i32, S>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<u16, i32> = HashMap::new();
    sut.set_initializer(Some(initial_value));

    for op in ops {
        let version = sut.version();
        let capacity = sut.capacity();
        match op {
            Op::Insert(k, v) => {
                let result = sut.insert(k, v).map(|value| *value);
                if let std::collections::hash_map::Entry::Vacant(slot) = model.entry(k) {
                    slot.insert(v);
                    prop_assert_eq!(result, Ok(v));
                } else {
                    prop_assert_eq!(result, Err(Error::DuplicateKey));
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                }
            }
            Op::Upsert(k, v) => {
                let overwrite = model.contains_key(&k);
                prop_assert_eq!(sut.upsert(k, v), model.insert(k, v));
                if overwrite {
                    prop_assert_eq!(sut.capacity(), capacity);
                    prop_assert_eq!(sut.version(), version);
                }
            }
            Op::GetOrInit(k) => {
                let hit = model.contains_key(&k);
                let expected = *model.entry(k).or_insert_with(|| initial_value(&k));
                prop_assert_eq!(*sut.get_or_init(k), expected);
                if hit {
                    prop_assert_eq!(sut.capacity(), capacity);
                    prop_assert_eq!(sut.version(), version);
                }
            }
            Op::GetOrInsertWith(k, v) => {
                let hit = model.contains_key(&k);
                let expected = *model.entry(k).or_insert(v);
                prop_assert_eq!(*sut.get_or_insert_with(k, || v), expected);
                if hit {
                    prop_assert_eq!(sut.capacity(), capacity);
                    prop_assert_eq!(sut.version(), version);
                }
            }
            Op::Mutate(k, d) => {
                let expected = model.get_mut(&k).map(|value| {
                    *value = value.wrapping_add(d);
                    *value
                });
                let actual = sut.get_mut(&k).map(|value| {
                    *value = value.wrapping_add(d);
                    *value
                });
                prop_assert_eq!(actual, expected);
                prop_assert_eq!(sut.version(), version);
            }
            Op::Remove(k) => {
                let removed = sut.remove(&k);
                prop_assert_eq!(removed, model.remove(&k));
                if removed.is_some() {
                    prop_assert_ne!(sut.version(), version);
                } else {
                    prop_assert_eq!(sut.version(), version);
                }
            }
            Op::RemovePair(k, v) => {
                let expected = model.get(&k) == Some(&v);
                if expected {
                    model.remove(&k);
                }
                prop_assert_eq!(sut.remove_pair(&k, &v), expected);
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
                match model.get(&k) {
                    Some(v) => {
                        prop_assert_eq!(sut.try_get(&k), Ok(v));
                    }
                    None => {
                        prop_assert_eq!(sut.try_get(&k), Err(Error::KeyNotFound));
                    }
                }
            }
            Op::Reserve(additional) => {
                sut.reserve(usize::from(additional));
                prop_assert!(sut.capacity() >= sut.len() + usize::from(additional));
                prop_assert!(sut.capacity() >= capacity);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), capacity);
            }
            Op::Iterate => {
                let from_iter: BTreeMap<u16, i32> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                let expected: BTreeMap<u16, i32> = model.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(sut.iter().len(), from_iter.len());
                prop_assert_eq!(from_iter, expected);

                let mut cursor = sut.cursor();
                let mut visited = 0;
                while let Some((k, v)) = sut.advance(&mut cursor)? {
                    prop_assert_eq!(model.get(k), Some(v));
                    visited += 1;
                }
                prop_assert_eq!(visited, model.len());
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity().is_power_of_two());
        prop_assert!(sut.capacity() >= sut.len());
    }

    let drained: BTreeMap<u16, i32> = sut.drain().collect();
    let expected: BTreeMap<u16, i32> = model.into_iter().collect();
    prop_assert_eq!(drained, expected);
    prop_assert!(sut.is_empty());
    Ok(())
}

// Property: FishTable behaves like std's HashMap under random operation
// sequences, with well spread hashes and with heavily colliding ones.
// - `insert` never overwrites and reports DuplicateKey for present keys.
// - Value-only updates never change the version.
// - `iter`, the cursor and `drain` each yield every live entry exactly once.
// - `len` always matches the model and capacity stays a power of two.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_matches_model_with_id_hasher(ops in arb_ops()) {
        run_against_model(FishTable::with_hasher(BuildIdHasher::default()), ops)?;
    }

    #[test]
    fn prop_matches_model_with_collisions(ops in arb_ops()) {
        run_against_model(FishTable::with_hasher(CrowdedHasher::default()), ops)?;
    }

    #[test]
    fn prop_matches_model_from_capacity_one(ops in arb_ops()) {
        let table = FishTable::with_capacity_and_hasher(1, DefaultHashBuilder::default());
        run_against_model(table, ops)?;
    }

    // Growth keeps every entry reachable under its original key.
    #[test]
    fn prop_growth_preserves_contents(keys in proptest::collection::hash_set(any::<u32>(), 0..300)) {
        let mut table: FishTable<u32, u32> = FishTable::with_capacity(1);
        for &k in &keys {
            table.insert(k, k.wrapping_mul(7))?;
        }

        prop_assert_eq!(table.len(), keys.len());
        for &k in &keys {
            prop_assert_eq!(table.get(&k), Some(&k.wrapping_mul(7)));
        }

        let cloned = table.clone();
        let mut entries: Vec<(u32, u32)> = cloned.into_iter().collect();
        entries.sort_unstable();
        let mut expected: Vec<(u32, u32)> = keys.iter().map(|&k| (k, k.wrapping_mul(7))).collect();
        expected.sort_unstable();
        prop_assert_eq!(entries, expected);
    }

    // Any structural mutation fails a cursor that was mid-walk.
    #[test]
    fn prop_cursor_fails_after_structural_change(
        keys in proptest::collection::hash_set(0u16..1000, 2..50),
        remove_instead in any::<bool>(),
    ) {
        let mut table = FishTable::with_hasher(BuildIdHasher::default());
        for &k in &keys {
            table.insert(k, ())?;
        }

        let mut cursor = table.cursor();
        let first = table.advance(&mut cursor)?.map(|(k, _)| *k);
        prop_assert!(first.is_some());

        if remove_instead {
            let victim = keys.iter().copied().find(|k| Some(*k) != first).unwrap_or(0);
            prop_assert!(table.remove(&victim).is_some());
        } else {
            table.insert(1000, ())?;
        }
        prop_assert_eq!(table.advance(&mut cursor), Err(Error::EnumerationInvalidated));
    }
}
