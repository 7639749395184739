use proptest::prelude::*;
use std::collections::BTreeMap;

use super::AvlTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i32, u32),
    Remove(i32),
    Get(i32),
    GetOrDefault(i32),
}

// A narrow key range so that sequences revisit, overwrite and remove the
// same keys often enough to exercise every rebalancing path.
fn key_strategy() -> impl Strategy<Value = i32> + Clone {
    -64..64i32
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        4 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::Get),
        1 => key.prop_map(Op::GetOrDefault),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #[test]
    fn prop_matches_btree_map(ops in ops_strategy()) {
        let mut map: AvlTreeMap<i32, u32> = AvlTreeMap::new();
        let mut model: BTreeMap<i32, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let inserted = map.insert(key, value);
                    let old = model.insert(key, value);
                    prop_assert_eq!(inserted, old.is_none());
                }
                Op::Remove(key) => {
                    let removed = map.remove(&key);
                    let old = model.remove(&key);
                    prop_assert_eq!(removed, old.is_some());
                }
                Op::Get(key) => {
                    prop_assert_eq!(map.get(&key), model.get(&key));
                    prop_assert_eq!(map.contains_key(&key), model.contains_key(&key));
                }
                Op::GetOrDefault(key) => {
                    let value = map.get_or_insert_default(key);
                    let expected = model.entry(key).or_default();
                    prop_assert_eq!(&*value, &*expected);
                    // Write through both references to check that the
                    // returned slot really is the one stored in the tree.
                    *value = value.wrapping_add(1);
                    *expected = expected.wrapping_add(1);
                }
            }

            map.check_consistency();
            prop_assert_eq!(map.len(), model.len());
        }

        for (key, value) in &model {
            prop_assert_eq!(map.get(key), Some(value));
        }
    }

    #[test]
    fn prop_insertion_order_is_irrelevant(
        keys in prop::collection::btree_set(any::<i32>(), 0..100)
            .prop_map(|keys| keys.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let mut map = AvlTreeMap::new();
        for &key in &keys {
            prop_assert!(map.insert(key, key));
            map.check_consistency();
        }
        prop_assert_eq!(map.len(), keys.len());
        for &key in &keys {
            prop_assert_eq!(map.get(&key), Some(&key));
        }
    }

    #[test]
    fn prop_remove_absent_is_a_no_op(
        keys in prop::collection::btree_set(key_strategy(), 1..100),
        absent in key_strategy(),
    ) {
        prop_assume!(!keys.contains(&absent));

        let mut map = AvlTreeMap::new();
        for &key in &keys {
            map.insert(key, key);
        }

        prop_assert!(!map.remove(&absent));
        map.check_consistency();
        prop_assert_eq!(map.len(), keys.len());
        for &key in &keys {
            prop_assert_eq!(map.get(&key), Some(&key));
        }
    }
}
