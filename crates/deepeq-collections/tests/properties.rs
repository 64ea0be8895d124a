use deepeq_collections::{
    are_equal, Comparable, DeepMap, Normalized, Normalizer, Options, Structure,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn map_of(entries: &[(u8, i32)]) -> DeepMap<Vec<u8>, i32> {
    DeepMap::from_entries(
        entries.iter().map(|(k, v)| (vec![*k, k.wrapping_mul(3)], *v)),
        &Options::default(),
    )
    .unwrap()
}

fn entries() -> impl Strategy<Value = Vec<(u8, i32)>> {
    prop::collection::vec((0u8..16, any::<i32>()), 0..12)
}

proptest! {
    #[test]
    fn prop_field_order_does_not_change_the_digest(
        fields in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8)
    ) {
        let forward: Vec<(Structure, Structure)> = fields
            .iter()
            .map(|(k, v)| (Structure::Str(k.clone()), Structure::Int(i128::from(*v))))
            .collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let normalizer = Normalizer::default();
        prop_assert_eq!(
            normalizer.normalize_key_structure(Structure::Map(forward)),
            normalizer.normalize_key_structure(Structure::Map(reversed))
        );
    }

    #[test]
    fn prop_primitives_normalize_to_themselves(number in any::<i64>(), text in "\\PC*") {
        let normalizer = Normalizer::default();
        prop_assert_eq!(normalizer.normalize_key(&number).unwrap(), Normalized::Int(i128::from(number)));
        prop_assert_eq!(normalizer.normalize_key(&text).unwrap(), Normalized::Str(text.clone()));

        let folded = Normalizer::new(&Options::new().with_case_insensitive(true));
        prop_assert_eq!(folded.normalize_key(&text).unwrap(), Normalized::Str(text.to_lowercase()));
    }

    #[test]
    fn prop_len_counts_distinct_keys(entries in entries()) {
        let distinct: HashSet<u8> = entries.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(map_of(&entries).len(), distinct.len());
    }

    #[test]
    fn prop_equals_is_reflexive_and_symmetric(left in entries(), right in entries()) {
        let a = map_of(&left);
        let b = map_of(&right);
        prop_assert!(a.equals(&a).unwrap());
        prop_assert!(a.contains(&map_of(&[])).unwrap());
        prop_assert_eq!(a.equals(&b).unwrap(), b.equals(&a).unwrap());
    }

    #[test]
    fn prop_union_is_bounded_and_keeps_the_callers_values(left in entries(), right in entries()) {
        let a = map_of(&left);
        let b = map_of(&right);
        let union = a.union(&b).unwrap();

        prop_assert!(union.len() >= a.len().max(b.len()));
        prop_assert!(union.len() <= a.len() + b.len());
        for (key, value) in a.iter() {
            prop_assert_eq!(union.get(key).unwrap(), Some(value));
        }
    }

    #[test]
    fn prop_single_value_is_always_equal(values in prop::collection::vec(any::<i32>(), 0..6)) {
        prop_assert!(are_equal([values], &Options::default()).unwrap());
    }
}
