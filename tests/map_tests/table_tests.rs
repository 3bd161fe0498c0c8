//! AssociativeMap Tests
//!
//! Tests verify:
//! - put/get/remove semantics and size tracking
//! - Growth to 2n + 1 buckets at the load-factor threshold
//! - No shrinking on removal
//! - Chain handling under total hash collision
//! - Key/value enumeration

use std::hash::{BuildHasherDefault, Hasher};

use rmstore::map::{AssociativeMap, DEFAULT_CAPACITY};
use rmstore::RmsError;

/// Hasher that sends every key to the same bucket
#[derive(Default)]
struct CollidingHasher;

impl Hasher for CollidingHasher {
    fn finish(&self) -> u64 {
        42
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

type CollidingMap<K, V> = AssociativeMap<K, V, BuildHasherDefault<CollidingHasher>>;

fn colliding_map<K, V>() -> CollidingMap<K, V> {
    AssociativeMap::with_capacity_load_factor_and_hasher(11, 0.75, Default::default()).unwrap()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_map_is_empty() {
    let map: AssociativeMap<u32, u32> = AssociativeMap::new();

    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert_eq!(map.bucket_count(), DEFAULT_CAPACITY);
    assert_eq!(map.load_factor(), 0.75);
}

#[test]
fn test_put_and_get() {
    let mut map = AssociativeMap::new();

    assert_eq!(map.put("alpha", 1), None);
    assert_eq!(map.put("beta", 2), None);

    assert_eq!(map.get("alpha"), Some(&1));
    assert_eq!(map.get("beta"), Some(&2));
    assert_eq!(map.get("gamma"), None);
    assert_eq!(map.len(), 2);
}

#[test]
fn test_put_replaces_and_returns_previous() {
    let mut map = AssociativeMap::new();

    map.put(7u32, "first");
    let previous = map.put(7u32, "second");

    assert_eq!(previous, Some("first"));
    assert_eq!(map.get(&7), Some(&"second"));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_remove() {
    let mut map = AssociativeMap::new();
    map.put(1u32, 10u32);
    map.put(2u32, 20u32);

    assert_eq!(map.remove(&1), Some(10));
    assert_eq!(map.get(&1), None);
    assert_eq!(map.remove(&1), None);
    assert_eq!(map.get(&2), Some(&20));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_size_after_puts_and_removes() {
    let mut map = AssociativeMap::new();
    for i in 0..100u32 {
        map.put(i, i * 2);
    }
    for i in 0..40u32 {
        map.remove(&i);
    }

    assert_eq!(map.len(), 60);
    for i in 40..100u32 {
        assert_eq!(map.get(&i), Some(&(i * 2)));
    }
}

#[test]
fn test_borrowed_key_lookup() {
    let mut map: AssociativeMap<String, usize> = AssociativeMap::new();
    map.put("scores".to_string(), 3);

    assert!(map.contains_key("scores"));
    assert_eq!(map.get("scores"), Some(&3));
    assert_eq!(map.remove("scores"), Some(3));
    assert!(!map.contains_key("scores"));
}

#[test]
fn test_get_mut() {
    let mut map = AssociativeMap::new();
    map.put("counter", 0);

    if let Some(value) = map.get_mut("counter") {
        *value += 5;
    }

    assert_eq!(map.get("counter"), Some(&5));
}

#[test]
fn test_contains_value() {
    let mut map = AssociativeMap::new();
    map.put(1u32, "one");
    map.put(2u32, "two");

    assert!(map.contains_value(&"two"));
    assert!(!map.contains_value(&"three"));
}

#[test]
fn test_clear() {
    let mut map = AssociativeMap::new();
    for i in 0..50u32 {
        map.put(i, i);
    }
    let buckets = map.bucket_count();

    map.clear();

    assert!(map.is_empty());
    assert_eq!(map.get(&3), None);
    assert_eq!(map.bucket_count(), buckets);
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_grows_at_load_factor_threshold() {
    let mut map = AssociativeMap::with_capacity(11);

    // threshold = floor(11 * 0.75) = 8
    for i in 0..8u32 {
        map.put(i, i);
    }
    assert_eq!(map.bucket_count(), 11);

    map.put(8u32, 8u32);
    assert_eq!(map.bucket_count(), 23);

    for i in 0..9u32 {
        assert_eq!(map.get(&i), Some(&i));
    }
}

#[test]
fn test_replacing_put_does_not_grow() {
    let mut map = AssociativeMap::with_capacity(11);
    for i in 0..8u32 {
        map.put(i, i);
    }

    map.put(3u32, 300u32);

    assert_eq!(map.bucket_count(), 11);
    assert_eq!(map.len(), 8);
}

#[test]
fn test_never_shrinks_on_remove() {
    let mut map = AssociativeMap::with_capacity(11);
    for i in 0..100u32 {
        map.put(i, i);
    }
    let grown = map.bucket_count();
    assert!(grown > 11);

    for i in 0..100u32 {
        map.remove(&i);
    }

    assert!(map.is_empty());
    assert_eq!(map.bucket_count(), grown);
}

#[test]
fn test_zero_capacity_is_one_bucket() {
    let mut map = AssociativeMap::with_capacity(0);
    assert_eq!(map.bucket_count(), 1);

    map.put("k", "v");
    assert_eq!(map.bucket_count(), 3);
    assert_eq!(map.get("k"), Some(&"v"));
}

#[test]
fn test_average_chain_length_stays_bounded() {
    let mut map = AssociativeMap::new();
    for i in 0..10_000u32 {
        map.put(i, ());
    }

    let ratio = map.len() as f64 / map.bucket_count() as f64;
    assert!(ratio <= 0.75 + f64::EPSILON, "load ratio {}", ratio);
}

#[test]
fn test_invalid_load_factor() {
    for load_factor in [0.0f32, -1.0, f32::NAN, f32::INFINITY] {
        let result = AssociativeMap::<u32, u32>::with_capacity_and_load_factor(11, load_factor);
        assert!(matches!(result, Err(RmsError::Config(_))));
    }
}

#[test]
fn test_custom_load_factor() {
    let mut map = AssociativeMap::with_capacity_and_load_factor(4, 2.0).unwrap();

    // threshold = 8; chains may reach two entries per bucket before growth
    for i in 0..8u32 {
        map.put(i, i);
    }
    assert_eq!(map.bucket_count(), 4);

    map.put(8u32, 8u32);
    assert_eq!(map.bucket_count(), 9);
}

// =============================================================================
// Collision Tests
// =============================================================================

#[test]
fn test_full_collision_chain() {
    let mut map = colliding_map();
    for i in 0..200u32 {
        map.put(i, i + 1000);
    }

    assert_eq!(map.len(), 200);
    for i in 0..200u32 {
        assert_eq!(map.get(&i), Some(&(i + 1000)));
    }
}

#[test]
fn test_remove_from_middle_of_chain() {
    let mut map = colliding_map();
    for i in 0..10u32 {
        map.put(i, i);
    }

    assert_eq!(map.remove(&5), Some(5));
    assert_eq!(map.remove(&0), Some(0));
    assert_eq!(map.remove(&9), Some(9));

    assert_eq!(map.len(), 7);
    for i in [1u32, 2, 3, 4, 6, 7, 8] {
        assert_eq!(map.get(&i), Some(&i));
    }
    for i in [0u32, 5, 9] {
        assert_eq!(map.get(&i), None);
    }
}

#[test]
fn test_replace_inside_chain() {
    let mut map = colliding_map();
    map.put("a", 1);
    map.put("b", 2);
    map.put("c", 3);

    assert_eq!(map.put("b", 20), Some(2));
    assert_eq!(map.len(), 3);
    assert_eq!(map.get("b"), Some(&20));
}

// =============================================================================
// Enumeration Tests
// =============================================================================

#[test]
fn test_keys_and_values() {
    let mut map = AssociativeMap::new();
    for i in 0..30u32 {
        map.put(i, i * 10);
    }

    let mut keys: Vec<u32> = map.keys().copied().collect();
    keys.sort();
    assert_eq!(keys, (0..30).collect::<Vec<_>>());

    let mut values: Vec<u32> = map.values().copied().collect();
    values.sort();
    assert_eq!(values, (0..30).map(|i| i * 10).collect::<Vec<_>>());
}

#[test]
fn test_iter_pairs_match() {
    let mut map = AssociativeMap::new();
    for i in 0..25u32 {
        map.put(i, i + 1);
    }

    let iter = map.iter();
    assert_eq!(iter.len(), 25);

    for (key, value) in &map {
        assert_eq!(*value, *key + 1);
    }
}

#[test]
fn test_enumeration_is_one_shot() {
    let mut map = AssociativeMap::new();
    map.put(1u32, 1u32);
    map.put(2u32, 2u32);

    let mut keys = map.keys();
    assert!(keys.next().is_some());
    assert!(keys.next().is_some());
    assert!(keys.next().is_none());
    assert!(keys.next().is_none());
}

#[test]
fn test_empty_enumeration() {
    let map: AssociativeMap<u32, u32> = AssociativeMap::new();

    assert_eq!(map.keys().count(), 0);
    assert_eq!(map.values().count(), 0);
}

#[test]
fn test_debug_format() {
    let mut map = AssociativeMap::new();
    map.put("key", 1);

    assert_eq!(format!("{:?}", map), r#"{"key": 1}"#);
}
