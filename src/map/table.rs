//! AssociativeMap implementation
//!
//! Chained buckets of boxed entries, rehashed in place on growth.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::error::{Result, RmsError};

use super::iter::{Iter, Keys, Values};
use super::{DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};

/// Head of a bucket chain (or the tail link of an entry)
pub(super) type Link<K, V> = Option<Box<Entry<K, V>>>;

/// A single chained entry
pub(super) struct Entry<K, V> {
    /// Full hash of the key (cached so growth never rehashes keys)
    pub(super) hash: u64,
    pub(super) key: K,
    pub(super) value: V,
    pub(super) next: Link<K, V>,
}

impl<K, V> Entry<K, V> {
    fn matches<Q>(&self, hash: u64, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.hash == hash && <K as Borrow<Q>>::borrow(&self.key) == key
    }
}

/// Separate-chaining hash map
///
/// `size` always equals the number of distinct keys present. The bucket
/// array grows once `len >= load_factor * bucket_count` and never shrinks.
pub struct AssociativeMap<K, V, S = RandomState> {
    /// Bucket array; each slot owns its chain
    buckets: Vec<Link<K, V>>,
    /// Number of distinct keys
    len: usize,
    /// Growth trigger: floor(bucket_count * load_factor)
    threshold: usize,
    load_factor: f32,
    hasher: S,
}

impl<K, V> AssociativeMap<K, V, RandomState> {
    /// Create an empty map with 11 buckets and a 0.75 load factor
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty map with the given bucket count (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(capacity, DEFAULT_LOAD_FACTOR, RandomState::new())
    }

    /// Create an empty map with an explicit load factor
    ///
    /// Fails with `Config` unless the load factor is finite and positive.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        Self::with_capacity_load_factor_and_hasher(capacity, load_factor, RandomState::new())
    }
}

impl<K, V> Default for AssociativeMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> AssociativeMap<K, V, S> {
    /// Create an empty map using the given hash builder
    pub fn with_capacity_load_factor_and_hasher(
        capacity: usize,
        load_factor: f32,
        hasher: S,
    ) -> Result<Self> {
        if !load_factor.is_finite() || load_factor <= 0.0 {
            return Err(RmsError::Config(format!(
                "Illegal load factor: {}",
                load_factor
            )));
        }
        Ok(Self::build(capacity, load_factor, hasher))
    }

    fn build(capacity: usize, load_factor: f32, hasher: S) -> Self {
        let bucket_count = capacity.max(1);
        Self {
            buckets: empty_buckets(bucket_count),
            len: 0,
            threshold: threshold_for(bucket_count, load_factor),
            load_factor,
            hasher,
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current length of the bucket array
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Remove every entry, keeping the current bucket array
    pub fn clear(&mut self) {
        // Unlink chains iteratively so long chains never recurse in Drop
        for slot in self.buckets.iter_mut() {
            let mut link = slot.take();
            while let Some(mut entry) = link {
                link = entry.next.take();
            }
        }
        self.len = 0;
    }

    /// Iterate over `(key, value)` pairs of the current bucket array
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.buckets, self.len)
    }

    /// Iterate over keys
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    /// Iterate over values
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Check whether any key maps to `value` (linear scan)
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    fn index_for(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Grow to `2n + 1` buckets and relink every entry by its cached hash
    fn rehash(&mut self) {
        let new_count = self.buckets.len() * 2 + 1;
        let mut new_buckets = empty_buckets(new_count);

        for slot in self.buckets.iter_mut() {
            let mut link = slot.take();
            while let Some(mut entry) = link {
                link = entry.next.take();
                let index = (entry.hash % new_count as u64) as usize;
                entry.next = new_buckets[index].take();
                new_buckets[index] = Some(entry);
            }
        }

        self.buckets = new_buckets;
        self.threshold = threshold_for(new_count, self.load_factor);
    }
}

impl<K, V, S> AssociativeMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Insert or replace; returns the previous value for `key`, if any
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hasher.hash_one(&key);
        let index = self.index_for(hash);

        let mut link = self.buckets[index].as_deref_mut();
        while let Some(entry) = link {
            if entry.matches(hash, &key) {
                return Some(std::mem::replace(&mut entry.value, value));
            }
            link = entry.next.as_deref_mut();
        }

        if self.len >= self.threshold {
            self.rehash();
        }

        let index = self.index_for(hash);
        let next = self.buckets[index].take();
        self.buckets[index] = Some(Box::new(Entry {
            hash,
            key,
            value,
            next,
        }));
        self.len += 1;
        None
    }

    /// Look up the value for `key`
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let mut link = self.buckets[self.index_for(hash)].as_deref();
        while let Some(entry) = link {
            if entry.matches(hash, key) {
                return Some(&entry.value);
            }
            link = entry.next.as_deref();
        }
        None
    }

    /// Look up the value for `key` mutably
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let index = self.index_for(hash);
        let mut link = self.buckets[index].as_deref_mut();
        while let Some(entry) = link {
            if entry.matches(hash, key) {
                return Some(&mut entry.value);
            }
            link = entry.next.as_deref_mut();
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Remove `key`; returns its value if it was present
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let index = self.index_for(hash);

        let mut link = &mut self.buckets[index];
        while link.as_ref().is_some_and(|entry| !entry.matches(hash, key)) {
            link = &mut link.as_mut()?.next;
        }

        let mut removed = link.take()?;
        *link = removed.next.take();
        self.len -= 1;
        Some(removed.value)
    }
}

impl<K, V, S> Drop for AssociativeMap<K, V, S> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for AssociativeMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S> IntoIterator for &'a AssociativeMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn empty_buckets<K, V>(count: usize) -> Vec<Link<K, V>> {
    let mut buckets = Vec::with_capacity(count);
    buckets.resize_with(count, || None);
    buckets
}

fn threshold_for(bucket_count: usize, load_factor: f32) -> usize {
    (bucket_count as f64 * load_factor as f64) as usize
}
