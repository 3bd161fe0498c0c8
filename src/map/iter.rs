//! Enumerators over an AssociativeMap
//!
//! Each enumerator walks the bucket array it was created over, last bucket
//! first, following every chain. The borrow on the map keeps it from being
//! mutated while an enumeration is alive.

use std::iter::FusedIterator;

use super::table::{Entry, Link};

/// Iterator over `(key, value)` pairs
pub struct Iter<'a, K, V> {
    buckets: &'a [Link<K, V>],
    /// Buckets below this index are still to be visited
    index: usize,
    /// Next entry of the chain currently being walked
    entry: Option<&'a Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(buckets: &'a [Link<K, V>], len: usize) -> Self {
        Self {
            buckets,
            index: buckets.len(),
            entry: None,
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.entry {
                self.entry = entry.next.as_deref();
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&entry.key, &entry.value));
            }
            if self.index == 0 {
                return None;
            }
            self.index -= 1;
            self.entry = self.buckets[self.index].as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over keys
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(super) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over values
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(super) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}
