//! Physical storage: a power-of-two array of chains.
//!
//! Pure storage with indexed access; growth and shrink decisions live in the
//! table layer. Each entry carries its mapped key so a rehash never has to
//! re-invoke the caller's hasher.

use alloc::vec;
use alloc::vec::Vec;
use core::slice;

/// A single chained entry: the cached mapped key plus the owned pair.
#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) mapped: u32,
    pub(crate) key: K,
    pub(crate) value: V,
}

/// An ordered chain of entries sharing a bucket index.
pub(crate) type Bucket<K, V> = Vec<Entry<K, V>>;

/// A fixed-size array of buckets. The count is always a power of two so the
/// hashing layer can reduce with a mask.
#[derive(Clone, Debug)]
pub(crate) struct BucketStore<K, V> {
    buckets: Vec<Bucket<K, V>>,
}

impl<K, V> BucketStore<K, V> {
    pub(crate) fn with_buckets(count: usize) -> Self {
        debug_assert!(count.is_power_of_two());
        let mut buckets = Vec::with_capacity(count);
        buckets.resize_with(count, Vec::new);
        Self { buckets }
    }

    #[inline(always)]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline(always)]
    pub(crate) fn bucket(&self, index: usize) -> &Bucket<K, V> {
        &self.buckets[index]
    }

    #[inline(always)]
    pub(crate) fn bucket_mut(&mut self, index: usize) -> &mut Bucket<K, V> {
        &mut self.buckets[index]
    }

    /// Empties every chain without changing the bucket count.
    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Borrowing iterator over every live entry, bucket by bucket.
    pub(crate) fn entries(&self) -> Entries<'_, K, V> {
        Entries {
            outer: self.buckets.iter(),
            inner: [].iter(),
        }
    }

    /// Consumes the store, yielding every live entry.
    pub(crate) fn into_entries(self) -> IntoEntries<K, V> {
        IntoEntries {
            outer: self.buckets.into_iter(),
            inner: Vec::new().into_iter(),
        }
    }
}

pub(crate) struct Entries<'a, K, V> {
    outer: slice::Iter<'a, Bucket<K, V>>,
    inner: slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.inner.next() {
                return Some(entry);
            }
            self.inner = self.outer.next()?.iter();
        }
    }
}

pub(crate) struct IntoEntries<K, V> {
    outer: vec::IntoIter<Bucket<K, V>>,
    inner: vec::IntoIter<Entry<K, V>>,
}

impl<K, V> Iterator for IntoEntries<K, V> {
    type Item = Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.inner.next() {
                return Some(entry);
            }
            self.inner = self.outer.next()?.into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mapped: u32, key: u32, value: &'static str) -> Entry<u32, &'static str> {
        Entry { mapped, key, value }
    }

    #[test]
    fn starts_empty_with_requested_buckets() {
        let store: BucketStore<u32, ()> = BucketStore::with_buckets(8);
        assert_eq!(store.bucket_count(), 8);
        assert_eq!(store.entries().count(), 0);
    }

    #[test]
    fn chains_preserve_insertion_order() {
        let mut store = BucketStore::with_buckets(4);
        store.bucket_mut(2).push(entry(2, 1, "one"));
        store.bucket_mut(2).push(entry(2, 2, "two"));
        store.bucket_mut(2).push(entry(2, 3, "three"));

        let keys: alloc::vec::Vec<u32> = store.bucket(2).iter().map(|e| e.key).collect();
        assert_eq!(keys, [1, 2, 3]);

        // Removing the middle entry leaves the rest in relative order.
        store.bucket_mut(2).remove(1);
        let keys: alloc::vec::Vec<u32> = store.bucket(2).iter().map(|e| e.key).collect();
        assert_eq!(keys, [1, 3]);
    }

    #[test]
    fn entry_iteration_visits_every_bucket() {
        let mut store = BucketStore::with_buckets(4);
        store.bucket_mut(0).push(entry(0, 10, "a"));
        store.bucket_mut(3).push(entry(3, 11, "b"));
        store.bucket_mut(3).push(entry(3, 12, "c"));

        assert_eq!(store.entries().count(), 3);

        let mut owned: alloc::vec::Vec<u32> = store.into_entries().map(|e| e.key).collect();
        owned.sort_unstable();
        assert_eq!(owned, [10, 11, 12]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut store = BucketStore::with_buckets(2);
        store.bucket_mut(0).push(entry(0, 1, "x"));
        store.clear();
        assert_eq!(store.bucket_count(), 2);
        assert_eq!(store.entries().count(), 0);
    }
}
