//! Module `bucket` implements the overflow container installed at a model
//! node slot once more than one key predicts that position.
//!
//! Grounded on `examples/original_source/src/afli_para/bucket.h` and
//! `bucket_impl.h`. The original guards its backing array with a raw
//! `cmpxchgb`-based spinlock scoped entirely within each method body; here
//! that role is played by the crate's own [`crate::util::Spinlock`], since
//! a bucket's critical sections never cross a thread boundary (unlike the
//! node-slot lock in [`crate::slot`], which is held by a foreground
//! inserter until a background task finishes rebuilding it).

use crate::key::IndexKey;
use crate::util::Spinlock;

/// A small, linearly-searched overflow container keyed on first-match.
///
/// `capacity` mirrors `hyper_para.max_bucket_size` from the original:
/// once `insert` brings the bucket to `capacity` entries, the caller must
/// trigger a rebuild of the owning slot -- the bucket itself never grows
/// past it.
pub struct Bucket<K, V> {
    capacity: usize,
    items: Spinlock<Vec<(K, V)>>,
}

impl<K, V> Bucket<K, V>
where
    K: IndexKey,
    V: Clone,
{
    pub fn new(items: Vec<(K, V)>, capacity: usize) -> Bucket<K, V> {
        debug_assert!(items.len() <= capacity);
        Bucket {
            capacity,
            items: Spinlock::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, key: K) -> Option<V> {
        let items = self.items.read();
        items
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn update(&self, key: K, value: V) -> bool {
        let mut items = self.items.write();
        match items.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, key: K) -> bool {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|(k, _)| *k != key);
        items.len() != before
    }

    /// Insert `(key, value)`. Returns `true` if the bucket has now reached
    /// `capacity` and the owning slot must be handed off for a rebuild.
    pub fn insert(&self, key: K, value: V) -> bool {
        let mut items = self.items.write();
        items.push((key, value));
        items.len() >= self.capacity
    }

    /// A snapshot of this bucket's contents, consumed by a background
    /// rebuild. Mirrors `Bucket::copy` in the original.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.items.read().clone()
    }
}

#[cfg(test)]
#[path = "bucket_test.rs"]
mod bucket_test;
