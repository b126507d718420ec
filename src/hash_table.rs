//! HashTable: fixed bucket array, per-bucket slot arrays, cacheable handles.

use crate::alloc::{SlotAllocator, SystemAllocator};
use crate::bucket::{Bucket, BucketStats, Placement};
use crate::builder::{Builder, DEFAULT_BUCKET_COUNT};
use crate::error::Error;
use crate::handle::ItemHandle;
use crate::reentrancy::DebugReentrancy;
use crate::report::{ErrorReporter, LogReporter};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use std::collections::BTreeSet;

/// A hash table with a bucket count fixed at construction.
///
/// Keys are routed to `hash(key) % bucket_count`; each bucket keeps its own
/// slot array of up to 64 entries. The table never rehashes. Insertion is
/// refused once the number of live entries equals the bucket count, and a
/// single bucket refuses a 65th simultaneous entry.
///
/// Duplicate keys are allowed. Each `create` adds an independent entry and
/// keyed lookups return the live entry in the lowest slot of its bucket.
pub struct HashTable<
    K,
    V,
    S = DefaultHashBuilder,
    A: SlotAllocator = SystemAllocator,
    R = LogReporter,
> {
    buckets: Box<[Bucket<K, V>]>,
    bucket_count: u32,
    live_entry_count: usize,
    // Every bucket that has ever been populated, ascending. Walked on drop.
    occupied: BTreeSet<u32>,
    hasher: S,
    allocator: A,
    reporter: R,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashTable<K, V>
where
    K: Eq + Hash,
{
    /// Create a table with `bucket_count` buckets and the default hasher.
    pub fn new(bucket_count: usize) -> Result<Self, Error> {
        Self::with_hasher(bucket_count, Default::default())
    }

    /// Shorthand for [`Builder::new`].
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::from_valid_parts(
            DEFAULT_BUCKET_COUNT as u32,
            Default::default(),
            SystemAllocator,
            LogReporter,
        )
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(bucket_count: usize, hasher: S) -> Result<Self, Error> {
        Self::from_parts(bucket_count, hasher, SystemAllocator, LogReporter)
    }
}

impl<K, V, S, A: SlotAllocator, R> HashTable<K, V, S, A, R> {
    pub(crate) fn from_parts(
        bucket_count: usize,
        hasher: S,
        allocator: A,
        reporter: R,
    ) -> Result<Self, Error> {
        if bucket_count == 0 {
            return Err(Error::ZeroBuckets);
        }
        let count = u32::try_from(bucket_count).map_err(|_| Error::TooManyBuckets(bucket_count))?;
        Ok(Self::from_valid_parts(count, hasher, allocator, reporter))
    }

    fn from_valid_parts(bucket_count: u32, hasher: S, allocator: A, reporter: R) -> Self {
        tracing::debug!(bucket_count, "creating hash table");
        Self {
            buckets: (0..bucket_count).map(|_| Bucket::new()).collect(),
            bucket_count,
            live_entry_count: 0,
            occupied: BTreeSet::new(),
            hasher,
            allocator,
            reporter,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of buckets, fixed for the table's lifetime. This is also the
    /// maximum number of live entries.
    pub fn bucket_count(&self) -> usize {
        self.bucket_count as usize
    }

    /// Number of entries currently stored.
    pub fn live_entry_count(&self) -> usize {
        self.live_entry_count
    }

    pub fn len(&self) -> usize {
        self.live_entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.live_entry_count == 0
    }

    /// Live entries divided by bucket count.
    pub fn load_factor(&self) -> f64 {
        self.live_entry_count as f64 / f64::from(self.bucket_count)
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Storage snapshot for one bucket, or `None` if `bucket` is out of range.
    pub fn bucket_stats(&self, bucket: u32) -> Option<BucketStats> {
        self.buckets.get(bucket as usize).map(Bucket::stats)
    }

    /// Buckets visited at teardown, in visiting order.
    #[cfg(test)]
    pub(crate) fn occupied_buckets(&self) -> Vec<u32> {
        self.occupied.iter().copied().collect()
    }

    /// Key stored at `handle`, if the slot is live.
    pub fn key_by_id(&self, handle: ItemHandle) -> Option<&K> {
        let _g = self.reentrancy.enter();
        self.slot(handle).map(|(k, _)| k)
    }

    /// Item stored at `handle`, if the slot is live.
    ///
    /// No hashing takes place. A handle whose slot was freed and then reused
    /// returns the new occupant.
    pub fn get_by_id(&self, handle: ItemHandle) -> Option<&V> {
        let _g = self.reentrancy.enter();
        self.slot(handle).map(|(_, v)| v)
    }

    pub fn get_by_id_mut(&mut self, handle: ItemHandle) -> Option<&mut V> {
        let _g = self.reentrancy.enter();
        self.buckets
            .get_mut(handle.bucket() as usize)?
            .get_mut(handle.slot() as usize)
            .map(|(_, v)| v)
    }

    /// Remove the entry at `handle` and return it.
    pub fn remove_by_id(&mut self, handle: ItemHandle) -> Option<(K, V)> {
        let _g = self.reentrancy.enter();
        let pair = self
            .buckets
            .get_mut(handle.bucket() as usize)?
            .take(handle.slot() as usize)?;
        self.live_entry_count -= 1;
        tracing::trace!(bucket = handle.bucket(), slot = handle.slot(), "slot freed");
        Some(pair)
    }

    fn slot(&self, handle: ItemHandle) -> Option<&(K, V)> {
        self.buckets
            .get(handle.bucket() as usize)?
            .get(handle.slot() as usize)
    }
}

impl<K, V, S, A, R> HashTable<K, V, S, A, R>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: SlotAllocator,
    R: ErrorReporter,
{
    fn bucket_index<Q>(&self, q: &Q) -> u32
    where
        Q: ?Sized + Hash,
    {
        (self.hasher.hash_one(q) % u64::from(self.bucket_count)) as u32
    }

    fn locate<Q>(&self, q: &Q) -> Option<(u32, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.bucket_index(q);
        let slot = self.buckets[index as usize].find(q)?;
        Some((index, slot))
    }

    /// Insert `(key, item)` and return a reference to the stored item.
    ///
    /// An equal key already in the table is not replaced; both entries are
    /// kept. On failure the error is passed to the table's reporter and then
    /// returned.
    pub fn create(&mut self, key: K, item: V) -> Result<&mut V, Error> {
        self.place(key, item).map(|(_, stored)| stored)
    }

    /// Insert `(key, item)` and return the handle of its slot.
    pub fn create_id(&mut self, key: K, item: V) -> Result<ItemHandle, Error> {
        self.place(key, item).map(|(handle, _)| handle)
    }

    fn place(&mut self, key: K, item: V) -> Result<(ItemHandle, &mut V), Error> {
        let guard = self.reentrancy.enter();
        if self.live_entry_count == self.bucket_count as usize {
            let e = Error::CapacityExhausted {
                bucket_count: self.bucket_count,
            };
            drop(guard);
            self.reporter.report(&e);
            return Err(e);
        }
        let index = self.bucket_index(&key);
        match self.buckets[index as usize].insert(index, &mut self.allocator, key, item) {
            Ok((slot, placement, stored)) => {
                match placement {
                    Placement::Fresh => {
                        let linked = self.occupied.insert(index);
                        debug_assert!(linked, "bucket {index} populated twice");
                        tracing::debug!(bucket = index, "bucket populated");
                    }
                    Placement::Grown(capacity) => {
                        tracing::debug!(bucket = index, capacity, "bucket grown");
                    }
                    Placement::Reused => tracing::trace!(bucket = index, slot, "slot reused"),
                    Placement::Appended => {}
                }
                self.live_entry_count += 1;
                Ok((ItemHandle::new(index, slot as u32), stored))
            }
            // Reported with the guard released so the reporter sees a
            // consistent table.
            Err(e) => {
                drop(guard);
                self.reporter.report(&e);
                Err(e)
            }
        }
    }

    /// Handle of the first live entry whose key equals `q`, or
    /// [`ItemHandle::NOT_FOUND`].
    pub fn find_id<Q>(&self, q: &Q) -> ItemHandle
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        match self.locate(q) {
            Some((bucket, slot)) => ItemHandle::new(bucket, slot as u32),
            None => ItemHandle::NOT_FOUND,
        }
    }

    pub fn find_item<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (bucket, slot) = self.locate(q)?;
        self.buckets[bucket as usize].get(slot).map(|(_, v)| v)
    }

    pub fn find_item_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (bucket, slot) = self.locate(q)?;
        self.buckets[bucket as usize].get_mut(slot).map(|(_, v)| v)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).is_some()
    }

    /// Remove the first live entry whose key equals `q`. Does nothing if
    /// there is none. With duplicates, repeated calls remove them one at a
    /// time, lowest slot first.
    pub fn destroy_item<Q>(&mut self, q: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = {
            let _g = self.reentrancy.enter();
            let (bucket, slot) = match self.locate(q) {
                Some(found) => found,
                None => return,
            };
            let pair = self.buckets[bucket as usize].take(slot);
            debug_assert!(pair.is_some());
            self.live_entry_count -= 1;
            tracing::trace!(bucket, slot, "slot freed");
            pair
        };
        // Key and item are dropped here, with the table consistent again.
        drop(removed);
    }
}

impl<K, V, S, A: SlotAllocator, R> Drop for HashTable<K, V, S, A, R> {
    fn drop(&mut self) {
        for &index in &self.occupied {
            self.buckets[index as usize].release(&mut self.allocator);
        }
    }
}

impl<K, V, S, A: SlotAllocator, R> fmt::Debug for HashTable<K, V, S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("bucket_count", &self.bucket_count)
            .field("live_entry_count", &self.live_entry_count)
            .field("occupied_buckets", &self.occupied.len())
            .finish_non_exhaustive()
    }
}
