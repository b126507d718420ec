//! Bucket: one growable slot array plus a 64-bit occupancy mask.
//!
//! Slot `i` holds a live entry iff bit `i` of `occupancy` is set; the slot
//! itself is `Some` exactly when its bit is set. `slots.len()` is the
//! high-water mark (`slot_count`) and never shrinks on removal, so freed
//! slots below it are reused lowest-first before the array grows again.
//!
//! Storage is provided by the table's [`SlotAllocator`]: the first
//! insertion allocates room for [`INITIAL_BUCKET_SLOTS`], every overflow
//! after that reallocates to exactly one more slot. Linear growth keeps
//! per-bucket overhead small when the hash spreads keys well; a bucket that
//! takes `n` colliding keys pays O(n^2) in moves instead.

use crate::alloc::SlotAllocator;
use crate::error::Error;
use core::borrow::Borrow;

/// Slots allocated the first time a bucket receives an entry.
pub const INITIAL_BUCKET_SLOTS: usize = 3;

/// Hard per-bucket ceiling, set by the width of the occupancy mask.
pub const MAX_BUCKET_SLOTS: usize = u64::BITS as usize;

/// Snapshot of one bucket's storage, see [`HashTable::bucket_stats`](crate::HashTable::bucket_stats).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BucketStats {
    /// Slots the bucket can hold before the next reallocation.
    pub slot_capacity: usize,
    /// Highest slot index ever used, plus one.
    pub slot_count: usize,
    /// Slots currently holding an entry.
    pub live: usize,
    /// Raw occupancy mask.
    pub occupancy: u64,
}

/// How an insertion obtained its slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Placement {
    /// First entry ever; the bucket's storage was just allocated.
    Fresh,
    /// A previously freed slot below the high-water mark.
    Reused,
    /// Spare capacity past the high-water mark, no reallocation.
    Appended,
    /// Storage was reallocated to the contained capacity.
    Grown(usize),
}

#[derive(Debug)]
pub(crate) struct Bucket<K, V> {
    slots: Vec<Option<(K, V)>>,
    slot_capacity: usize,
    occupancy: u64,
}

#[inline]
fn bit(slot: usize) -> u64 {
    1u64 << slot
}

#[inline]
fn low_mask(len: usize) -> u64 {
    if len >= MAX_BUCKET_SLOTS {
        u64::MAX
    } else {
        bit(len) - 1
    }
}

impl<K, V> Bucket<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            slot_capacity: 0,
            occupancy: 0,
        }
    }

    pub(crate) fn stats(&self) -> BucketStats {
        BucketStats {
            slot_capacity: self.slot_capacity,
            slot_count: self.slots.len(),
            live: self.occupancy.count_ones() as usize,
            occupancy: self.occupancy,
        }
    }

    #[inline]
    pub(crate) fn is_occupied(&self, slot: usize) -> bool {
        slot < self.slots.len() && self.occupancy & bit(slot) != 0
    }

    /// Lowest freed slot below the high-water mark.
    fn free_slot(&self) -> Option<usize> {
        let free = !self.occupancy & low_mask(self.slots.len());
        (free != 0).then(|| free.trailing_zeros() as usize)
    }

    /// Store `(key, value)` in this bucket and return the slot used together
    /// with the stored value.
    ///
    /// `index` is only used to label errors. On error the bucket is left as
    /// it was and the pair is dropped.
    pub(crate) fn insert<A: SlotAllocator>(
        &mut self,
        index: u32,
        alloc: &mut A,
        key: K,
        value: V,
    ) -> Result<(usize, Placement, &mut V), Error> {
        let (slot, placement) = if self.slot_capacity == 0 {
            alloc.allocate(&mut self.slots, INITIAL_BUCKET_SLOTS)?;
            self.slot_capacity = INITIAL_BUCKET_SLOTS;
            self.slots.push(None);
            (0, Placement::Fresh)
        } else if let Some(slot) = self.free_slot() {
            debug_assert!(self.slots[slot].is_none());
            (slot, Placement::Reused)
        } else {
            let placement = if self.slots.len() < self.slot_capacity {
                Placement::Appended
            } else {
                let grown = self.slot_capacity + 1;
                if grown > MAX_BUCKET_SLOTS {
                    return Err(Error::BucketFull { bucket: index });
                }
                alloc.reallocate(&mut self.slots, grown)?;
                self.slot_capacity = grown;
                Placement::Grown(grown)
            };
            self.slots.push(None);
            (self.slots.len() - 1, placement)
        };
        self.occupancy |= bit(slot);
        let (_, stored) = self.slots[slot].insert((key, value));
        Ok((slot, placement, stored))
    }

    /// Index of the first live slot whose key equals `q`, scanning upward.
    pub(crate) fn find<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut live = self.occupancy;
        while live != 0 {
            let slot = live.trailing_zeros() as usize;
            live &= live - 1;
            if let Some((k, _)) = &self.slots[slot] {
                if k.borrow() == q {
                    return Some(slot);
                }
            }
        }
        None
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&(K, V)> {
        if !self.is_occupied(slot) {
            return None;
        }
        self.slots[slot].as_ref()
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut (K, V)> {
        if !self.is_occupied(slot) {
            return None;
        }
        self.slots[slot].as_mut()
    }

    /// Vacate `slot` and hand back its pair. The slot stays allocated and
    /// becomes the first candidate for reuse if it is the lowest free one.
    pub(crate) fn take(&mut self, slot: usize) -> Option<(K, V)> {
        if !self.is_occupied(slot) {
            return None;
        }
        self.occupancy &= !bit(slot);
        self.slots[slot].take()
    }

    /// Return the storage to `alloc`, dropping whatever is still live.
    pub(crate) fn release<A: SlotAllocator>(&mut self, alloc: &mut A) {
        alloc.release(&mut self.slots);
        self.slot_capacity = 0;
        self.occupancy = 0;
    }
}
