//! Allocation capability for bucket slot arrays.
//!
//! Buckets never grow their `Vec` directly; every allocation, growth and
//! release goes through a [`SlotAllocator`]. This keeps the linear growth
//! policy observable: [`CountingAllocator`] records exactly how many times
//! a table allocated, reallocated and released bucket storage.

use std::collections::TryReserveError;

/// Raw storage operations used by buckets.
///
/// `capacity` is always the total number of slots the buffer must be able
/// to hold afterwards, never an increment. Elements already in `slots` are
/// preserved across `allocate` and `reallocate`.
pub trait SlotAllocator {
    /// Provide the first buffer for an empty, never-populated bucket.
    fn allocate<T>(&mut self, slots: &mut Vec<T>, capacity: usize) -> Result<(), TryReserveError>;

    /// Grow an existing buffer so it can hold `capacity` slots.
    fn reallocate<T>(&mut self, slots: &mut Vec<T>, capacity: usize)
        -> Result<(), TryReserveError>;

    /// Drop all elements and free the buffer.
    fn release<T>(&mut self, slots: &mut Vec<T>);
}

/// Allocator backed by the global allocator through `Vec::try_reserve_exact`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl SlotAllocator for SystemAllocator {
    fn allocate<T>(&mut self, slots: &mut Vec<T>, capacity: usize) -> Result<(), TryReserveError> {
        debug_assert!(slots.is_empty());
        slots.try_reserve_exact(capacity)
    }

    fn reallocate<T>(
        &mut self,
        slots: &mut Vec<T>,
        capacity: usize,
    ) -> Result<(), TryReserveError> {
        slots.try_reserve_exact(capacity.saturating_sub(slots.len()))
    }

    fn release<T>(&mut self, slots: &mut Vec<T>) {
        *slots = Vec::new();
    }
}

/// Wraps another allocator and counts calls to each operation.
#[derive(Clone, Debug, Default)]
pub struct CountingAllocator<A = SystemAllocator> {
    inner: A,
    allocations: usize,
    reallocations: usize,
    releases: usize,
}

impl<A> CountingAllocator<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            allocations: 0,
            reallocations: 0,
            releases: 0,
        }
    }

    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    pub fn releases(&self) -> usize {
        self.releases
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: SlotAllocator> SlotAllocator for CountingAllocator<A> {
    fn allocate<T>(&mut self, slots: &mut Vec<T>, capacity: usize) -> Result<(), TryReserveError> {
        self.allocations += 1;
        self.inner.allocate(slots, capacity)
    }

    fn reallocate<T>(
        &mut self,
        slots: &mut Vec<T>,
        capacity: usize,
    ) -> Result<(), TryReserveError> {
        self.reallocations += 1;
        self.inner.reallocate(slots, capacity)
    }

    fn release<T>(&mut self, slots: &mut Vec<T>) {
        self.releases += 1;
        self.inner.release(slots)
    }
}
