//! Error type shared by table construction and insertion.

use std::collections::TryReserveError;

/// Errors returned by [`HashTable`](crate::HashTable) construction and
/// insertion.
///
/// Lookups never fail with an error; a key or handle that does not resolve
/// to a live slot is reported as `None` or [`ItemHandle::NOT_FOUND`](crate::ItemHandle::NOT_FOUND).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A table must have at least one bucket.
    #[error("bucket count must be at least 1")]
    ZeroBuckets,

    /// Bucket indices are stored in 32 bits inside an item handle.
    #[error("bucket count {0} does not fit in a 32-bit bucket index")]
    TooManyBuckets(usize),

    /// The table already holds as many live entries as it has buckets.
    ///
    /// This is a global cap: it applies no matter how entries are
    /// distributed across buckets.
    #[error("table is full: {bucket_count} live entries for {bucket_count} buckets")]
    CapacityExhausted { bucket_count: u32 },

    /// The target bucket already uses every slot its 64-bit occupancy mask
    /// can describe.
    #[error("bucket {bucket} has no free slot and cannot grow past 64 slots")]
    BucketFull { bucket: u32 },

    /// The allocator could not grow a bucket's slot array.
    #[error("slot allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}
