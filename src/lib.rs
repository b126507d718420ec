//! bucket-table: a fixed-bucket-count, chained hash table that manages its
//! own per-bucket slot storage and hands out cacheable item handles.
//!
//! Internal Design:
//!
//! Summary
//! - `HashTable<K, V, S, A, R>` owns `bucket_count` buckets, fixed at
//!   construction. A key is routed to `hash(key) % bucket_count`; every
//!   keyed operation hashes exactly once and then works inside one bucket.
//! - A `Bucket` is a slot array plus a 64-bit occupancy mask. Freed slots
//!   are reused lowest-first; when none is free the array grows by exactly
//!   one slot (starting from 3).
//! - `ItemHandle` packs `(bucket, slot)` into a `u64` so a caller can skip
//!   hashing on later accesses.
//!
//! Constraints
//! - Single-threaded: no locks or atomics. The table is `!Sync`; wrap it in
//!   a `Mutex` to share it.
//! - No rehashing, ever. The number of live entries is capped at the bucket
//!   count, and a single bucket at 64 live entries.
//! - Duplicate keys are accepted as independent entries. Keyed lookups and
//!   removals see the one in the lowest live slot of the bucket.
//! - Handles are not generation-tagged. A handle to a freed slot resolves to
//!   nothing until the slot is reused, and then to the new occupant.
//!
//! Capabilities
//! - Hashing: `K: Hash` fed to a `BuildHasher` (default: hashbrown's).
//! - Storage: a `SlotAllocator` performs every allocation, growth and
//!   release of bucket storage. `CountingAllocator` makes those calls
//!   observable.
//! - Failures: insertion errors are returned as `Error` and also passed to
//!   the table's `ErrorReporter`. `LogReporter` (the default) logs through
//!   `tracing`; `PanicReporter` makes every failure fatal.
//!
//! Lifetimes
//! - Removing an entry drops its key and item right away. The slot's
//!   storage stays with the bucket.
//! - Bucket storage is released only when the table is dropped, walking
//!   the ascending set of buckets that were ever populated.
//! - Debug builds guard every entry point against reentrancy from `K: Hash`
//!   or `K: Eq`.

mod alloc;
mod bucket;
mod builder;
mod error;
mod handle;
mod hash_table;
mod hash_table_proptest;
mod reentrancy;
mod report;

pub use alloc::{CountingAllocator, SlotAllocator, SystemAllocator};
pub use bucket::{BucketStats, INITIAL_BUCKET_SLOTS, MAX_BUCKET_SLOTS};
pub use builder::{Builder, DEFAULT_BUCKET_COUNT};
pub use error::Error;
pub use handle::ItemHandle;
pub use hash_table::HashTable;
pub use report::{ErrorReporter, LogReporter, PanicReporter};
