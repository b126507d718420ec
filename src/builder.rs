//! Table configuration.

use crate::alloc::{SlotAllocator, SystemAllocator};
use crate::error::Error;
use crate::hash_table::HashTable;
use crate::report::LogReporter;
use hashbrown::hash_map::DefaultHashBuilder;

/// Bucket count used by [`Builder::new`] and `HashTable::default()`.
pub const DEFAULT_BUCKET_COUNT: usize = 1024;

/// Configures and builds a [`HashTable`].
///
/// ```
/// use bucket_table::{Builder, CountingAllocator, PanicReporter, SystemAllocator};
///
/// let mut table = Builder::new()
///     .bucket_count(64)
///     .allocator(CountingAllocator::new(SystemAllocator))
///     .reporter(PanicReporter)
///     .build::<&str, u32>()
///     .unwrap();
/// table.create("a", 1).unwrap();
/// assert_eq!(table.allocator().allocations(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Builder<S = DefaultHashBuilder, A = SystemAllocator, R = LogReporter> {
    bucket_count: usize,
    hasher: S,
    allocator: A,
    reporter: R,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            hasher: DefaultHashBuilder::default(),
            allocator: SystemAllocator,
            reporter: LogReporter,
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, R> Builder<S, A, R> {
    /// Number of buckets. Also the maximum number of live entries.
    pub fn bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn hasher<S2>(self, hasher: S2) -> Builder<S2, A, R> {
        Builder {
            bucket_count: self.bucket_count,
            hasher,
            allocator: self.allocator,
            reporter: self.reporter,
        }
    }

    pub fn allocator<A2: SlotAllocator>(self, allocator: A2) -> Builder<S, A2, R> {
        Builder {
            bucket_count: self.bucket_count,
            hasher: self.hasher,
            allocator,
            reporter: self.reporter,
        }
    }

    /// Where failed insertions are reported; see [`ErrorReporter`](crate::ErrorReporter).
    pub fn reporter<R2>(self, reporter: R2) -> Builder<S, A, R2> {
        Builder {
            bucket_count: self.bucket_count,
            hasher: self.hasher,
            allocator: self.allocator,
            reporter,
        }
    }

    /// Fails if the bucket count is zero or does not fit in 32 bits.
    pub fn build<K, V>(self) -> Result<HashTable<K, V, S, A, R>, Error>
    where
        A: SlotAllocator,
    {
        HashTable::from_parts(self.bucket_count, self.hasher, self.allocator, self.reporter)
    }
}
