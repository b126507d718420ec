//! Item handles: cached `(bucket, slot)` positions packed into one `u64`.

use core::fmt;

/// Physical position of an entry inside a [`HashTable`](crate::HashTable).
///
/// A handle obtained from `find_id` or `create_id` lets later lookups skip
/// hashing entirely. Handles carry no generation: once the slot they name
/// is freed and reused by a later insertion into the same bucket, the old
/// handle resolves to the new occupant.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ItemHandle(u64);

impl ItemHandle {
    /// Returned by lookups that found nothing.
    pub const NOT_FOUND: ItemHandle = ItemHandle(u64::MAX);

    pub(crate) const fn new(bucket: u32, slot: u32) -> Self {
        ItemHandle(((bucket as u64) << 32) | slot as u64)
    }

    /// Bucket index, or `u32::MAX` for [`NOT_FOUND`](Self::NOT_FOUND).
    pub const fn bucket(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Slot index within the bucket.
    pub const fn slot(self) -> u32 {
        self.0 as u32
    }

    pub const fn is_found(self) -> bool {
        self.0 != Self::NOT_FOUND.0
    }

    /// Packed representation, suitable for compact storage.
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    pub const fn from_bits(bits: u64) -> Self {
        ItemHandle(bits)
    }
}

impl Default for ItemHandle {
    fn default() -> Self {
        Self::NOT_FOUND
    }
}

impl fmt::Debug for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_found() {
            f.debug_struct("ItemHandle")
                .field("bucket", &self.bucket())
                .field("slot", &self.slot())
                .finish()
        } else {
            f.write_str("ItemHandle::NOT_FOUND")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_bucket_high_and_slot_low() {
        let h = ItemHandle::new(0x1234, 0x56);
        assert_eq!(h.to_bits(), 0x0000_1234_0000_0056);
        assert_eq!(h.bucket(), 0x1234);
        assert_eq!(h.slot(), 0x56);
        assert!(h.is_found());
        assert_eq!(ItemHandle::from_bits(h.to_bits()), h);
    }

    #[test]
    fn sentinel_is_distinct_from_every_reachable_position() {
        // The largest bucket index a table can have is u32::MAX - 1.
        let last = ItemHandle::new(u32::MAX - 1, 63);
        assert_ne!(last, ItemHandle::NOT_FOUND);
        assert!(!ItemHandle::NOT_FOUND.is_found());
        assert_eq!(ItemHandle::default(), ItemHandle::NOT_FOUND);
    }

    #[test]
    fn debug_output_names_sentinel() {
        assert_eq!(format!("{:?}", ItemHandle::NOT_FOUND), "ItemHandle::NOT_FOUND");
        assert_eq!(
            format!("{:?}", ItemHandle::new(2, 1)),
            "ItemHandle { bucket: 2, slot: 1 }"
        );
    }
}
