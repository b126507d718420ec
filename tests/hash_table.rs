// HashTable integration suite.
//
// Each test documents what behavior is verified. Core invariants exercised:
// - Lookup parity: find_item(k) and get_by_id(find_id(k)) name the same slot.
// - Fixed capacity: live entries never exceed bucket_count; a bucket never
//   holds more than 64 entries.
// - Linear growth: a bucket grows 3, 4, 5, ... with one reallocation each.
// - Handle aliasing: a stale handle resolves to a later occupant of its slot.
// - Duplicates: independent entries, removed one at a time in slot order.
use bucket_table::{
    Builder, CountingAllocator, Error, HashTable, ItemHandle, PanicReporter, INITIAL_BUCKET_SLOTS,
    MAX_BUCKET_SLOTS,
};
use std::cell::RefCell;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

// Routes a u64 key to bucket `key % bucket_count`.
#[derive(Default)]
struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(b);
        }
    }
    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

type Identity = BuildHasherDefault<IdentityHasher>;

fn counted(buckets: usize) -> HashTable<u64, u64, Identity, CountingAllocator> {
    Builder::new()
        .bucket_count(buckets)
        .hasher(Identity::default())
        .allocator(CountingAllocator::default())
        .build()
        .expect("valid bucket count")
}

// Test: the basic keyed round trip on a 1024-bucket table.
// Verifies: contains/find_item/get_by_id agree, and destroy removes the key.
#[test]
fn create_lookup_destroy_1024() {
    let mut t: HashTable<i32, f64> = HashTable::new(1024).unwrap();
    t.create(3, 5.0).unwrap();
    assert!(t.contains(&3));
    assert_eq!(*t.find_item(&3).unwrap(), 5.0);
    assert_eq!(t.get_by_id(t.find_id(&3)), t.find_item(&3));
    t.destroy_item(&3);
    assert!(!t.contains(&3));
    assert_eq!(t.bucket_count(), 1024);
    assert_eq!(t.live_entry_count(), 0);
}

// Test: the pointer returned by create is the stored item.
// Verifies: writes through it are visible to later lookups.
#[test]
fn create_returns_stored_item() {
    let mut t: HashTable<String, Vec<u8>> = HashTable::new(16).unwrap();
    t.create("k".to_string(), vec![1]).unwrap().push(2);
    assert_eq!(t.find_item("k"), Some(&vec![1, 2]));
}

// Test: 64 keys colliding on one bucket fill it; the 65th fails.
// Assumes: the table has ample global capacity.
// Verifies: BucketFull error, live count unchanged, under PanicReporter the
// failure is fatal.
#[test]
fn sixty_four_collisions_then_bucket_full() {
    let mut t = counted(1024);
    for i in 0..MAX_BUCKET_SLOTS as u64 {
        t.create(42 + i * 1024, i).unwrap();
    }
    assert_eq!(
        t.create(42 + 64 * 1024, 0),
        Err(Error::BucketFull { bucket: 42 })
    );
    assert_eq!(t.len(), 64);
    assert!(t.load_factor() < 0.1);

    let mut fatal = Builder::new()
        .bucket_count(1024)
        .hasher(Identity::default())
        .reporter(PanicReporter)
        .build::<u64, ()>()
        .unwrap();
    for i in 0..64u64 {
        fatal.create(i * 1024, ()).unwrap();
    }
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = fatal.create(64 * 1024, ());
    }));
    assert!(res.is_err(), "PanicReporter must make bucket exhaustion fatal");
}

// Test: capacity and reallocation count while one bucket fills.
// Verifies: capacity 3,3,3,4,5,... and exactly one reallocation per step.
#[test]
fn bucket_grows_one_slot_per_reallocation() {
    let mut t = counted(1024);
    for n in 1..=20u64 {
        t.create((n - 1) * 1024, n).unwrap();
        let stats = t.bucket_stats(0).unwrap();
        let expected = (n as usize).max(INITIAL_BUCKET_SLOTS);
        assert_eq!(stats.slot_capacity, expected);
        assert_eq!(stats.slot_count, n as usize);
        assert_eq!(
            t.allocator().reallocations(),
            expected - INITIAL_BUCKET_SLOTS
        );
    }
    assert_eq!(t.allocator().allocations(), 1);
}

// Test: the global cap is bucket_count even with entries spread evenly.
// Verifies: CapacityExhausted once full; a destroy makes room again.
#[test]
fn global_cap_is_bucket_count() {
    let mut t = counted(8);
    for k in 0..8 {
        t.create(k, k).unwrap();
    }
    assert_eq!(t.load_factor(), 1.0);
    assert_eq!(
        t.create_id(100, 0),
        Err(Error::CapacityExhausted { bucket_count: 8 })
    );
    t.destroy_item(&3);
    assert!(t.create_id(100, 0).is_ok());
}

// Test: handle lifecycle across deletion and slot reuse.
// Verifies: None after deletion; new occupant once the slot is reused.
#[test]
fn stale_handle_after_delete_and_reuse() {
    let mut t = counted(4);
    let h = t.find_id(&1);
    assert_eq!(h, ItemHandle::NOT_FOUND);

    t.create(1, 10).unwrap();
    let h = t.find_id(&1);
    t.destroy_item(&1);
    assert_eq!(t.get_by_id(h), None);

    // 5 % 4 == 1, same bucket, lowest free slot is the one just freed.
    t.create(5, 50).unwrap();
    assert_eq!(t.get_by_id(h), Some(&50));
    assert_eq!(t.key_by_id(h), Some(&5));
}

// Test: duplicate keys.
// Verifies: two entries; find returns the earlier; destroys peel them off in
// slot order.
#[test]
fn duplicate_keys_are_independent() {
    let mut t = counted(16);
    let a = t.create_id(9, 1).unwrap();
    let b = t.create_id(9, 2).unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.find_id(&9), a);
    assert_eq!(t.find_item(&9), Some(&1));
    t.destroy_item(&9);
    assert_eq!(t.find_id(&9), b);
    assert_eq!(t.find_item(&9), Some(&2));
    t.destroy_item(&9);
    assert!(!t.contains(&9));
    t.destroy_item(&9);
    assert!(t.is_empty());
}

// Test: handles survive the packed u64 form.
// Verifies: from_bits(to_bits(h)) resolves to the same item.
#[test]
fn handle_bits_resolve_after_storage() {
    let mut t = counted(32);
    let h = t.create_id(33, 7).unwrap();
    let stored: u64 = h.to_bits();
    assert_eq!(t.get_by_id(ItemHandle::from_bits(stored)), Some(&7));
    assert_eq!((h.bucket(), h.slot()), (1, 0));
}

// Test: removal by handle hands the pair back.
// Verifies: returned (K, V); second removal is None.
#[test]
fn remove_by_id_returns_pair() {
    let mut t = counted(8);
    let h = t.create_id(4, 40).unwrap();
    assert_eq!(t.remove_by_id(h), Some((4, 40)));
    assert_eq!(t.remove_by_id(h), None);
    assert!(!t.contains(&4));
}

// Test: deletion drops key and item immediately.
// Verifies: both drops are observed before the table is dropped.
#[test]
fn destroy_drops_key_and_item() {
    struct Key(&'static str, Rc<RefCell<Vec<&'static str>>>);
    impl PartialEq for Key {
        fn eq(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }
    impl Eq for Key {}
    impl Hash for Key {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.0.hash(state);
        }
    }
    impl Drop for Key {
        fn drop(&mut self) {
            self.1.borrow_mut().push("key");
        }
    }
    struct Item(Rc<RefCell<Vec<&'static str>>>);
    impl Drop for Item {
        fn drop(&mut self) {
            self.0.borrow_mut().push("item");
        }
    }
    impl std::borrow::Borrow<str> for Key {
        fn borrow(&self) -> &str {
            self.0
        }
    }

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut t: HashTable<Key, Item> = HashTable::new(8).unwrap();
    t.create(Key("a", log.clone()), Item(log.clone())).unwrap();
    t.destroy_item("a");
    let mut dropped = log.borrow().clone();
    dropped.sort_unstable();
    assert_eq!(dropped, vec!["item", "key"]);
    drop(t);
    assert_eq!(log.borrow().len(), 2);
}

// Test: external serialization is enough to share a table across threads.
// Verifies: the table is Send and usable behind Arc<Mutex<_>>.
#[test]
fn shared_behind_mutex() {
    let t: HashTable<u64, u64> = HashTable::new(256).unwrap();
    let shared = Arc::new(Mutex::new(t));
    let workers: Vec<_> = (0..4u64)
        .map(|w| {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                for i in 0..16 {
                    shared.lock().unwrap().create(w * 100 + i, i).unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    let t = shared.lock().unwrap();
    assert_eq!(t.len(), 64);
    assert_eq!(t.find_item(&305), Some(&5));
}
