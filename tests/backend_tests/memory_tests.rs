//! MemoryByteStore Tests
//!
//! Tests verify:
//! - Store creation, listing and deletion
//! - Id assignment and record CRUD
//! - Capacity accounting and Full errors
//! - Version and modification time bookkeeping

use rmstore::backend::{ByteStore, MemoryByteStore, StoreHandle};
use rmstore::{Config, RmsError};

fn setup_store(capacity: usize) -> (MemoryByteStore, StoreHandle) {
    let backend = MemoryByteStore::new(capacity);
    let handle = backend.open("test", true).unwrap();
    (backend, handle)
}

// =============================================================================
// Store Lifecycle Tests
// =============================================================================

#[test]
fn test_open_missing_without_create() {
    let backend = MemoryByteStore::new(1024);

    let result = backend.open("missing", false);
    assert!(matches!(result, Err(RmsError::NotFound(_))));
    assert!(backend.list().unwrap().is_empty());
}

#[test]
fn test_open_creates_store() {
    let backend = MemoryByteStore::new(1024);

    let handle = backend.open("scores", true).unwrap();

    assert_eq!(handle.name(), "scores");
    assert_eq!(backend.count(&handle).unwrap(), 0);
    assert_eq!(backend.next_id(&handle).unwrap(), 1);
}

#[test]
fn test_reopen_keeps_records() {
    let (backend, handle) = setup_store(1024);
    backend.add(&handle, b"kept").unwrap();

    let again = backend.open("test", false).unwrap();

    assert_eq!(backend.get(&again, 1).unwrap(), b"kept");
}

#[test]
fn test_list_is_sorted() {
    let backend = MemoryByteStore::new(1024);
    for name in ["zeta", "alpha", "mid"] {
        backend.open(name, true).unwrap();
    }

    assert_eq!(backend.list().unwrap(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_delete_store() {
    let (backend, handle) = setup_store(1024);
    backend.add(&handle, b"gone").unwrap();

    backend.delete_store("test").unwrap();

    assert!(backend.list().unwrap().is_empty());
    assert!(matches!(
        backend.delete_store("test"),
        Err(RmsError::NotFound(_))
    ));

    // A recreated store starts from scratch
    let fresh = backend.open("test", true).unwrap();
    assert_eq!(backend.next_id(&fresh).unwrap(), 1);
    assert_eq!(backend.count(&fresh).unwrap(), 0);
}

#[test]
fn test_from_config_uses_capacity() {
    let config = Config::builder().store_capacity(64).build();
    let backend = MemoryByteStore::from_config(&config).unwrap();

    assert_eq!(backend.capacity(), 64);
}

#[test]
fn test_from_config_rejects_bad_load_factor() {
    let config = Config::builder().map_load_factor(0.0).build();

    assert!(matches!(
        MemoryByteStore::from_config(&config),
        Err(RmsError::Config(_))
    ));
}

// =============================================================================
// Record Tests
// =============================================================================

#[test]
fn test_ids_are_sequential() {
    let (backend, handle) = setup_store(1024);

    assert_eq!(backend.add(&handle, b"a").unwrap(), 1);
    assert_eq!(backend.add(&handle, b"b").unwrap(), 2);
    assert_eq!(backend.add(&handle, b"c").unwrap(), 3);
    assert_eq!(backend.ids(&handle).unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_deleted_ids_are_not_reused() {
    let (backend, handle) = setup_store(1024);
    backend.add(&handle, b"a").unwrap();
    backend.add(&handle, b"b").unwrap();

    backend.delete(&handle, 2).unwrap();

    assert_eq!(backend.next_id(&handle).unwrap(), 3);
    assert_eq!(backend.add(&handle, b"c").unwrap(), 3);
    assert_eq!(backend.ids(&handle).unwrap(), vec![1, 3]);
}

#[test]
fn test_get_missing_record() {
    let (backend, handle) = setup_store(1024);

    assert!(matches!(backend.get(&handle, 1), Err(RmsError::InvalidId(1))));
    assert!(matches!(backend.get(&handle, 0), Err(RmsError::InvalidId(0))));
}

#[test]
fn test_set_and_delete_missing_record() {
    let (backend, handle) = setup_store(1024);

    assert!(matches!(
        backend.set(&handle, 4, b"x"),
        Err(RmsError::InvalidId(4))
    ));
    assert!(matches!(backend.delete(&handle, 4), Err(RmsError::InvalidId(4))));
}

#[test]
fn test_empty_record() {
    let (backend, handle) = setup_store(1024);

    let id = backend.add(&handle, b"").unwrap();

    assert_eq!(backend.get(&handle, id).unwrap(), Vec::<u8>::new());
    assert_eq!(backend.count(&handle).unwrap(), 1);
    assert_eq!(backend.used_bytes(&handle).unwrap(), 0);
}

#[test]
fn test_unknown_handle() {
    let backend = MemoryByteStore::new(1024);
    let stray = StoreHandle::new("stray");

    assert!(matches!(
        backend.add(&stray, b"x"),
        Err(RmsError::NotFound(_))
    ));
    assert!(matches!(backend.close(&stray), Err(RmsError::NotFound(_))));
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_used_and_free_bytes() {
    let (backend, handle) = setup_store(100);

    backend.add(&handle, &[0u8; 30]).unwrap();
    let id = backend.add(&handle, &[0u8; 20]).unwrap();

    assert_eq!(backend.used_bytes(&handle).unwrap(), 50);
    assert_eq!(backend.free_bytes(&handle).unwrap(), 50);

    backend.set(&handle, id, &[0u8; 5]).unwrap();
    assert_eq!(backend.used_bytes(&handle).unwrap(), 35);

    backend.delete(&handle, id).unwrap();
    assert_eq!(backend.used_bytes(&handle).unwrap(), 30);
    assert_eq!(backend.free_bytes(&handle).unwrap(), 70);
}

#[test]
fn test_add_beyond_capacity() {
    let (backend, handle) = setup_store(10);
    backend.add(&handle, &[1u8; 6]).unwrap();

    let result = backend.add(&handle, &[1u8; 5]);

    assert!(matches!(
        result,
        Err(RmsError::Full {
            requested: 5,
            available: 4
        })
    ));
    // Failed add consumes no id and no space
    assert_eq!(backend.next_id(&handle).unwrap(), 2);
    assert_eq!(backend.used_bytes(&handle).unwrap(), 6);
}

#[test]
fn test_add_exactly_fills_store() {
    let (backend, handle) = setup_store(10);

    backend.add(&handle, &[1u8; 10]).unwrap();

    assert_eq!(backend.free_bytes(&handle).unwrap(), 0);
    assert!(matches!(
        backend.add(&handle, b"x"),
        Err(RmsError::Full { .. })
    ));
    // Empty records still fit
    assert!(backend.add(&handle, b"").is_ok());
}

#[test]
fn test_set_growth_beyond_capacity() {
    let (backend, handle) = setup_store(10);
    let id = backend.add(&handle, &[1u8; 8]).unwrap();

    // Growing by 2 fits, growing by 3 does not
    assert!(backend.set(&handle, id, &[2u8; 10]).is_ok());
    assert!(matches!(
        backend.set(&handle, id, &[3u8; 11]),
        Err(RmsError::Full { .. })
    ));
    assert_eq!(backend.get(&handle, id).unwrap(), vec![2u8; 10]);
}

// =============================================================================
// Bookkeeping Tests
// =============================================================================

#[test]
fn test_version_bumps_on_mutation() {
    let (backend, handle) = setup_store(1024);
    assert_eq!(backend.version(&handle).unwrap(), 0);
    assert_eq!(backend.last_modified(&handle).unwrap(), 0);

    let id = backend.add(&handle, b"a").unwrap();
    backend.set(&handle, id, b"b").unwrap();
    backend.delete(&handle, id).unwrap();

    assert_eq!(backend.version(&handle).unwrap(), 3);
    assert!(backend.last_modified(&handle).unwrap() > 0);
}

#[test]
fn test_failed_mutation_keeps_version() {
    let (backend, handle) = setup_store(4);
    backend.add(&handle, b"ab").unwrap();

    let _ = backend.add(&handle, b"too long");
    let _ = backend.delete(&handle, 9);

    assert_eq!(backend.version(&handle).unwrap(), 1);
}

#[test]
fn test_contains() {
    let (backend, handle) = setup_store(1024);
    let id = backend.add(&handle, b"here").unwrap();

    assert!(backend.contains(&handle, id).unwrap());
    assert!(!backend.contains(&handle, id + 1).unwrap());

    backend.delete(&handle, id).unwrap();
    assert!(!backend.contains(&handle, id).unwrap());
}
