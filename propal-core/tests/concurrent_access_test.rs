//! Concurrent store access tests
//!
//! These tests verify that concurrent account operations never lose updates:
//! every load-mutate-save cycle is serialized by the store lock, both between
//! threads sharing one store and between independent store instances over the
//! same file (which is how separate processes see each other).
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use propal_core::adapters::{JsonFileRecordStore, MemoryRecordStore};
use propal_core::config::{Config, PasswordHashing};
use propal_core::services::AccountService;
use propal_core::{Error, NewAccount, ProfileUpdate, RecordStore};

/// Number of concurrent threads for stress tests.
const THREAD_COUNT: usize = 8;

/// Number of accounts each thread creates
const ITERATIONS_PER_THREAD: usize = 4;

fn test_config() -> Config {
    Config::default()
        .with_lock_timeout(Duration::from_secs(30))
        .with_password_hashing(PasswordHashing {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        })
}

fn email(thread_id: usize, i: usize) -> String {
    format!("t{}_i{}@x.com", thread_id, i)
}

/// Test: N threads share one service and create accounts with distinct emails.
/// Every create must survive; a lost update would leave fewer records.
#[test]
fn test_concurrent_creates_lose_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileRecordStore::new(temp_dir.path().join("users.json")));
    let service = Arc::new(AccountService::new(store.clone(), &test_config()).unwrap());

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let error_count = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let barrier = Arc::clone(&barrier);
            let service = Arc::clone(&service);
            let error_count = Arc::clone(&error_count);

            thread::spawn(move || {
                barrier.wait();
                for i in 0..ITERATIONS_PER_THREAD {
                    let account =
                        NewAccount::new(format!("user{}_{}", thread_id, i), email(thread_id, i), "pw");
                    if let Err(e) = service.create(account) {
                        eprintln!("Thread {}: create {} failed: {}", thread_id, i, e);
                        error_count.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(error_count.load(Ordering::SeqCst), 0);

    let records = store.load_all().unwrap().records;
    assert_eq!(records.len(), THREAD_COUNT * ITERATIONS_PER_THREAD);

    let emails: HashSet<&str> = records.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails.len(), records.len());
}

/// Test: each thread opens its own store instance over the same file, as
/// separate processes would. The lock file must serialize them.
#[test]
fn test_independent_store_instances_serialize() {
    let temp_dir = TempDir::new().unwrap();
    let path = Arc::new(temp_dir.path().join("users.json"));
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                let store = Arc::new(JsonFileRecordStore::new(path.as_path()));
                let service = AccountService::new(store, &test_config()).unwrap();

                barrier.wait();
                for i in 0..ITERATIONS_PER_THREAD {
                    service
                        .create(NewAccount::new("user", email(thread_id, i), "pw"))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let store = JsonFileRecordStore::new(path.as_path());
    assert_eq!(
        store.load_all().unwrap().records.len(),
        THREAD_COUNT * ITERATIONS_PER_THREAD
    );
}

/// Test: many threads race to register the same email. Exactly one wins.
#[test]
fn test_racing_duplicate_emails_admit_one() {
    let store = Arc::new(MemoryRecordStore::new());
    let service = Arc::new(AccountService::new(store.clone(), &test_config()).unwrap());
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let duplicates = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let duplicates = Arc::clone(&duplicates);

            thread::spawn(move || {
                barrier.wait();
                match service.create(NewAccount::new(format!("user{}", thread_id), "same@x.com", "pw")) {
                    Ok(_) => {}
                    Err(Error::DuplicateEmail) => {
                        duplicates.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => panic!("unexpected error: {}", e),
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.load_all().unwrap().records.len(), 1);
    assert_eq!(duplicates.load(Ordering::SeqCst), THREAD_COUNT - 1);
}

/// Test: profile updates racing with creates must not drop either side.
#[test]
fn test_updates_racing_creates() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileRecordStore::new(temp_dir.path().join("users.json")));
    let service = Arc::new(AccountService::new(store.clone(), &test_config()).unwrap());

    let owner = service
        .create(NewAccount::new("owner", "owner@x.com", "pw0"))
        .unwrap();
    let owner_id = owner.id;

    let barrier = Arc::new(Barrier::new(2));

    let creator = {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for i in 0..ITERATIONS_PER_THREAD {
                service
                    .create(NewAccount::new("user", email(0, i), "pw"))
                    .unwrap();
            }
        })
    };

    let updater = {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for i in 0..ITERATIONS_PER_THREAD {
                service
                    .update_profile(
                        owner_id,
                        ProfileUpdate::default().email(format!("owner{}@x.com", i)),
                    )
                    .unwrap();
            }
        })
    };

    creator.join().unwrap();
    updater.join().unwrap();

    let records = store.load_all().unwrap().records;
    assert_eq!(records.len(), 1 + ITERATIONS_PER_THREAD);
    assert_eq!(records[0].id, owner_id);
    assert_eq!(
        records[0].email,
        format!("owner{}@x.com", ITERATIONS_PER_THREAD - 1)
    );
    assert!(service
        .authenticate(&records[0].email, "pw0")
        .is_ok());
}

/// Test: readers running during writes always see a complete collection.
#[test]
fn test_readers_never_see_partial_writes() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileRecordStore::new(temp_dir.path().join("users.json")));
    let service = Arc::new(AccountService::new(store.clone(), &test_config()).unwrap());
    service
        .create(NewAccount::new("seed", "seed@x.com", "pw"))
        .unwrap();

    let done = Arc::new(AtomicUsize::new(0));

    let writer = {
        let service = Arc::clone(&service);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..20 {
                service
                    .create(NewAccount::new("user", email(1, i), "pw"))
                    .unwrap();
            }
            done.store(1, Ordering::SeqCst);
        })
    };

    let mut reads = 0;
    let mut last_len = 1;
    while done.load(Ordering::SeqCst) == 0 {
        let snapshot = store.load_all().expect("reader observed a broken collection");
        assert!(snapshot.records.len() >= last_len);
        last_len = snapshot.records.len();
        reads += 1;
    }
    writer.join().unwrap();

    println!("Completed {} reads during writes", reads);
    assert_eq!(store.load_all().unwrap().records.len(), 21);
}

/// Test: a caller that cannot get the lock in time gets ServiceBusy, and
/// nothing is written.
#[test]
fn test_lock_timeout_reports_busy() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("users.json");

    // Another "process" holds the lock
    let holder = JsonFileRecordStore::new(&path);
    let _guard = holder.begin(Duration::from_secs(1)).unwrap();

    let store = Arc::new(JsonFileRecordStore::new(&path));
    let config = test_config().with_lock_timeout(Duration::from_millis(100));
    let service = AccountService::new(store.clone(), &config).unwrap();

    let start = Instant::now();
    let err = service
        .create(NewAccount::new("alice", "a@x.com", "pw1"))
        .unwrap_err();

    assert!(matches!(err, Error::ServiceBusy));
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(!store.load_all().unwrap().persisted);
}
