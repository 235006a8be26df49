//! Integration tests for propal-core services
//!
//! These tests run the account service against the real JSON file store in
//! a temporary directory.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use uuid::Uuid;

use propal_core::adapters::JsonFileRecordStore;
use propal_core::config::{Config, PasswordHashing};
use propal_core::services::AccountService;
use propal_core::{
    EntryPoint, Error, ErrorKind, NewAccount, OperationResult, ProfileUpdate, PropalContext,
    RecordStore, UserProfile,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Cheap hashing parameters so tests stay fast
fn test_config() -> Config {
    Config::default()
        .with_lock_timeout(Duration::from_secs(5))
        .with_password_hashing(PasswordHashing {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        })
}

fn create_store(temp_dir: &TempDir) -> Arc<JsonFileRecordStore> {
    Arc::new(JsonFileRecordStore::new(temp_dir.path().join("users.json")))
}

fn create_service(store: &Arc<JsonFileRecordStore>) -> AccountService {
    AccountService::new(store.clone(), &test_config()).expect("Failed to create service")
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn test_signup_login_duplicate_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    let service = create_service(&store);

    let alice = service
        .create(NewAccount::new("alice", "a@x.com", "pw1"))
        .unwrap();
    assert_eq!(alice.username, "alice");
    assert_eq!(alice.email, "a@x.com");

    let login = service.authenticate("a@x.com", "pw1").unwrap();
    assert_eq!(login.id, alice.id);

    assert!(matches!(
        service.authenticate("a@x.com", "wrong"),
        Err(Error::InvalidCredentials)
    ));

    let before = fs::read(store.path()).unwrap();
    assert!(matches!(
        service.create(NewAccount::new("bob", "a@x.com", "pw2")),
        Err(Error::DuplicateEmail)
    ));
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn test_round_trip_across_service_instances() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);

    let created = create_service(&store)
        .create(NewAccount::new("carol", "c@x.com", "s3cret").with_phone("+1 555 0100"))
        .unwrap();

    // A fresh store and service over the same file see the record
    let reopened = create_store(&temp_dir);
    let login = create_service(&reopened)
        .authenticate("c@x.com", "s3cret")
        .unwrap();
    assert_eq!(login.id, created.id);
    assert_eq!(login.phone.as_deref(), Some("+1 555 0100"));
}

#[test]
fn test_partial_update_keeps_password() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    let service = create_service(&store);

    let alice = service
        .create(NewAccount::new("alice", "a@x.com", "pw1"))
        .unwrap();
    let updated = service
        .update_profile(alice.id, ProfileUpdate::default().email("b@x.com"))
        .unwrap();

    assert_eq!(updated.id, alice.id);
    assert_eq!(updated.email, "b@x.com");
    assert_eq!(updated.username, "alice");

    assert_eq!(service.authenticate("b@x.com", "pw1").unwrap().id, alice.id);
    assert!(matches!(
        service.authenticate("a@x.com", "pw1"),
        Err(Error::InvalidCredentials)
    ));
}

#[test]
fn test_update_with_nothing_supplied_is_a_no_op() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    let service = create_service(&store);

    let alice = service
        .create(NewAccount::new("alice", "a@x.com", "pw1"))
        .unwrap();
    let before = store.load_all().unwrap();

    let profile = service
        .update_profile(alice.id, ProfileUpdate::default().email("").password(""))
        .unwrap();
    assert_eq!(profile, alice);
    assert_eq!(store.load_all().unwrap(), before);
}

#[test]
fn test_ids_are_unique_and_stable() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    let service = create_service(&store);

    let ids: Vec<Uuid> = (0..5)
        .map(|i| {
            service
                .create(NewAccount::new(format!("user{}", i), format!("u{}@x.com", i), "pw"))
                .unwrap()
                .id
        })
        .collect();

    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    service
        .update_profile(ids[2], ProfileUpdate::default().email("moved@x.com").password("pw2"))
        .unwrap();
    let stored: Vec<Uuid> = store.load_all().unwrap().records.iter().map(|r| r.id).collect();
    assert_eq!(stored, ids);
}

// ============================================================================
// Store State Tests
// ============================================================================

#[test]
fn test_idempotent_read() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    let service = create_service(&store);
    service
        .create(NewAccount::new("alice", "a@x.com", "pw1"))
        .unwrap();

    assert_eq!(store.load_all().unwrap(), store.load_all().unwrap());
}

#[test]
fn test_never_written_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    let service = create_service(&store);

    assert!(matches!(
        service.authenticate("a@x.com", "pw1"),
        Err(Error::StoreEmpty)
    ));
    assert!(matches!(
        service.update_profile(Uuid::new_v4(), ProfileUpdate::default().email("b@x.com")),
        Err(Error::StoreEmpty)
    ));
    assert!(!store.path().exists());
}

#[test]
fn test_corrupt_store_blocks_all_operations() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    let service = create_service(&store);
    fs::write(store.path(), "[{\"id\": \"not closed\"").unwrap();

    let create = service.create(NewAccount::new("alice", "a@x.com", "pw1"));
    assert!(matches!(create, Err(Error::CorruptStore(_))));
    assert!(matches!(
        service.authenticate("a@x.com", "pw1"),
        Err(Error::CorruptStore(_))
    ));

    // The corrupt file is not overwritten
    assert_eq!(
        fs::read_to_string(store.path()).unwrap(),
        "[{\"id\": \"not closed\""
    );
}

#[test]
fn test_legacy_file_is_readable_and_upgraded() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    fs::write(
        store.path(),
        r#"[
  {
    "id": "0b6f1d52-3c3e-4a43-8f9e-2f7d8c1c9a11",
    "username": "legacy",
    "email": "old@x.com",
    "password": "plaintext",
    "phone": "123"
  }
]"#,
    )
    .unwrap();
    let service = create_service(&store);

    let profile = service.authenticate("old@x.com", "plaintext").unwrap();
    assert_eq!(
        profile.id.to_string(),
        "0b6f1d52-3c3e-4a43-8f9e-2f7d8c1c9a11"
    );

    let content = fs::read_to_string(store.path()).unwrap();
    assert!(!content.contains("\"plaintext\""));
    assert!(content.contains("$argon2id$"));
    assert!(service.authenticate("old@x.com", "plaintext").is_ok());
}

// ============================================================================
// Response Contract Tests
// ============================================================================

#[test]
fn test_envelope_never_contains_password() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir);
    let service = create_service(&store);

    let result: OperationResult<UserProfile> = service
        .create(NewAccount::new("alice", "a@x.com", "pw1"))
        .into();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["email"], "a@x.com");
    assert!(json["data"].get("password").is_none());

    let failed: OperationResult<UserProfile> = service.authenticate("a@x.com", "nope").into();
    assert_eq!(failed.error_kind, Some(ErrorKind::InvalidCredentials));
    assert_eq!(failed.error.as_deref(), Some("Invalid email or password"));
}

// ============================================================================
// Context Wiring Tests
// ============================================================================

#[test]
fn test_context_uses_configured_store_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("settings.json"),
        r#"{
            "store": { "fileName": "accounts.json" },
            "passwordHashing": { "memoryCost": 1024, "timeCost": 1, "parallelism": 1 }
        }"#,
    )
    .unwrap();

    let ctx = PropalContext::new(temp_dir.path(), EntryPoint::Cli).unwrap();
    ctx.account_service
        .create(NewAccount::new("alice", "a@x.com", "pw1"))
        .unwrap();

    assert!(temp_dir.path().join("accounts.json").exists());
    assert!(!temp_dir.path().join("users.json").exists());

    let status = ctx.status_service.get_status().unwrap();
    assert!(status.initialized);
    assert_eq!(status.total_users, 1);
    assert_eq!(status.legacy_credentials, 0);

    let logger = ctx.logging_service.as_ref().expect("logging available");
    let events: Vec<String> = logger
        .get_recent(10)
        .unwrap()
        .into_iter()
        .map(|e| e.event)
        .collect();
    assert!(events.contains(&"account_created".to_string()));
}
