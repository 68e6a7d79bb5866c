//! Unit tests for persisted store state: the storage back ends, the envelope
//! format and the hydrate lifecycle.

use std::sync::Arc;

use markstash::managers::bookmark_store::{BookmarkStore, StoreState};
use markstash::services::state_storage::{
    JsonFileStorage, MemoryStorage, PersistedEnvelope, SqliteStateStorage, StatePersister,
    StateStorage, STATE_VERSION,
};
use markstash::types::errors::StorageError;
use markstash::types::view::{CollectionSelector, SortBy};
use rstest::rstest;
use tempfile::TempDir;

const KEY: &str = "bookmarks-storage";

fn exercise_backend(storage: &dyn StateStorage) {
    assert_eq!(storage.load(KEY).unwrap(), None);

    storage.save(KEY, "{\"a\":1}").unwrap();
    assert_eq!(storage.load(KEY).unwrap().as_deref(), Some("{\"a\":1}"));

    storage.save(KEY, "{\"a\":2}").unwrap();
    assert_eq!(storage.load(KEY).unwrap().as_deref(), Some("{\"a\":2}"));
    assert_eq!(storage.load("other").unwrap(), None);

    storage.remove(KEY).unwrap();
    assert_eq!(storage.load(KEY).unwrap(), None);
    storage.remove(KEY).unwrap();
}

#[test]
fn test_memory_storage() {
    let storage = MemoryStorage::new();
    exercise_backend(&storage);
    assert_eq!(storage.write_count(), 2);
}

#[test]
fn test_sqlite_storage_in_memory() {
    let storage = SqliteStateStorage::open_in_memory().unwrap();
    exercise_backend(&storage);
}

#[test]
fn test_sqlite_storage_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.db");
    {
        let storage = SqliteStateStorage::open(&path).unwrap();
        storage.save(KEY, "persisted").unwrap();
    }
    let storage = SqliteStateStorage::open(&path).unwrap();
    assert_eq!(storage.load(KEY).unwrap().as_deref(), Some("persisted"));
}

#[test]
fn test_json_file_storage() {
    let dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(dir.path().join("state"));
    exercise_backend(&storage);
}

#[rstest]
#[case("bookmarks-storage", "bookmarks-storage.json")]
#[case("../escape", "___escape.json")]
#[case("a/b", "a_b.json")]
fn test_json_file_names_stay_in_directory(#[case] key: &str, #[case] file: &str) {
    let dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(dir.path());
    assert_eq!(storage.path_for(key), dir.path().join(file));
}

#[test]
fn test_envelope_shape() {
    let storage = Arc::new(MemoryStorage::new());
    let persister = StatePersister::new(storage.clone(), KEY);
    let mut state = StoreState::seeded();
    state.sort_by = SortBy::AlphaAz;
    state.selected_collection = CollectionSelector::Collection("reading".to_string());
    persister.save(&state).unwrap();

    let raw = storage.load(KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], STATE_VERSION);
    let persisted = &value["state"];
    assert_eq!(persisted["authStatus"], "guest");
    assert!(persisted["token"].is_null());
    assert_eq!(persisted["selectedWorkspace"], "personal");
    assert_eq!(persisted["selectedCollection"], "reading");
    assert_eq!(persisted["sortBy"], "alpha-az");
    assert_eq!(persisted["viewMode"], "grid");
    assert_eq!(persisted["filterType"], "all");
    assert_eq!(persisted["bookmarks"][0]["collectionId"], "dev");
    assert_eq!(persisted["bookmarks"][0]["createdAt"], "2024-01-15");
    assert_eq!(persisted["bookmarks"][0]["status"], "active");
    assert_eq!(persisted["workspaces"][1]["orderIndex"], 1);

    let envelope: PersistedEnvelope = serde_json::from_str(&raw).unwrap();
    assert_eq!(envelope.state, state);
}

#[test]
fn test_store_starts_unhydrated() {
    let storage = Arc::new(MemoryStorage::new());
    let mut store = BookmarkStore::with_storage(storage, KEY);
    assert!(!store.is_hydrated());

    assert!(!store.hydrate().unwrap(), "nothing stored yet");
    assert!(store.is_hydrated());
    assert_eq!(store.state(), &StoreState::seeded());
}

#[test]
fn test_hydrate_restores_previous_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("markstash.db");

    {
        let storage = Arc::new(SqliteStateStorage::open(&path).unwrap());
        let mut store = BookmarkStore::with_storage(storage, KEY);
        store.hydrate().unwrap();
        store.login("tok");
        store.set_selected_workspace("work");
        store.trash_bookmark("4");
    }

    let storage = Arc::new(SqliteStateStorage::open(&path).unwrap());
    let mut store = BookmarkStore::with_storage(storage, KEY);
    assert!(store.hydrate().unwrap());
    assert_eq!(store.token().as_deref(), Some("tok"));
    assert_eq!(store.state().selected_workspace, "work");
    assert_eq!(store.get_trashed_bookmarks().len(), 1);
}

#[test]
fn test_hydrate_repairs_dangling_workspace_selection() {
    let storage = Arc::new(MemoryStorage::new());
    let mut state = StoreState::seeded();
    state.selected_workspace = "deleted".to_string();
    state.selected_collection = CollectionSelector::Collection("gone".to_string());
    StatePersister::new(storage.clone(), KEY).save(&state).unwrap();

    let mut store = BookmarkStore::with_storage(storage, KEY);
    store.hydrate().unwrap();
    assert_eq!(store.state().selected_workspace, "personal");
    assert_eq!(store.state().selected_collection, CollectionSelector::All);
}

#[test]
fn test_corrupt_envelope_keeps_seed_data() {
    let storage = Arc::new(MemoryStorage::new());
    storage.save(KEY, "not json at all").unwrap();

    let mut store = BookmarkStore::with_storage(storage, KEY);
    let result = store.hydrate();
    assert!(matches!(result, Err(StorageError::Serialization(_))));
    assert!(store.is_hydrated());
    assert_eq!(store.state(), &StoreState::seeded());
}

#[test]
fn test_missing_optional_fields_use_defaults() {
    let storage = Arc::new(MemoryStorage::new());
    let raw = serde_json::json!({
        "state": {
            "authStatus": "guest",
            "token": null,
            "bookmarks": [],
            "collections": [],
            "workspaces": [
                {"id": "w", "name": "W", "icon": "user", "orderIndex": 0, "color": "blue"}
            ],
            "selectedWorkspace": "w",
            "selectedCollection": "all"
        }
    });
    storage.save(KEY, &raw.to_string()).unwrap();

    let loaded = StatePersister::new(storage, KEY).load().unwrap().unwrap();
    assert_eq!(loaded.sort_by, SortBy::DateNewest);
    assert_eq!(loaded.search_query, "");
    assert_eq!(loaded.workspaces.len(), 1);
}

#[test]
fn test_flush_and_clear() {
    let storage = Arc::new(MemoryStorage::new());
    let store = BookmarkStore::with_storage(storage.clone(), KEY);
    store.flush().unwrap();
    assert_eq!(storage.write_count(), 1);

    let persister = StatePersister::new(storage.clone(), KEY);
    assert_eq!(persister.key(), KEY);
    persister.clear().unwrap();
    assert!(storage.load(KEY).unwrap().is_none());
}
