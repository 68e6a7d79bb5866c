//! Property-based tests for persisted store state.
//!
//! Whatever the store holds, writing it through a persister and hydrating a
//! fresh store from the same storage must give back the same state.

use std::sync::Arc;

use chrono::NaiveDate;
use markstash::managers::bookmark_store::{BookmarkStore, StoreState};
use markstash::services::state_storage::{MemoryStorage, SqliteStateStorage, StatePersister};
use markstash::types::bookmark::{Bookmark, BookmarkStatus};
use markstash::types::session::{AuthStatus, Session};
use markstash::types::view::{CollectionSelector, FilterType, SortBy, ViewMode};
use proptest::prelude::*;

const KEY: &str = "bookmarks-storage";

fn arb_status() -> impl Strategy<Value = BookmarkStatus> {
    prop_oneof![
        Just(BookmarkStatus::Active),
        Just(BookmarkStatus::Archived),
        Just(BookmarkStatus::Trashed),
    ]
}

fn arb_bookmark() -> impl Strategy<Value = Bookmark> {
    (
        "[a-z0-9]{1,8}",
        "\\PC{0,20}",
        prop_oneof![Just("reading"), Just("dev"), Just("design")],
        0u32..365,
        any::<bool>(),
        proptest::option::of(any::<bool>()),
        arb_status(),
    )
        .prop_map(|(id, title, collection, day, fav, dark, status)| Bookmark {
            url: format!("https://{}.example", id),
            id,
            title,
            description: String::new(),
            favicon: "link".to_string(),
            collection_id: collection.to_string(),
            created_at: NaiveDate::from_yo_opt(2024, day + 1).unwrap_or_default(),
            is_favorite: fav,
            has_dark_icon: dark,
            status,
        })
}

fn arb_session() -> impl Strategy<Value = Session> {
    proptest::option::of("[A-Za-z0-9._-]{8,24}").prop_map(|token| match token {
        Some(token) => Session {
            auth_status: AuthStatus::Authenticated,
            token: Some(token),
        },
        None => Session::default(),
    })
}

fn arb_state() -> impl Strategy<Value = StoreState> {
    (
        prop::collection::vec(arb_bookmark(), 0..8),
        arb_session(),
        prop_oneof![Just("all".to_string()), Just("reading".to_string()), "[a-z]{1,6}"],
        "\\PC{0,10}",
        prop::sample::select(SortBy::ALL.to_vec()),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(bookmarks, session, selector, query, sort, list, favorites)| {
            let mut state = StoreState::seeded();
            state.bookmarks = bookmarks;
            state.session = session;
            state.selected_collection = CollectionSelector::from(selector);
            state.search_query = query;
            state.sort_by = sort;
            state.view_mode = if list { ViewMode::List } else { ViewMode::Grid };
            state.filter_type = if favorites { FilterType::Favorites } else { FilterType::All };
            state
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn persisted_state_rehydrates_unchanged(state in arb_state()) {
        let storage = Arc::new(MemoryStorage::new());
        StatePersister::new(storage.clone(), KEY).save(&state).unwrap();

        let mut store = BookmarkStore::with_storage(storage, KEY);
        prop_assert!(store.hydrate().unwrap());
        prop_assert_eq!(store.state(), &state);
    }

    #[test]
    fn sqlite_backend_roundtrips_state(state in arb_state()) {
        let storage = Arc::new(SqliteStateStorage::open_in_memory().unwrap());
        let persister = StatePersister::new(storage, KEY);
        persister.save(&state).unwrap();
        prop_assert_eq!(persister.load().unwrap(), Some(state));
    }

    #[test]
    fn selector_string_form_is_stable(raw in "[a-z]{1,10}") {
        let selector = CollectionSelector::from(raw.clone());
        prop_assert_eq!(selector.is_all(), raw == "all");
        prop_assert_eq!(String::from(selector), raw);
    }
}
