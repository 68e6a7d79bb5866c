//! Derived views over the store state.
//!
//! Every function here is a pure read: it takes the current [`StoreState`]
//! and returns a freshly built sequence. Nothing is cached and nothing is
//! mutated. Sorting always runs last and uses a stable sort, so bookmarks with
//! equal keys keep their store order.

use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::managers::bookmark_store::StoreState;
use crate::types::bookmark::{Bookmark, BookmarkStatus};
use crate::types::view::{CollectionSelector, FilterType, SortBy};
use crate::types::workspace::Collection;

/// Collection and bookmark totals for one workspace.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct WorkspaceStats {
    pub collections: usize,
    pub bookmarks: usize,
}

/// Collections owned by `workspace_id`, in store order.
pub fn workspace_collections<'a>(state: &'a StoreState, workspace_id: &str) -> Vec<&'a Collection> {
    state
        .collections
        .iter()
        .filter(|c| c.workspace_id == workspace_id)
        .collect()
}

fn workspace_collection_ids<'a>(state: &'a StoreState, workspace_id: &str) -> HashSet<&'a str> {
    state
        .collections
        .iter()
        .filter(|c| c.workspace_id == workspace_id)
        .map(|c| c.id.as_str())
        .collect()
}

/// Keeps only bookmarks matching the store's search query, if one is set.
fn apply_search(bookmarks: &mut Vec<Bookmark>, query: &str) {
    if query.is_empty() {
        return;
    }
    let needle = query.to_lowercase();
    bookmarks.retain(|b| b.matches_query(&needle));
}

/// Collation key for a title: base letters first, then accents, then case.
///
/// `"Éclair"` sorts with the `e`s, `"e" < "é"`, and lowercase comes before
/// uppercase when nothing else differs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TitleKey {
    base: String,
    accented: String,
    uppercase: Vec<bool>,
}

impl TitleKey {
    pub fn new(title: &str) -> Self {
        let accented: String = title.nfd().flat_map(char::to_lowercase).collect();
        let base = accented.chars().filter(|c| !is_combining_mark(*c)).collect();
        Self {
            base,
            accented,
            uppercase: title.chars().map(char::is_uppercase).collect(),
        }
    }
}

/// Compares titles the way the alphabetical sorts order them.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    TitleKey::new(a).cmp(&TitleKey::new(b))
}

/// Stable sort of `bookmarks` by `sort_by`.
pub fn sort_bookmarks(bookmarks: &mut [Bookmark], sort_by: SortBy) {
    match sort_by {
        SortBy::DateNewest => bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortBy::DateOldest => bookmarks.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortBy::AlphaAz => bookmarks.sort_by_cached_key(|b| TitleKey::new(&b.title)),
        SortBy::AlphaZa => bookmarks.sort_by_cached_key(|b| Reverse(TitleKey::new(&b.title))),
    }
}

/// Main view: active bookmarks in the selected workspace (or the selected
/// collection), narrowed by search and filter, then sorted.
pub fn filtered_bookmarks(state: &StoreState) -> Vec<Bookmark> {
    let mut result: Vec<Bookmark> = match &state.selected_collection {
        CollectionSelector::All => {
            let ids = workspace_collection_ids(state, &state.selected_workspace);
            state
                .bookmarks
                .iter()
                .filter(|b| b.status == BookmarkStatus::Active)
                .filter(|b| ids.contains(b.collection_id.as_str()))
                .cloned()
                .collect()
        }
        CollectionSelector::Collection(id) => state
            .bookmarks
            .iter()
            .filter(|b| b.status == BookmarkStatus::Active)
            .filter(|b| &b.collection_id == id)
            .cloned()
            .collect(),
    };

    apply_search(&mut result, &state.search_query);

    match state.filter_type {
        FilterType::All => {}
        FilterType::Favorites => result.retain(|b| b.is_favorite),
    }

    sort_bookmarks(&mut result, state.sort_by);
    result
}

/// Favorites view: active favorites anywhere in the selected workspace.
///
/// Ignores the collection selector and the filter type on purpose; the
/// favorites page always spans the whole workspace.
pub fn favorite_bookmarks(state: &StoreState) -> Vec<Bookmark> {
    let ids = workspace_collection_ids(state, &state.selected_workspace);
    let mut result: Vec<Bookmark> = state
        .bookmarks
        .iter()
        .filter(|b| {
            b.is_favorite
                && b.status == BookmarkStatus::Active
                && ids.contains(b.collection_id.as_str())
        })
        .cloned()
        .collect();

    apply_search(&mut result, &state.search_query);
    sort_bookmarks(&mut result, state.sort_by);
    result
}

fn with_status(state: &StoreState, status: BookmarkStatus) -> Vec<Bookmark> {
    let mut result: Vec<Bookmark> = state
        .bookmarks
        .iter()
        .filter(|b| b.status == status)
        .cloned()
        .collect();
    apply_search(&mut result, &state.search_query);
    result
}

/// Archived bookmarks across every workspace, in store order.
pub fn archived_bookmarks(state: &StoreState) -> Vec<Bookmark> {
    with_status(state, BookmarkStatus::Archived)
}

/// Trashed bookmarks across every workspace, in store order.
pub fn trashed_bookmarks(state: &StoreState) -> Vec<Bookmark> {
    with_status(state, BookmarkStatus::Trashed)
}

/// Number of bookmarks in a collection, whatever their status.
pub fn collection_bookmark_count(state: &StoreState, collection_id: &str) -> usize {
    state
        .bookmarks
        .iter()
        .filter(|b| b.collection_id == collection_id)
        .count()
}

pub fn workspace_stats(state: &StoreState, workspace_id: &str) -> WorkspaceStats {
    let ids = workspace_collection_ids(state, workspace_id);
    WorkspaceStats {
        collections: ids.len(),
        bookmarks: state
            .bookmarks
            .iter()
            .filter(|b| ids.contains(b.collection_id.as_str()))
            .count(),
    }
}
