//! Bookmark Store for Markstash.
//!
//! Holds workspaces, collections and bookmarks together with the UI-selection
//! state (selected workspace/collection, search, sort, filter, view mode) and
//! the session. Every mutation is synchronous and applies completely or not at
//! all. Operations that reference an unknown id, and guard violations, are
//! silent no-ops. After each applied mutation the registered observers are
//! handed the new state; persistence plugs in that way.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::managers::bookmark_queries;
use crate::managers::seed_data;
use crate::services::state_storage::{StatePersister, StateStorage};
use crate::types::bookmark::{Bookmark, BookmarkPatch, BookmarkStatus, NewBookmark};
use crate::types::errors::StorageError;
use crate::types::session::{AuthStatus, Session};
use crate::types::view::{CollectionSelector, FilterType, SortBy, ViewMode};
use crate::types::workspace::{Collection, NewCollection, NewWorkspace, Workspace};

/// Maximum number of workspaces that may exist at once.
pub const MAX_WORKSPACES: usize = 5;

const DEFAULT_BOOKMARK_ICON: &str = "link";
const DEFAULT_COLLECTION_ICON: &str = "folder";
const DEFAULT_WORKSPACE_ICON: &str = "briefcase";

/// Complete store state. This is exactly what gets persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(flatten)]
    pub session: Session,
    pub bookmarks: Vec<Bookmark>,
    pub collections: Vec<Collection>,
    pub workspaces: Vec<Workspace>,
    pub selected_workspace: String,
    pub selected_collection: CollectionSelector,
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub filter_type: FilterType,
}

impl StoreState {
    /// Builds a state over the given entities with the first workspace selected
    /// and every UI option at its default.
    pub fn new(
        workspaces: Vec<Workspace>,
        collections: Vec<Collection>,
        bookmarks: Vec<Bookmark>,
    ) -> Self {
        let selected_workspace = workspaces
            .first()
            .map(|w| w.id.clone())
            .unwrap_or_default();
        Self {
            session: Session::default(),
            bookmarks,
            collections,
            workspaces,
            selected_workspace,
            selected_collection: CollectionSelector::All,
            search_query: String::new(),
            view_mode: ViewMode::default(),
            sort_by: SortBy::default(),
            filter_type: FilterType::default(),
        }
    }

    /// First-run state built from the sample data.
    pub fn seeded() -> Self {
        let mut state = Self::new(
            seed_data::workspaces(),
            seed_data::collections(),
            seed_data::bookmarks(),
        );
        state.selected_workspace = seed_data::DEFAULT_WORKSPACE_ID.to_string();
        state
    }

    fn collection_exists(&self, id: &str) -> bool {
        self.collections.iter().any(|c| c.id == id)
    }

    fn workspace_exists(&self, id: &str) -> bool {
        self.workspaces.iter().any(|w| w.id == id)
    }

    /// Restores the selection invariants after loading foreign state.
    fn repair_selection(&mut self) {
        if !self.workspace_exists(&self.selected_workspace) {
            if let Some(first) = self.workspaces.first() {
                self.selected_workspace = first.id.clone();
            }
            self.selected_collection = CollectionSelector::All;
        }
    }
}

impl Default for StoreState {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Receives the full state after every applied mutation.
pub trait StateObserver: Send {
    fn state_changed(&mut self, state: &StoreState);
}

/// The bookmark store: one explicit instance per client, passed by handle
/// to whatever needs it.
pub struct BookmarkStore {
    state: StoreState,
    observers: Vec<Box<dyn StateObserver>>,
    persister: Option<StatePersister>,
    hydrated: bool,
}

impl BookmarkStore {
    /// Creates a store over the sample data with no persistence.
    pub fn new() -> Self {
        Self::from_state(StoreState::seeded())
    }

    /// Creates a store over an explicit state with no persistence.
    pub fn from_state(state: StoreState) -> Self {
        Self {
            state,
            observers: Vec::new(),
            persister: None,
            hydrated: true,
        }
    }

    /// Creates a persisted store. It starts on the sample data and is not
    /// ready until [`BookmarkStore::hydrate`] has run.
    pub fn with_persister(persister: StatePersister) -> Self {
        let mut store = Self::from_state(StoreState::seeded());
        store.hydrated = false;
        store.subscribe(Box::new(persister.clone()));
        store.persister = Some(persister);
        store
    }

    /// Shorthand for [`BookmarkStore::with_persister`] over `storage` and `key`.
    pub fn with_storage(storage: Arc<dyn StateStorage>, key: impl Into<String>) -> Self {
        Self::with_persister(StatePersister::new(storage, key))
    }

    /// Loads the persisted state, if any, and marks the store ready.
    ///
    /// Returns `Ok(true)` when a stored state replaced the current one. The
    /// store is marked ready even when loading fails; the current state is kept.
    pub fn hydrate(&mut self) -> Result<bool, StorageError> {
        let result = match &self.persister {
            Some(persister) => persister.load(),
            None => Ok(None),
        };
        self.hydrated = true;

        match result {
            Ok(Some(mut state)) => {
                state.repair_selection();
                self.state = state;
                info!(
                    workspaces = self.state.workspaces.len(),
                    bookmarks = self.state.bookmarks.len(),
                    "Store rehydrated"
                );
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                warn!(error = %e, "Failed to rehydrate store, keeping current state");
                Err(e)
            }
        }
    }

    /// Whether persisted state has been loaded. Collaborators should defer
    /// rendering until this is true.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Writes the current state through the persister, if there is one.
    pub fn flush(&self) -> Result<(), StorageError> {
        match &self.persister {
            Some(persister) => persister.save(&self.state),
            None => Ok(()),
        }
    }

    /// Registers an observer for applied mutations.
    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    /// Read-only view of the whole state.
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    fn notify(&mut self) {
        for observer in self.observers.iter_mut() {
            observer.state_changed(&self.state);
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn bookmark_mut(&mut self, id: &str) -> Option<&mut Bookmark> {
        self.state.bookmarks.iter_mut().find(|b| b.id == id)
    }

    fn set_status(&mut self, id: &str, status: BookmarkStatus) {
        match self.bookmark_mut(id) {
            Some(bookmark) => {
                bookmark.status = status;
                debug!(bookmark_id = id, ?status, "Bookmark status changed");
                self.notify();
            }
            None => debug!(bookmark_id = id, "Status change ignored: bookmark not found"),
        }
    }

    // ─── Session ───

    pub fn login(&mut self, token: &str) {
        self.state.session = Session {
            auth_status: AuthStatus::Authenticated,
            token: Some(token.to_string()),
        };
        info!("Session authenticated");
        self.notify();
    }

    pub fn logout(&mut self) {
        self.state.session = Session::default();
        info!("Session cleared");
        self.notify();
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.state.session.clone()
    }

    /// Snapshot of the current bearer token.
    pub fn token(&self) -> Option<String> {
        self.state.session.token.clone()
    }

    // ─── Selection ───

    /// Switches workspace and resets the collection selector to "all".
    pub fn set_selected_workspace(&mut self, workspace_id: &str) {
        self.state.selected_workspace = workspace_id.to_string();
        self.state.selected_collection = CollectionSelector::All;
        self.notify();
    }

    pub fn set_selected_collection(&mut self, selector: impl Into<CollectionSelector>) {
        self.state.selected_collection = selector.into();
        self.notify();
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.state.search_query = query.to_string();
        self.notify();
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.state.view_mode = mode;
        self.notify();
    }

    pub fn set_sort_by(&mut self, sort: SortBy) {
        self.state.sort_by = sort;
        self.notify();
    }

    pub fn set_filter_type(&mut self, filter: FilterType) {
        self.state.filter_type = filter;
        self.notify();
    }

    // ─── Bookmarks ───

    pub fn toggle_favorite(&mut self, bookmark_id: &str) {
        if let Some(bookmark) = self.bookmark_mut(bookmark_id) {
            bookmark.is_favorite = !bookmark.is_favorite;
            self.notify();
        }
    }

    pub fn archive_bookmark(&mut self, bookmark_id: &str) {
        self.set_status(bookmark_id, BookmarkStatus::Archived);
    }

    pub fn restore_from_archive(&mut self, bookmark_id: &str) {
        self.set_status(bookmark_id, BookmarkStatus::Active);
    }

    pub fn trash_bookmark(&mut self, bookmark_id: &str) {
        self.set_status(bookmark_id, BookmarkStatus::Trashed);
    }

    pub fn restore_from_trash(&mut self, bookmark_id: &str) {
        self.set_status(bookmark_id, BookmarkStatus::Active);
    }

    /// Removes a bookmark for good.
    pub fn permanently_delete(&mut self, bookmark_id: &str) {
        let before = self.state.bookmarks.len();
        self.state.bookmarks.retain(|b| b.id != bookmark_id);
        if self.state.bookmarks.len() != before {
            debug!(bookmark_id, "Bookmark deleted");
            self.notify();
        }
    }

    /// Shallow-merges `patch` into the bookmark with the given id.
    ///
    /// A patch moving the bookmark into a collection that does not exist is
    /// ignored as a whole.
    pub fn update_bookmark(&mut self, bookmark_id: &str, patch: &BookmarkPatch) {
        if let Some(collection_id) = patch.collection_id.as_deref() {
            if !self.state.collection_exists(collection_id) {
                debug!(bookmark_id, collection_id, "Bookmark not updated: collection not found");
                return;
            }
        }
        if let Some(bookmark) = self.bookmark_mut(bookmark_id) {
            patch.apply_to(bookmark);
            self.notify();
        }
    }

    /// Resolves which collection a new bookmark lands in when the caller did
    /// not name one.
    fn fallback_collection(&self) -> Option<String> {
        if let Some(id) = self.state.selected_collection.collection_id() {
            if self.state.collection_exists(id) {
                return Some(id.to_string());
            }
        }
        if let Some(first) = self
            .state
            .collections
            .iter()
            .find(|c| c.workspace_id == self.state.selected_workspace)
        {
            return Some(first.id.clone());
        }
        if self.state.collection_exists(seed_data::DEFAULT_COLLECTION_ID) {
            return Some(seed_data::DEFAULT_COLLECTION_ID.to_string());
        }
        None
    }

    /// Creates a bookmark and puts it first. Returns the new id, or `None`
    /// when no existing collection could be resolved for it.
    pub fn add_bookmark(&mut self, input: NewBookmark) -> Option<String> {
        let collection_id = match input.collection_id.filter(|id| !id.is_empty()) {
            Some(id) if self.state.collection_exists(&id) => id,
            Some(id) => {
                debug!(collection_id = %id, "Bookmark not added: collection not found");
                return None;
            }
            None => match self.fallback_collection() {
                Some(id) => id,
                None => {
                    debug!("Bookmark not added: no collection available");
                    return None;
                }
            },
        };

        let id = Uuid::new_v4().to_string();
        let bookmark = Bookmark {
            id: id.clone(),
            title: input.title,
            url: input.url,
            description: input.description.unwrap_or_default(),
            favicon: input
                .icon
                .filter(|icon| !icon.is_empty())
                .unwrap_or_else(|| DEFAULT_BOOKMARK_ICON.to_string()),
            collection_id,
            created_at: Self::today(),
            is_favorite: false,
            has_dark_icon: Some(false),
            status: BookmarkStatus::Active,
        };

        debug!(bookmark_id = %id, collection_id = %bookmark.collection_id, "Bookmark added");
        self.state.bookmarks.insert(0, bookmark);
        self.notify();
        Some(id)
    }

    // ─── Collections ───

    /// Creates a collection in an existing workspace. Returns the new id.
    pub fn add_collection(&mut self, input: NewCollection) -> Option<String> {
        if !self.state.workspace_exists(&input.workspace_id) {
            debug!(workspace_id = %input.workspace_id, "Collection not added: workspace not found");
            return None;
        }

        let id = generate_slug_id(&input.name, "collection", |candidate| {
            self.state.collection_exists(candidate)
        });
        self.state.collections.push(Collection {
            id: id.clone(),
            workspace_id: input.workspace_id,
            name: input.name,
            icon: input
                .icon
                .filter(|icon| !icon.is_empty())
                .unwrap_or_else(|| DEFAULT_COLLECTION_ICON.to_string()),
        });
        debug!(collection_id = %id, "Collection added");
        self.notify();
        Some(id)
    }

    /// Removes a collection and every bookmark in it, then resets the
    /// collection selector to "all".
    pub fn delete_collection(&mut self, collection_id: &str) {
        if !self.state.collection_exists(collection_id) {
            return;
        }
        self.state.collections.retain(|c| c.id != collection_id);
        self.state.bookmarks.retain(|b| b.collection_id != collection_id);
        self.state.selected_collection = CollectionSelector::All;
        debug!(collection_id, "Collection deleted");
        self.notify();
    }

    // ─── Workspaces ───

    /// Creates a workspace and selects it. No-op once [`MAX_WORKSPACES`] exist.
    pub fn add_workspace(&mut self, input: NewWorkspace) -> Option<String> {
        if !self.can_add_workspace() {
            debug!("Workspace not added: limit reached");
            return None;
        }

        let id = generate_slug_id(&input.name, "workspace", |candidate| {
            self.state.workspace_exists(candidate)
        });
        self.state.workspaces.push(Workspace {
            id: id.clone(),
            name: input.name,
            icon: DEFAULT_WORKSPACE_ICON.to_string(),
            order_index: self.state.workspaces.len() as u32,
            color: input.color,
        });
        self.state.selected_workspace = id.clone();
        self.state.selected_collection = CollectionSelector::All;
        debug!(workspace_id = %id, "Workspace added");
        self.notify();
        Some(id)
    }

    /// Removes a workspace with all of its collections and their bookmarks.
    /// The last remaining workspace is never deleted.
    pub fn delete_workspace(&mut self, workspace_id: &str) {
        if !self.can_delete_workspace() || !self.state.workspace_exists(workspace_id) {
            return;
        }

        let owned: Vec<String> = self
            .state
            .collections
            .iter()
            .filter(|c| c.workspace_id == workspace_id)
            .map(|c| c.id.clone())
            .collect();

        self.state.workspaces.retain(|w| w.id != workspace_id);
        self.state.collections.retain(|c| c.workspace_id != workspace_id);
        self.state
            .bookmarks
            .retain(|b| !owned.contains(&b.collection_id));

        if self.state.selected_workspace == workspace_id {
            if let Some(first) = self.state.workspaces.first() {
                self.state.selected_workspace = first.id.clone();
            }
            self.state.selected_collection = CollectionSelector::All;
        }

        debug!(workspace_id, collections = owned.len(), "Workspace deleted");
        self.notify();
    }

    pub fn can_add_workspace(&self) -> bool {
        self.state.workspaces.len() < MAX_WORKSPACES
    }

    pub fn can_delete_workspace(&self) -> bool {
        self.state.workspaces.len() > 1
    }

    // ─── Derived views ───

    pub fn get_filtered_bookmarks(&self) -> Vec<Bookmark> {
        bookmark_queries::filtered_bookmarks(&self.state)
    }

    pub fn get_favorite_bookmarks(&self) -> Vec<Bookmark> {
        bookmark_queries::favorite_bookmarks(&self.state)
    }

    pub fn get_archived_bookmarks(&self) -> Vec<Bookmark> {
        bookmark_queries::archived_bookmarks(&self.state)
    }

    pub fn get_trashed_bookmarks(&self) -> Vec<Bookmark> {
        bookmark_queries::trashed_bookmarks(&self.state)
    }

    pub fn collection_bookmark_count(&self, collection_id: &str) -> usize {
        bookmark_queries::collection_bookmark_count(&self.state, collection_id)
    }

    pub fn workspace_stats(&self, workspace_id: &str) -> bookmark_queries::WorkspaceStats {
        bookmark_queries::workspace_stats(&self.state, workspace_id)
    }

    pub fn workspace_collections(&self, workspace_id: &str) -> Vec<Collection> {
        bookmark_queries::workspace_collections(&self.state, workspace_id)
            .into_iter()
            .cloned()
            .collect()
    }
}

impl Default for BookmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercases `name` and collapses whitespace runs into single dashes.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Builds `<slug>-<4 random chars>`, retrying until `taken` rejects nothing.
fn generate_slug_id(name: &str, fallback: &str, taken: impl Fn(&str) -> bool) -> String {
    let slug = match slugify(name) {
        s if s.is_empty() => fallback.to_string(),
        s => s,
    };
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let candidate = format!("{}-{}", slug, &suffix[..4]);
        if !taken(&candidate) {
            return candidate;
        }
    }
}
