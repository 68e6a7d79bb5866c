use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a bookmark. Decides which derived view shows it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkStatus {
    #[default]
    Active,
    Archived,
    Trashed,
}

/// Represents a saved link.
///
/// `created_at` is fixed when the bookmark is created and serializes as a
/// `YYYY-MM-DD` string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub favicon: String,
    pub collection_id: String,
    pub created_at: NaiveDate,
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_dark_icon: Option<bool>,
    pub status: BookmarkStatus,
}

impl Bookmark {
    /// Case-insensitive substring match against title, description and url.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.url.to_lowercase().contains(needle)
    }
}

/// Input for creating a bookmark.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewBookmark {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn in_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection_id = Some(collection_id.into());
        self
    }
}

/// Partial update for an existing bookmark. `None` fields are left untouched.
///
/// `id` and `created_at` are not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub has_dark_icon: Option<bool>,
    #[serde(default)]
    pub status: Option<BookmarkStatus>,
}

impl BookmarkPatch {
    /// Shallow-merges the provided fields into `bookmark`.
    pub fn apply_to(&self, bookmark: &mut Bookmark) {
        if let Some(title) = &self.title {
            bookmark.title = title.clone();
        }
        if let Some(url) = &self.url {
            bookmark.url = url.clone();
        }
        if let Some(description) = &self.description {
            bookmark.description = description.clone();
        }
        if let Some(favicon) = &self.favicon {
            bookmark.favicon = favicon.clone();
        }
        if let Some(collection_id) = &self.collection_id {
            bookmark.collection_id = collection_id.clone();
        }
        if let Some(is_favorite) = self.is_favorite {
            bookmark.is_favorite = is_favorite;
        }
        if let Some(has_dark_icon) = self.has_dark_icon {
            bookmark.has_dark_icon = Some(has_dark_icon);
        }
        if let Some(status) = self.status {
            bookmark.status = status;
        }
    }
}
