//! UI-selection state types: view mode, sort order, filter and the
//! collection selector.
//!
//! Each enum keeps the string form the web client used (`"date-newest"`,
//! `"favorites"`, ...) both for serde and for `FromStr`/`Display`, so the
//! persisted state and the RPC surface share one vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ParseOptionError;

/// Sentinel for "every collection in the selected workspace".
pub const ALL_COLLECTIONS: &str = "all";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
        }
    }
}

impl FromStr for ViewMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            other => Err(ParseOptionError::new("view mode", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    #[serde(rename = "date-newest")]
    DateNewest,
    #[serde(rename = "date-oldest")]
    DateOldest,
    #[serde(rename = "alpha-az")]
    AlphaAz,
    #[serde(rename = "alpha-za")]
    AlphaZa,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [
        SortBy::DateNewest,
        SortBy::DateOldest,
        SortBy::AlphaAz,
        SortBy::AlphaZa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::DateNewest => "date-newest",
            SortBy::DateOldest => "date-oldest",
            SortBy::AlphaAz => "alpha-az",
            SortBy::AlphaZa => "alpha-za",
        }
    }
}

impl FromStr for SortBy {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortBy::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .ok_or_else(|| ParseOptionError::new("sort order", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    All,
    Favorites,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::All => "all",
            FilterType::Favorites => "favorites",
        }
    }
}

impl FromStr for FilterType {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FilterType::All),
            "favorites" => Ok(FilterType::Favorites),
            other => Err(ParseOptionError::new("filter", other)),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which collection the main view is narrowed to.
///
/// Serialized as the plain string `"all"` or the collection id. Any id is
/// accepted; an unknown id simply yields empty views.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CollectionSelector {
    #[default]
    All,
    Collection(String),
}

impl CollectionSelector {
    pub fn collection_id(&self) -> Option<&str> {
        match self {
            CollectionSelector::All => None,
            CollectionSelector::Collection(id) => Some(id),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, CollectionSelector::All)
    }
}

impl From<String> for CollectionSelector {
    fn from(value: String) -> Self {
        if value == ALL_COLLECTIONS {
            CollectionSelector::All
        } else {
            CollectionSelector::Collection(value)
        }
    }
}

impl From<&str> for CollectionSelector {
    fn from(value: &str) -> Self {
        CollectionSelector::from(value.to_string())
    }
}

impl From<CollectionSelector> for String {
    fn from(value: CollectionSelector) -> Self {
        match value {
            CollectionSelector::All => ALL_COLLECTIONS.to_string(),
            CollectionSelector::Collection(id) => id,
        }
    }
}

impl fmt::Display for CollectionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionSelector::All => f.write_str(ALL_COLLECTIONS),
            CollectionSelector::Collection(id) => f.write_str(id),
        }
    }
}
