use serde::{Deserialize, Serialize};

/// Top-level namespace grouping collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub order_index: u32,
    pub color: String,
}

/// A named folder of bookmarks, owned by exactly one workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub icon: String,
}

/// Input for creating a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollection {
    pub name: String,
    pub workspace_id: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Input for creating a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkspace {
    pub name: String,
    pub color: String,
}
