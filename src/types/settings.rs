use serde::{Deserialize, Serialize};

/// Default API base URL (local development server).
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3008/api";

/// Key the whole store state is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "bookmarks-storage";

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Route the client is sent to when the session cannot be recovered.
    #[serde(default = "default_landing_route")]
    pub landing_route: String,
    /// Directory for the state database. `None` means the platform data dir.
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_landing_route() -> String {
    "/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            storage_key: default_storage_key(),
            landing_route: default_landing_route(),
            data_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
