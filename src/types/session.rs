use serde::{Deserialize, Serialize};

/// Whether the user has a bearer token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    #[default]
    Guest,
    Authenticated,
}

/// Process-wide session state. Only `login`/`logout` on the store write it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub auth_status: AuthStatus,
    pub token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.auth_status == AuthStatus::Authenticated && self.token.is_some()
    }
}
