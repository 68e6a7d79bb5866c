//! Session flows around the opaque bearer-token API: registration, the
//! startup session check, and the `?token=` callback handed back by the
//! external sign-in page.

use std::sync::Arc;

use reqwest::Url;
use serde_json::json;
use tracing::{info, warn};

use crate::services::api_client::{
    ApiRequest, AuthClient, SessionAccess, CHECK_STATUS_PATH, REGISTER_PATH,
};
use crate::types::errors::ApiError;

/// Query parameter carrying the token on the sign-in callback URL.
pub const TOKEN_PARAM: &str = "token";

/// Outcome of [`AuthFlow::check_session`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCheck {
    /// No session to check; no request was made.
    Guest,
    /// The server issued a fresh token and it was stored.
    Refreshed,
    /// The session could not be renewed and has been cleared.
    Expired(ApiError),
}

pub struct AuthFlow {
    client: Arc<AuthClient>,
    session: Arc<dyn SessionAccess>,
}

impl AuthFlow {
    pub fn new(client: Arc<AuthClient>, session: Arc<dyn SessionAccess>) -> Self {
        Self { client, session }
    }

    /// Creates an account and logs in with the returned token.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<String, ApiError> {
        let mut body = json!({ "email": email, "password": password });
        if let Some(name) = full_name.filter(|n| !n.is_empty()) {
            body["fullName"] = json!(name);
        }
        let response = self.client.send(ApiRequest::post(REGISTER_PATH, body)).await?;
        let token = response.token()?;
        self.session.login(&token);
        info!("Registered new account");
        Ok(token)
    }

    /// Renews the token of an authenticated session. Any failure logs out.
    pub async fn check_session(&self) -> SessionCheck {
        if !self.session.session().is_authenticated() {
            return SessionCheck::Guest;
        }

        let result = match self.client.send(ApiRequest::get(CHECK_STATUS_PATH)).await {
            Ok(response) => response.token(),
            Err(e) => Err(e),
        };

        match result {
            Ok(token) => {
                self.session.login(&token);
                SessionCheck::Refreshed
            }
            Err(e) => {
                warn!(error = %e, "Session check failed, logging out");
                self.session.logout();
                SessionCheck::Expired(e)
            }
        }
    }

    /// Logs in with the `token` query parameter of `url`, if present.
    ///
    /// Returns `url` without the parameter so it can replace the visible
    /// address, or `None` when there was no usable token.
    pub fn handle_auth_callback(&self, url: &str) -> Option<String> {
        let (token, cleaned) = strip_token_param(url)?;
        self.session.login(&token);
        info!("Logged in from callback URL");
        Some(cleaned)
    }
}

/// Splits the token out of a callback URL.
pub fn strip_token_param(url: &str) -> Option<(String, String)> {
    let mut parsed = Url::parse(url).ok()?;
    let token = parsed
        .query_pairs()
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())?;

    let remaining: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != TOKEN_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    parsed.set_query(None);
    if !remaining.is_empty() {
        parsed.query_pairs_mut().extend_pairs(remaining);
    }
    Some((token, parsed.to_string()))
}
