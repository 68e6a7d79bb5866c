// Markstash services
// Services provide the outward-facing pieces: state persistence, the authenticated API client,
// session flows, and configuration.

pub mod api_client;
pub mod auth_flow;
pub mod settings_engine;
pub mod state_storage;
