// Markstash shared type definitions
// Each submodule defines types used across the store, the query layer and the API client.

pub mod bookmark;
pub mod errors;
pub mod session;
pub mod settings;
pub mod view;
pub mod workspace;
