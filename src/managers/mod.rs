// Markstash state managers
// The bookmark store owns all client state; the query layer derives the views rendered from it.

pub mod bookmark_queries;
pub mod bookmark_store;
pub mod seed_data;
