//! daylist: personal daily to-do list server.
//!
//! CRUD over a hierarchical task list grouped by calendar day, a key/value
//! settings store, and a Glean search integration for importing Slack
//! action items as todos.

pub mod api;
pub mod client;
pub mod db;
pub mod error;
pub mod glean;
pub mod store;
pub mod types;
