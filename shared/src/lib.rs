//! Shared types for the shop API
//!
//! Error types, wire models and small utilities used by the server and by
//! any Rust client of it.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
