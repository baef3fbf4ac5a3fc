//! Database access layer
//!
//! All restaurant data queries take the caller's `restaurant_id` and filter
//! on it; nothing here trusts an id on its own.

pub mod auth_links;
pub mod metrics;
pub mod orders;
pub mod restaurants;
pub mod users;
