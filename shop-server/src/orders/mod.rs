//! Order lifecycle
//!
//! Status changes happen only through [`apply_transition`], which issues a
//! single conditional write guarded by `(id, restaurant_id, status)`.

mod lifecycle;

pub use lifecycle::{OrderStore, OrderTransition, apply_transition};
