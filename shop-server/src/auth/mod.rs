//! Magic-link authentication, sessions and request throttling

pub mod link;
pub mod rate_limit;
pub mod session;

pub use link::AuthLinkStore;
pub use session::SessionIdentity;
