//! Cookie-backed sessions — identity, middleware, and the per-session store.

pub mod id;
pub mod middleware;
pub mod store;

pub use id::SessionId;
pub use middleware::{SESSION_COOKIE_NAME, SessionLayer};
pub use store::{CollectionStore, MemoryStore};
