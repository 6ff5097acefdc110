//! Session identity, storage, and the manager owning the live set.

mod id;
mod manager;
mod model;
mod persistence;

pub use id::SessionId;
pub use manager::{now_unix, SessionError, SessionManager, SortBy, SortOrder};
pub use model::Session;
pub use persistence::{FsPersistence, Persistence, PersistenceError};
