//! Conversation session cache.
//!
//! `SessionStore` owns every conversation; `SessionManager` runs turns
//! against an `InferenceBackend` and keeps the store lock off the
//! network path.

mod manager;
mod store;
mod types;

#[cfg(test)]
mod tests;

pub use manager::SessionManager;
pub use store::SessionStore;
pub use types::SessionInfo;
