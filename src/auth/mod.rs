//! Session lifecycle: credential state, expiry, authenticated requests.

mod manager;

pub use manager::SessionManager;
