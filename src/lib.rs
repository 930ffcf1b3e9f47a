//! staffdir - client library for the Employee-Directory API.
//!
//! The heart of the crate is [`SessionManager`]: it acquires a bearer
//! credential from the auth endpoints, persists it through a
//! [`store::CredentialStore`], revokes it automatically when its validity
//! elapses, and produces authenticated requests for everything else. The
//! [`Directory`] collaborator builds the employee calls on top of it.

pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod models;
pub mod store;

pub use api::{ApiError, AuthClient};
pub use auth::SessionManager;
pub use config::Config;
pub use directory::Directory;
