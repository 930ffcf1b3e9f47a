//! Remote auth service surface: wire client and error taxonomy.

mod client;
mod error;

pub use client::{AuthClient, LoginGrant};
pub use error::ApiError;
