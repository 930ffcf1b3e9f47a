//! Durable key/value storage for the session credential.
//!
//! The session manager is the sole writer; it uses a single fixed key
//! ([`CREDENTIAL_KEY`]). Two implementations exist: [`FileStore`] persists
//! across process restarts, [`MemoryStore`] backs tests and the memory-only
//! fallback when disk storage is unavailable.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use anyhow::Result;

/// Storage key under which the bearer credential lives.
pub const CREDENTIAL_KEY: &str = "token";

/// Synchronous key/value surface surviving process restarts.
///
/// Operations are cheap enough to call inline from the session manager's
/// single-threaded mutation sequence; no locking beyond the implementation's
/// own is required.
pub trait CredentialStore: Send + Sync {
    /// Read a stored value, `None` if the key was never set or was removed.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
