//! Session lifecycle manager.
//!
//! Owns the bearer credential, keeps it in sync with the persistence store,
//! auto-revokes it when its validity elapses, and wraps outbound requests
//! with the `Authorization` header. Constructed once at startup and passed
//! (or cheaply cloned) into every consumer; there is no global session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiError, AuthClient};
use crate::store::{CredentialStore, CREDENTIAL_KEY};

/// Grant validity in seconds when the login response omits `expires_in`.
/// Matches the server's default one-hour grant.
const DEFAULT_VALIDITY_SECS: u64 = 3600;

/// Validity assumed for a credential found in the store at startup.
/// The original countdown is not persisted, only the token, so this is a
/// guess on the short side of the server's one-hour default: a premature
/// logout is the failure mode chosen over an unbounded stale session.
const RELOAD_VALIDITY_SECS: u64 = 3300;

struct SessionState {
    /// Opaque bearer token, absent while anonymous.
    credential: Option<String>,
    /// At most one pending auto-revocation task; armed only while a
    /// credential is present. Re-arming always aborts the old handle first.
    expiry_timer: Option<JoinHandle<()>>,
    /// Bumped on every credential change. An expiry task records the
    /// generation it was armed for and revokes nothing if a later login or
    /// logout has moved the session past it; abort alone cannot stop a task
    /// that already woke up.
    generation: u64,
}

struct Shared {
    state: Mutex<SessionState>,
    store: Arc<dyn CredentialStore>,
}

/// The session manager. Clone is cheap - state is behind an `Arc`, and the
/// HTTP client pools connections internally.
#[derive(Clone)]
pub struct SessionManager {
    client: AuthClient,
    shared: Arc<Shared>,
}

impl SessionManager {
    pub fn new(client: AuthClient, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    credential: None,
                    expiry_timer: None,
                    generation: 0,
                }),
                store,
            }),
        }
    }

    /// Rehydrate the session from the store at process start.
    ///
    /// A stored credential yields an authenticated session with an expiry
    /// timer armed for the conservative reload fallback. Must be called from
    /// within the runtime; call it once, before any other operation.
    pub fn initialize(&self) {
        match self.shared.store.get(CREDENTIAL_KEY) {
            Ok(Some(token)) => {
                let mut state = Self::lock_state(&self.shared);
                state.credential = Some(token);
                state.generation += 1;
                Self::arm_timer(
                    &mut state,
                    &self.shared,
                    Duration::from_secs(RELOAD_VALIDITY_SECS),
                );
                info!(
                    "restored session from store, auto-logout in {}s",
                    RELOAD_VALIDITY_SECS
                );
            }
            Ok(None) => debug!("no stored credential, starting anonymous"),
            Err(e) => warn!(error = %e, "credential store unreadable, starting anonymous"),
        }
    }

    /// Create an account. True iff the service accepted it; whatever its
    /// acceptance criteria are stays server-side. Never touches the session:
    /// a follow-up `login` is required even right after success.
    pub async fn register(&self, username: &str, password: &str) -> bool {
        match self.client.register(username, password).await {
            Ok(()) => true,
            Err(e) => {
                debug!(username, error = %e, "registration rejected");
                false
            }
        }
    }

    /// Authenticate. On success the credential is persisted, set in memory,
    /// and an expiry timer armed, under a single hold of the state lock with
    /// no await point between the three steps. On any rejection or transport
    /// failure nothing changes and the caller gets `false`.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let grant = match self.client.login(username, password).await {
            Ok(grant) => grant,
            Err(e) => {
                debug!(username, error = %e, "login rejected");
                return false;
            }
        };

        // The service must issue a credential on success; a blank one is a
        // contract violation, not an authenticated session.
        if grant.access_token.is_empty() {
            warn!("login response carried an empty access token, treating as failure");
            return false;
        }
        if grant.expires_in.is_none() {
            warn!(
                "login response omitted expires_in, using {}s default",
                DEFAULT_VALIDITY_SECS
            );
        }

        self.establish(grant.access_token, Self::grant_validity(grant.expires_in));
        info!(username, "session established");
        true
    }

    /// Revoke the session. Idempotent; this is the single revocation path,
    /// shared by explicit logout, timer expiry, and forced logout after a
    /// stale-credential response.
    pub fn logout(&self) {
        Self::revoke(&self.shared);
    }

    /// Send a request, attaching `Authorization: Bearer <token>` when a
    /// credential is present and passing the call through untouched
    /// otherwise. The response is not interpreted here: what a 401 means is
    /// the caller's policy, since this wrapper cannot know which calls were
    /// expected to need auth.
    pub async fn request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let builder = match self.credential() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        Ok(builder.send().await?)
    }

    /// Current credential, if any.
    pub fn credential(&self) -> Option<String> {
        Self::lock_state(&self.shared).credential.clone()
    }

    /// Observable presence bit consumers gate protected surfaces on.
    pub fn is_authenticated(&self) -> bool {
        Self::lock_state(&self.shared).credential.is_some()
    }

    /// The underlying pooled HTTP client, for building requests to pass to
    /// [`SessionManager::request`].
    pub fn http(&self) -> &reqwest::Client {
        self.client.http()
    }

    /// Absolute URL for an API path like `/api/employees`.
    pub fn endpoint(&self, path: &str) -> String {
        self.client.endpoint(path)
    }

    fn grant_validity(expires_in: Option<u64>) -> Duration {
        Duration::from_secs(expires_in.unwrap_or(DEFAULT_VALIDITY_SECS))
    }

    /// Install a new credential: persist, update memory, arm the timer, all
    /// under one hold of the state lock so neither a firing timer nor any
    /// other operation can observe the three steps half done. A store
    /// failure degrades to a memory-only session (lost on restart) instead
    /// of failing the login.
    fn establish(&self, token: String, validity: Duration) {
        let mut state = Self::lock_state(&self.shared);
        if let Err(e) = self.shared.store.set(CREDENTIAL_KEY, &token) {
            warn!(error = %e, "credential store unavailable, session will not survive a restart");
        }
        state.credential = Some(token);
        state.generation += 1;
        Self::arm_timer(&mut state, &self.shared, validity);
    }

    /// Replace the pending expiry timer with one firing after `validity`.
    /// The old handle is aborted before the new task is spawned, so two
    /// concurrent timers never exist. Caller holds the state lock.
    fn arm_timer(state: &mut SessionState, shared: &Arc<Shared>, validity: Duration) {
        if let Some(old) = state.expiry_timer.take() {
            old.abort();
        }
        let armed_for = state.generation;
        let weak = Arc::downgrade(shared);
        state.expiry_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(validity).await;
            if let Some(shared) = weak.upgrade() {
                SessionManager::revoke_expired(&shared, armed_for);
            }
        }));
    }

    fn revoke(shared: &Shared) {
        Self::revoke_inner(shared, None);
    }

    /// Expiry-driven revocation: only acts if the session is still the one
    /// the timer was armed for. A timer that woke up while a re-login was
    /// in flight finds the generation moved on and leaves the new session
    /// alone; its replacement timer owns expiry from here.
    fn revoke_expired(shared: &Shared, armed_for: u64) {
        Self::revoke_inner(shared, Some(armed_for));
    }

    fn revoke_inner(shared: &Shared, armed_for: Option<u64>) {
        let mut state = Self::lock_state(shared);
        if let Some(generation) = armed_for {
            if state.generation != generation {
                debug!("stale expiry timer fired after re-login, ignoring");
                return;
            }
            info!("credential validity elapsed, revoking session");
        }
        if let Some(timer) = state.expiry_timer.take() {
            timer.abort();
        }
        let was_authenticated = state.credential.take().is_some();
        state.generation += 1;
        // Clear the store before releasing the lock so memory and store
        // never disagree at an observable point.
        if let Err(e) = shared.store.remove(CREDENTIAL_KEY) {
            warn!(error = %e, "failed to clear stored credential");
        }
        drop(state);

        if was_authenticated {
            info!("session revoked");
        }
    }

    fn lock_state(shared: &Shared) -> MutexGuard<'_, SessionState> {
        // A poisoned lock only means a panic elsewhere; session state is
        // still coherent enough to read or clear.
        shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn timer_armed(&self) -> bool {
        Self::lock_state(&self.shared).expiry_timer.is_some()
    }
}
