//! Pending-login state keyed by the OAuth `state` parameter.
//!
//! Each outgoing login redirect persists a [`PendingLoginState`] so the
//! eventual callback - which arrives after a full page reload - can be
//! correlated back to the redirect that started it. Entries are consumed
//! exactly once and purged after a retention window, never resurrected.

use crate::storage::{SessionStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Store key for the pending-login document.
const PENDING_LOGIN_KEY: &str = "spa.login.pending";

/// Entries older than this are stale and eligible for purging.
const RETENTION_MINUTES: i64 = 5;

/// Correlation data persisted when a login redirect starts.
#[derive(Clone, Serialize, Deserialize)]
pub struct PendingLoginState {
    /// The OAuth `state` value correlating redirect and callback.
    pub state: String,

    /// The PKCE code verifier matching the challenge sent on the redirect.
    pub code_verifier: String,

    /// The app location (hash/path) to restore after login completes.
    pub return_location: String,

    /// When the redirect was started.
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for PendingLoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoginState")
            .field("state", &self.state)
            .field("code_verifier", &"[REDACTED]")
            .field("return_location", &self.return_location)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl PendingLoginState {
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::minutes(RETENTION_MINUTES)
    }
}

/// Persists pending-login entries across a full page navigation.
#[derive(Clone)]
pub struct RedirectStateStore {
    store: Arc<dyn SessionStore>,
}

impl RedirectStateStore {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Persist a new pending-login entry.
    ///
    /// Stale entries from abandoned logins are purged on the way through so
    /// the document cannot grow without bound.
    pub fn save(&self, entry: PendingLoginState) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut entries = self.load()?;
        entries.retain(|_, existing| !existing.is_stale(now));
        entries.insert(entry.state.clone(), entry);
        self.persist(&entries)
    }

    /// Consume the entry for a `state` value, exactly once.
    ///
    /// Returns `None` for unknown, replayed, or stale states; a stale entry
    /// is removed but never returned.
    pub fn consume(&self, state: &str) -> Result<Option<PendingLoginState>, StoreError> {
        let now = Utc::now();
        let mut entries = self.load()?;

        let taken = entries.remove(state);
        entries.retain(|_, existing| !existing.is_stale(now));
        self.persist(&entries)?;

        match taken {
            Some(entry) if entry.is_stale(now) => {
                tracing::debug!(
                    target: "spa.session",
                    "Discarding stale pending-login entry"
                );
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn load(&self) -> Result<HashMap<String, PendingLoginState>, StoreError> {
        match self.store.get(PENDING_LOGIN_KEY)? {
            None => Ok(HashMap::new()),
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))
            }
        }
    }

    fn persist(&self, entries: &HashMap<String, PendingLoginState>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return self.store.remove(PENDING_LOGIN_KEY);
        }
        let raw =
            serde_json::to_string(entries).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.put(PENDING_LOGIN_KEY, &raw)
    }
}

// =============================================================================
// Tests
// =============================================================================
