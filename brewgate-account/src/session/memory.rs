//! In-memory session store
//!
//! Backed by a concurrent map, so readers and writers need no external
//! synchronization. Expiry is enforced twice over: reads drop entries whose
//! instant has passed, and a single periodic sweep evicts everything the
//! reads never touched. One sweep task serves the whole store regardless of
//! session count.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

use super::{SessionError, SessionStore};
use crate::account::SharedAccount;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct SessionEntry {
    account: SharedAccount,
    expires_at: DateTime<Utc>,
}

pub struct MemorySessionStore {
    entries: Arc<DashMap<String, SessionEntry>>,
    sweeper: JoinHandle<()>,
}

impl MemorySessionStore {
    /// Creates a store sweeping at the default interval.
    ///
    /// Must be called from within a tokio runtime, which owns the sweep task.
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        let entries: Arc<DashMap<String, SessionEntry>> = Arc::new(DashMap::new());

        let sweep_entries = Arc::clone(&entries);
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let now = Utc::now();
                let before = sweep_entries.len();
                sweep_entries.retain(|_, entry| entry.expires_at > now);
                // concurrent inserts during the sweep can push len back up
                let evicted = before.saturating_sub(sweep_entries.len());
                if evicted > 0 {
                    trace!(evicted, remaining = sweep_entries.len(), "swept expired sessions");
                }
            }
        });

        Self { entries, sweeper }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemorySessionStore {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("sessions", &self.entries.len())
            .finish()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(
        &self,
        session: SharedAccount,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        self.entries.insert(
            token.to_string(),
            SessionEntry {
                account: session,
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<SharedAccount, SessionError> {
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let expired = match self.entries.get(token) {
            None => return Err(SessionError::SessionNotExists),
            Some(entry) => {
                if entry.expires_at > Utc::now() {
                    return Ok(Arc::clone(&entry.account));
                }
                true
            }
        };

        // the guard is released above; evict the stale entry before reporting
        if expired {
            self.entries
                .remove_if(token, |_, entry| entry.expires_at <= Utc::now());
        }
        Err(SessionError::SessionNotExists)
    }

    async fn remove(&self, token: &str) -> Result<(), SessionError> {
        self.entries.remove(token);
        Ok(())
    }
}
