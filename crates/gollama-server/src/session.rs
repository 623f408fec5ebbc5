//! Session store: maps session IDs to conversation histories.
//!
//! The id map sits behind one exclusive lock; each session's messages sit
//! behind their own reader/writer lock so snapshots don't serialize.
//! Sessions idle longer than the TTL are removed by [`SessionStore::sweep`],
//! which [`SessionStore::spawn_reaper`] runs periodically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gollama_ai::Message;
use gollama_common::new_session_id;
use gollama_config::SYSTEM_PROMPT;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

struct Session {
    messages: RwLock<Vec<Message>>,
    /// Milliseconds since the store's epoch.
    last_active: AtomicU64,
}

impl Session {
    fn touch(&self, now: u64) {
        self.last_active.store(now, Ordering::Relaxed);
    }
}

struct Inner {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    epoch: Instant,
    system_prompt: String,
}

/// Result of [`SessionStore::get_or_create`].
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: String,
    pub messages: Vec<Message>,
    pub created: bool,
}

/// Thread-safe session store. Clones share the same sessions.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_system_prompt(SYSTEM_PROMPT)
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: Mutex::new(HashMap::new()),
                epoch: Instant::now(),
                system_prompt: prompt.into(),
            }),
        }
    }

    fn now(&self) -> u64 {
        u64::try_from(self.inner.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Look up `id`, creating the session if it doesn't exist. An empty id
    /// mints a fresh random one. Refreshes the session's activity time.
    pub async fn get_or_create(&self, id: &str) -> SessionSnapshot {
        let now = self.now();
        let (id, session, created) = {
            let mut map = self.inner.sessions.lock().await;

            let id = if id.is_empty() {
                let mut fresh = new_session_id();
                while map.contains_key(&fresh) {
                    fresh = new_session_id();
                }
                fresh
            } else {
                id.to_string()
            };

            match map.get(&id) {
                Some(session) => {
                    session.touch(now);
                    (id, session.clone(), false)
                }
                None => {
                    let session = Arc::new(Session {
                        messages: RwLock::new(vec![Message::system(
                            self.inner.system_prompt.clone(),
                        )]),
                        last_active: AtomicU64::new(now),
                    });
                    map.insert(id.clone(), session.clone());
                    info!(session = %id, sessions = map.len(), "Session created");
                    (id, session, true)
                }
            }
        };

        let messages = session.messages.read().await.clone();
        SessionSnapshot {
            id,
            messages,
            created,
        }
    }

    async fn find(&self, id: &str) -> Option<Arc<Session>> {
        self.inner.sessions.lock().await.get(id).cloned()
    }

    /// Append one message. A no-op if the session was reclaimed.
    pub async fn append(&self, id: &str, message: Message) {
        self.append_all(id, vec![message]).await;
    }

    /// Append messages as one unit: readers see all of them or none.
    /// A no-op if the session was reclaimed.
    pub async fn append_all(&self, id: &str, messages: Vec<Message>) {
        let Some(session) = self.find(id).await else {
            debug!(session = %id, count = messages.len(), "Append to reclaimed session dropped");
            return;
        };
        session.messages.write().await.extend(messages);
        session.touch(self.now());
    }

    /// Copy of the session's messages, or `None` if it doesn't exist.
    pub async fn snapshot(&self, id: &str) -> Option<Vec<Message>> {
        let session = self.find(id).await?;
        let messages = session.messages.read().await.clone();
        Some(messages)
    }

    /// Remove sessions idle for longer than `ttl`. Returns how many were removed.
    pub async fn sweep(&self, ttl: Duration) -> usize {
        let now = self.now();
        let ttl = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let mut map = self.inner.sessions.lock().await;
        let before = map.len();
        map.retain(|id, session| {
            let idle = now.saturating_sub(session.last_active.load(Ordering::Relaxed));
            let stale = idle > ttl;
            if stale {
                info!(session = %id, idle_secs = idle / 1000, "Reclaiming idle session");
            }
            !stale
        });
        before - map.len()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.sessions.lock().await.contains_key(id)
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.inner.sessions.lock().await.len()
    }

    /// Run [`sweep`](Self::sweep) every `interval` until `shutdown` fires.
    pub fn spawn_reaper(
        &self,
        interval: Duration,
        ttl: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let removed = store.sweep(ttl).await;
                let count = store.count().await;
                debug!(removed, sessions = count, "Reaper tick");
            }
            debug!("Reaper stopped");
        })
    }
}
