//! Session lifecycle and message operations: owns the LRU cache, arbitrates
//! its mutex, and dispatches persistence without blocking cache-critical
//! sections on I/O.
//!
//! Persistence dispatch uses a single long-lived worker task fed by an
//! unbounded channel rather than one spawned task per operation. This gives
//! the ordering guarantee in §5 for free — the worker drains operations
//! strictly in send order — while keeping dispatch itself synchronous and
//! non-blocking, which is what lets the LRU eviction callback (itself
//! synchronous, per §4.3) schedule a `save_full_context` write without
//! awaiting inside the cache's critical section.

use crate::cache::SessionCache;
use crate::{Error, Message, PersistenceStore, Result, SessionState};
use futures::future::{FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

type HydrationFuture = Shared<Pin<Box<dyn Future<Output = Result<(), Arc<Error>>> + Send>>>;

enum PersistenceOp {
    SetSystemPrompt(String, String),
    AppendMessage(String, Message),
    SaveFullContext(String, Option<String>, Vec<Message>),
    ClearMessages(String),
    DeleteSession(String),
}

struct Inner {
    cache: SessionCache,
    current: Option<String>,
}

pub struct MemoryManager {
    store: Arc<dyn PersistenceStore>,
    state: Arc<Mutex<Inner>>,
    in_flight: Mutex<HashMap<String, HydrationFuture>>,
    background: std::sync::Mutex<JoinSet<()>>,
    persistence_tx: mpsc::UnboundedSender<PersistenceOp>,
}

impl MemoryManager {
    pub fn new(store: Arc<dyn PersistenceStore>, capacity: NonZeroUsize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<PersistenceOp>();

        let mut background = JoinSet::new();
        background.spawn(Self::run_persistence_worker(store.clone(), rx));

        let tx_for_evict = tx.clone();
        let cache = SessionCache::with_eviction_callback(
            capacity,
            Arc::new(move |id, state: SessionState| {
                let _ = tx_for_evict.send(PersistenceOp::SaveFullContext(
                    id,
                    state.system_prompt,
                    state.messages,
                ));
            }),
        );

        Self {
            store,
            state: Arc::new(Mutex::new(Inner {
                cache,
                current: None,
            })),
            in_flight: Mutex::new(HashMap::new()),
            background: std::sync::Mutex::new(background),
            persistence_tx: tx,
        }
    }

    async fn run_persistence_worker(
        store: Arc<dyn PersistenceStore>,
        mut rx: mpsc::UnboundedReceiver<PersistenceOp>,
    ) {
        while let Some(op) = rx.recv().await {
            match op {
                PersistenceOp::SetSystemPrompt(id, prompt) => {
                    if let Err(e) = store.set_system_prompt(&id, prompt).await {
                        tracing::error!(session_id = %id, error = %e, "failed to persist system prompt");
                    }
                }
                PersistenceOp::AppendMessage(id, message) => {
                    if let Err(e) = store.append_message(&id, message).await {
                        tracing::error!(session_id = %id, error = %e, "failed to persist appended message");
                    }
                }
                PersistenceOp::SaveFullContext(id, prompt, messages) => {
                    if let Err(e) = store.save_full_context(&id, prompt, messages).await {
                        tracing::error!(session_id = %id, error = %e, "failed to persist full context on eviction");
                    }
                }
                PersistenceOp::ClearMessages(id) => {
                    if let Err(e) = store.clear_messages(&id).await {
                        tracing::error!(session_id = %id, error = %e, "failed to persist cleared messages");
                    }
                }
                PersistenceOp::DeleteSession(id) => {
                    if let Err(e) = store.delete_session(&id).await {
                        tracing::error!(session_id = %id, error = %e, "failed to persist session deletion");
                    }
                }
            }
        }
    }

    fn dispatch(&self, op: PersistenceOp) {
        let _ = self.persistence_tx.send(op);
    }

    /// If `id` is not cached, starts or joins the single in-flight hydration
    /// task for it and awaits it; otherwise a no-op.
    pub async fn preload(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.cache.contains(id) {
                return Ok(());
            }
        }
        self.hydrate(id).await
    }

    /// Starts (or joins) the single hydration task for `id`: loads system
    /// prompt and messages from storage and installs them into the cache.
    /// Concurrent callers for the same `id` share one load and one install.
    async fn hydrate(&self, id: &str) -> Result<()> {
        let fut = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(existing) = in_flight.get(id) {
                existing.clone()
            } else {
                let id_owned = id.to_string();
                let store = self.store.clone();
                let state = self.state.clone();
                let future: Pin<Box<dyn Future<Output = Result<(), Arc<Error>>> + Send>> =
                    Box::pin(async move {
                        let result = Self::load_and_install(&store, &state, &id_owned).await;
                        if let Err(e) = &result {
                            tracing::warn!(session_id = %id_owned, error = %e, "hydration failed");
                        }
                        result.map_err(Arc::new)
                    });
                let shared = future.shared();
                in_flight.insert(id.to_string(), shared.clone());
                shared
            }
        };

        let result = fut.await;
        self.in_flight.lock().await.remove(id);
        result.map_err(|arc_err| Error::io(arc_err.to_string()))
    }

    async fn load_and_install(
        store: &Arc<dyn PersistenceStore>,
        state: &Arc<Mutex<Inner>>,
        id: &str,
    ) -> Result<()> {
        let system_prompt = store.get_system_prompt(id).await?;
        let messages = store.get_messages(id, -1).await?;
        let mut state = state.lock().await;
        if !state.cache.contains(id) {
            state.cache.put(
                id.to_string(),
                SessionState {
                    system_prompt,
                    messages,
                    ..SessionState::default()
                },
            );
        }
        Ok(())
    }

    /// Ensures a `SessionState` exists for `id`, optionally setting its
    /// system prompt.
    pub async fn create(&self, id: &str, system_prompt: Option<String>) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if !state.cache.contains(id) {
                state.cache.put(id.to_string(), SessionState::default());
            }
            if let Some(prompt) = &system_prompt {
                if let Some(session) = state.cache.get_mut(id) {
                    session.system_prompt = Some(prompt.clone());
                }
            }
        }
        if let Some(prompt) = system_prompt {
            self.dispatch(PersistenceOp::SetSystemPrompt(id.to_string(), prompt));
        }
        Ok(())
    }

    /// Updates the current-session pointer, preloading first if necessary so
    /// the pointer never names a session absent from the cache.
    pub async fn switch_to(&self, id: &str) -> Result<()> {
        let cached = {
            let mut state = self.state.lock().await;
            state.cache.contains(id)
        };
        if !cached {
            self.preload(id).await?;
        }
        let mut state = self.state.lock().await;
        state.current = Some(id.to_string());
        Ok(())
    }

    /// Removes `id` from the cache and schedules its deletion in storage.
    /// Errors if `id` is the current session.
    pub async fn delete(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.current.as_deref() == Some(id) {
                return Err(Error::argument(format!(
                    "cannot delete the active session '{id}'"
                )));
            }
            state.cache.remove(id);
        }
        self.dispatch(PersistenceOp::DeleteSession(id.to_string()));
        Ok(())
    }

    /// Updates `id`'s system prompt in the cache (creating the session if
    /// absent) and schedules persistence when `prompt` is `Some`.
    pub async fn update_system_prompt(&self, id: &str, prompt: Option<String>) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if !state.cache.contains(id) {
                state.cache.put(id.to_string(), SessionState::default());
            }
            if let Some(session) = state.cache.get_mut(id) {
                session.system_prompt = prompt.clone();
            }
        }
        if let Some(p) = prompt {
            self.dispatch(PersistenceOp::SetSystemPrompt(id.to_string(), p));
        }
        Ok(())
    }

    /// Write-through append to the current session.
    pub async fn append(&self, message: Message) -> Result<()> {
        let id = {
            let mut state = self.state.lock().await;
            let id = state
                .current
                .clone()
                .ok_or_else(|| Error::state("no active session"))?;
            let session = state
                .cache
                .get_mut(&id)
                .ok_or_else(|| Error::state("active session not cached"))?;
            session.messages.push(message.clone());
            id
        };
        self.dispatch(PersistenceOp::AppendMessage(id, message));
        Ok(())
    }

    /// Returns the current session's messages, optionally windowed to the
    /// last `window` entries (`-1` = all, `0` = none), prepended with a
    /// synthesized System message when `include_system` is set and an
    /// effective system prompt exists (`temp_system` overrides the session's).
    pub async fn current_history(
        &self,
        window: i64,
        temp_system: Option<&str>,
        include_system: bool,
    ) -> Result<Vec<Message>> {
        let (effective_system, messages) = {
            let mut state = self.state.lock().await;
            let id = state
                .current
                .clone()
                .ok_or_else(|| Error::state("no active session"))?;
            let session = state
                .cache
                .get(&id)
                .ok_or_else(|| Error::state("active session not cached"))?;
            let effective = temp_system
                .map(|s| s.to_string())
                .or_else(|| session.system_prompt.clone());
            (effective, session.messages.clone())
        };

        let windowed = if window < 0 {
            messages
        } else if window == 0 {
            Vec::new()
        } else {
            let window = window as usize;
            if window >= messages.len() {
                messages
            } else {
                messages[messages.len() - window..].to_vec()
            }
        };

        let mut result = Vec::new();
        if include_system {
            if let Some(sys) = effective_system {
                result.push(Message::system(sys));
            }
        }
        result.extend(windowed);
        Ok(result)
    }

    /// Clears the current session's messages (keeping its system prompt).
    pub async fn clear_current(&self) -> Result<()> {
        let id = {
            let mut state = self.state.lock().await;
            let id = state
                .current
                .clone()
                .ok_or_else(|| Error::state("no active session"))?;
            if let Some(session) = state.cache.get_mut(&id) {
                session.messages.clear();
            }
            id
        };
        self.dispatch(PersistenceOp::ClearMessages(id));
        Ok(())
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.state.lock().await.current.clone()
    }

    pub async fn cache_len(&self) -> usize {
        self.state.lock().await.cache.len()
    }

    /// Aborts the background persistence worker. A deliberate teardown step,
    /// distinct from task failure; idempotent.
    pub fn close(&self) {
        self.background.lock().unwrap().abort_all();
    }
}
