//! Abstract storage contract for session state, and a default in-process
//! implementation.
//!
//! Mirrors the trait-plus-default-impl shape used for storage abstractions
//! elsewhere in the ecosystem (an `async_trait` trait plus a mutex-guarded
//! `HashMap` default backend): one trait describing durable operations, and
//! an `InMemoryPersistence` good enough for tests and single-process use.

use crate::{Message, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The durable state held per session: an optional system prompt and the
/// ordered message log.
#[derive(Debug, Clone, Default)]
struct StoredSession {
    system_prompt: Option<String>,
    messages: Vec<Message>,
}

/// Abstract persistence contract consumed by the memory manager.
///
/// All operations may suspend and may fail with [`Error::Io`]. Implementations
/// must be safe for concurrent use across distinct session ids.
#[async_trait]
pub trait PersistenceStore: Send + Sync + 'static {
    async fn get_system_prompt(&self, session_id: &str) -> Result<Option<String>>;

    async fn set_system_prompt(&self, session_id: &str, prompt: String) -> Result<()>;

    /// `limit < 0` means all messages; `limit >= size` means all messages;
    /// otherwise the last `limit` messages in arrival order.
    async fn get_messages(&self, session_id: &str, limit: i64) -> Result<Vec<Message>>;

    async fn append_message(&self, session_id: &str, message: Message) -> Result<()>;

    /// Full overwrite of a session's state, used on eviction.
    async fn save_full_context(
        &self,
        session_id: &str,
        system_prompt: Option<String>,
        messages: Vec<Message>,
    ) -> Result<()>;

    /// Clears messages but keeps the system prompt.
    async fn clear_messages(&self, session_id: &str) -> Result<()>;

    /// Removes all state for a session.
    async fn delete_session(&self, session_id: &str) -> Result<()>;
}

/// Default in-process [`PersistenceStore`], backed by a single mutex over a
/// `HashMap`. Per-session access is serialized through the outer lock, which
/// is sufficient for the ordering guarantees the memory manager requires
/// since persistence dispatch always happens after the corresponding cache
/// mutation under its own lock.
#[derive(Default)]
pub struct InMemoryPersistence {
    sessions: Arc<Mutex<HashMap<String, StoredSession>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceStore for InMemoryPersistence {
    async fn get_system_prompt(&self, session_id: &str) -> Result<Option<String>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(session_id).and_then(|s| s.system_prompt.clone()))
    }

    async fn set_system_prompt(&self, session_id: &str, prompt: String) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(session_id.to_string()).or_default().system_prompt = Some(prompt);
        Ok(())
    }

    async fn get_messages(&self, session_id: &str, limit: i64) -> Result<Vec<Message>> {
        let sessions = self.sessions.lock().await;
        let Some(stored) = sessions.get(session_id) else {
            return Ok(Vec::new());
        };
        if limit < 0 || limit as usize >= stored.messages.len() {
            return Ok(stored.messages.clone());
        }
        let start = stored.messages.len() - limit as usize;
        Ok(stored.messages[start..].to_vec())
    }

    async fn append_message(&self, session_id: &str, message: Message) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .messages
            .push(message);
        Ok(())
    }

    async fn save_full_context(
        &self,
        session_id: &str,
        system_prompt: Option<String>,
        messages: Vec<Message>,
    ) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            session_id.to_string(),
            StoredSession {
                system_prompt,
                messages,
            },
        );
        Ok(())
    }

    async fn clear_messages(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        if let Some(stored) = sessions.get_mut(session_id) {
            stored.messages.clear();
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id);
        Ok(())
    }
}
