//! The top-level handle: owns a provider and a memory manager, and mints
//! short-lived [`Scope`]s for individual orchestration calls. §3, §5.

use crate::memory::MemoryManager;
use crate::openai::OpenAiProvider;
use crate::persistence::PersistenceStore;
use crate::provider::Provider;
use crate::retry::RetryConfig;
use crate::scope::Scope;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Bound to exactly one [`Provider`] and one [`MemoryManager`] for its
/// lifetime. Cheap to clone (all fields are `Arc`s); cloning shares the same
/// underlying provider connection and session cache.
#[derive(Clone)]
pub struct Client {
    provider: Arc<dyn Provider>,
    memory: Arc<MemoryManager>,
    default_max_tool_rounds: usize,
}

impl Client {
    /// Default tool-round bound for scopes created via [`Client::scope`].
    /// Per §4.8; override per call with [`Client::scope_with_max_tool_rounds`].
    pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

    pub fn new(provider: Arc<dyn Provider>, persistence: Arc<dyn PersistenceStore>, cache_capacity: NonZeroUsize) -> Self {
        Self {
            provider,
            memory: Arc::new(MemoryManager::new(persistence, cache_capacity)),
            default_max_tool_rounds: Self::DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Convenience constructor wiring an [`OpenAiProvider`] directly, for the
    /// common case of talking to a single OpenAI-compatible endpoint.
    pub fn with_openai(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        persistence: Arc<dyn PersistenceStore>,
        cache_capacity: NonZeroUsize,
    ) -> Self {
        Self::new(Arc::new(OpenAiProvider::new(base_url, api_key, model)), persistence, cache_capacity)
    }

    pub fn with_retry_config(self, _config: RetryConfig) -> Self {
        // Retry configuration is provider-specific; callers that need it
        // construct their own `OpenAiProvider::with_retry_config(..)` and
        // pass it to `Client::new` directly. Kept as a documented no-op seam
        // so a future provider-agnostic retry policy has a home.
        self
    }

    pub fn with_default_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.default_max_tool_rounds = rounds;
        self
    }

    pub fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    /// Starts a new orchestration call bound to `Self::DEFAULT_MAX_TOOL_ROUNDS`
    /// (or the value set via [`Client::with_default_max_tool_rounds`]).
    pub fn scope(&self) -> Scope {
        Scope::new(self.provider.clone(), self.memory.clone(), self.default_max_tool_rounds)
    }

    /// Starts a new orchestration call with an explicit tool-round bound.
    pub fn scope_with_max_tool_rounds(&self, max_tool_rounds: usize) -> Scope {
        Scope::new(self.provider.clone(), self.memory.clone(), max_tool_rounds)
    }

    /// Idempotent teardown: aborts the memory manager's background
    /// persistence worker and releases the provider's transport resources.
    pub async fn close(&self) {
        self.memory.close();
        self.provider.close().await;
    }
}
