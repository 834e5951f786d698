//! The transport-agnostic contract the orchestrator drives. §4.5.

use crate::{GenerationOptions, LlmResponse, Message, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A chat-completion backend. Implementations own their transport resources
/// and release them in [`Provider::close`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// A single complete response.
    async fn chat(&self, messages: &[Message], options: &GenerationOptions) -> Result<LlmResponse>;

    /// A cold asynchronous sequence of partial responses, produced as the
    /// underlying transport yields them. Terminates on end-of-stream or the
    /// first error.
    async fn stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<BoxStream<'static, Result<LlmResponse>>>;

    /// Idempotent release of owned transport resources. A provider that did
    /// not create its transport (e.g. one handed a shared `reqwest::Client`)
    /// must not close it.
    async fn close(&self);
}
