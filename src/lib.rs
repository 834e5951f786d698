//! # react-orchestrator
//!
//! A client-side conversation orchestration engine for OpenAI-compatible chat
//! completion APIs (LM Studio, Ollama, llama.cpp, vLLM, or OpenAI itself):
//! streaming with adaptive batching, a Re-Act tool-call loop, hybrid
//! LRU-plus-persistence session memory, and self-correcting structured
//! output.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use react_orchestrator::{Client, persistence::InMemoryPersistence};
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::with_openai(
//!         "http://localhost:1234/v1",
//!         "not-needed",
//!         "qwen2.5-32b-instruct",
//!         Arc::new(InMemoryPersistence::new()),
//!         NonZeroUsize::new(100).unwrap(),
//!     );
//!
//!     client.memory().create("default", Some("You are a helpful assistant".to_string())).await?;
//!     client.memory().switch_to("default").await?;
//!
//!     let mut scope = client.scope();
//!     let answer = scope.ask("What's 2+2?", Default::default()).await?;
//!     println!("{answer}");
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`]: message, content, and generation-options data model
//! - [`persistence`]: the durable-storage contract and an in-process default
//! - [`cache`]: the bounded, access-ordered session cache
//! - [`memory`]: session lifecycle, arbitrating the cache and persistence dispatch
//! - [`provider`]: the transport-agnostic chat-backend contract
//! - [`openai`]: an OpenAI-compatible [`Provider`] implementation
//! - [`aggregator`]: adaptive streaming delivery and tool-call reassembly
//! - [`json_extract`]: best-effort JSON sanitizing for structured output
//! - [`tools`]: executable tool registration for the Re-Act loop
//! - [`scope`]: the Re-Act loop, context preparation, and structured-output retry
//! - [`client`]: the top-level handle that mints scopes
//! - [`config`]: environment-driven endpoint/model resolution for applications
//! - [`retry`]: exponential backoff with jitter
//! - [`error`]: the crate's error and result types

mod aggregator;
mod cache;
mod client;
mod config;
mod error;
mod json_extract;
mod memory;
mod openai;
pub mod persistence;
mod provider;
pub mod retry;
mod scope;
mod tools;
mod types;

// --- Core client API ---

pub use client::Client;

// --- Orchestration ---

pub use aggregator::ConsumerSink;
pub use scope::{HistoryFormatter, QueryOptions, Scope};

// --- Provider ---

pub use openai::OpenAiProvider;
pub use provider::Provider;

// --- Memory ---

pub use memory::MemoryManager;
pub use persistence::PersistenceStore;

// --- Tool system ---

pub use tools::{Tool, ToolBuilder, ToolHandler, tool};

// --- Provider configuration helpers ---

pub use config::{Provider as InferenceServer, get_api_key, get_base_url, get_model};

// --- JSON extraction ---

pub use json_extract::extract_json;

// --- Error handling ---

pub use error::{Error, Result};

// --- Core types ---

pub use types::{
    Content, ContentPart, FunctionDelta, GenerationOptions, GenerationOptionsBuilder, LlmResponse,
    MemoryStrategy, Message, Role, SessionState, ToolCall, ToolCallDelta, ToolDefinition, Usage,
};

/// Convenience module bundling the most commonly used types and functions.
pub mod prelude {
    pub use crate::{
        Client, Content, Error, GenerationOptions, LlmResponse, MemoryStrategy, Message, QueryOptions,
        Result, Role, Scope, Tool, ToolCall, ToolDefinition, tool,
    };
}
