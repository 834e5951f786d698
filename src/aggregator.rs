//! Two concerns that run inside a streaming chat turn, per §4.7: adaptive
//! text batching (backpressure without drops) and tool-call fragment
//! reassembly.
//!
//! The batching half generalizes the teacher's `utils::ToolCallAggregator`,
//! which buffers content until `finish_reason` arrives. Here every delta
//! must reach the consumer as it's produced, so the buffer is drained by a
//! background delivery task instead of at stream end. The reassembly half
//! keeps the teacher's index-keyed `HashMap` of partial tool calls almost
//! verbatim, swapping `ContentBlock::ToolUse` output for [`ToolCall`].

use crate::{FunctionDelta, Result, ToolCall, ToolCallDelta};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The caller-supplied token sink. Suspending by contract (§5); may perform
/// arbitrary awaits.
pub type ConsumerSink = Arc<dyn Fn(String) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Shared buffer plus a mutex standing in for "a delivery is in progress".
/// See §4.7 for the exact append/try-acquire/spawn protocol.
pub struct AdaptiveBatcher {
    buffer: Arc<Mutex<String>>,
    gate: Arc<Mutex<()>>,
    sink: ConsumerSink,
}

impl AdaptiveBatcher {
    pub fn new(sink: ConsumerSink) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(String::new())),
            gate: Arc::new(Mutex::new(())),
            sink,
        }
    }

    /// Appends `delta` under a short lock, then tries a non-blocking acquire
    /// of the delivery gate. On success, spawns a task that drains the
    /// buffer and calls the sink; on failure, does nothing — the
    /// in-progress delivery will pick up these bytes on its next pass.
    pub async fn push(&self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        {
            let mut buf = self.buffer.lock().await;
            buf.push_str(delta);
        }
        if let Ok(guard) = self.gate.clone().try_lock_owned() {
            let buffer = self.buffer.clone();
            let sink = self.sink.clone();
            tokio::spawn(async move {
                if let Err(e) = Self::deliver(&buffer, &sink).await {
                    tracing::debug!(error = %e, "adaptive delivery task failed");
                }
                drop(guard);
            });
        }
    }

    /// Acquires the delivery gate (awaiting if needed) and performs a final
    /// flush. Called on stream completion, including error paths that still
    /// need to flush already-observed bytes.
    pub async fn finish(&self) -> Result<()> {
        let _guard = self.gate.lock().await;
        Self::deliver(&self.buffer, &self.sink).await
    }

    async fn deliver(buffer: &Arc<Mutex<String>>, sink: &ConsumerSink) -> Result<()> {
        let chunk = {
            let mut buf = buffer.lock().await;
            std::mem::take(&mut *buf)
        };
        if chunk.is_empty() {
            return Ok(());
        }
        (sink)(chunk).await
    }
}

#[derive(Default)]
struct PartialToolCall {
    id: String,
    kind: String,
    name: String,
    arguments: String,
}

/// Accumulates tool-call fragments keyed by their positional index and
/// finalizes them into an ascending-index-ordered [`ToolCall`] list.
#[derive(Default)]
pub struct ToolCallAssembler {
    parts: BTreeMap<u32, PartialToolCall>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Merges one fragment into the accumulator for its index: non-empty
    /// `id`/`kind`/`function.name` overwrite, `function.arguments` appends.
    pub fn ingest(&mut self, delta: &ToolCallDelta) {
        let entry = self.parts.entry(delta.index).or_default();
        if let Some(id) = &delta.id {
            if !id.is_empty() {
                entry.id = id.clone();
            }
        }
        if let Some(kind) = &delta.kind {
            if !kind.is_empty() {
                entry.kind = kind.clone();
            }
        }
        if let Some(FunctionDelta { name, arguments }) = &delta.function {
            if let Some(name) = name {
                if !name.is_empty() {
                    entry.name = name.clone();
                }
            }
            if let Some(args) = arguments {
                entry.arguments.push_str(args);
            }
        }
    }

    /// Finalizes accumulated fragments, defaulting an unset `kind` to
    /// `"function"`, in ascending index order.
    pub fn finalize(self) -> Vec<ToolCall> {
        self.parts
            .into_values()
            .map(|p| ToolCall {
                id: p.id,
                kind: if p.kind.is_empty() {
                    "function".to_string()
                } else {
                    p.kind
                },
                function_name: p.name,
                function_arguments: p.arguments,
            })
            .collect()
    }
}
