//! The user-facing conversation DSL. §4.8.
//!
//! Created per top-level call via [`crate::Client::scope`]; borrows the
//! client's provider and memory manager for that call's duration, per §3's
//! "weak collaborator relation" ownership note. Tool registration reuses the
//! teacher's `ToolBuilder`/`tool()` ergonomics, generalized to the raw-JSON-text
//! executor signature in [`crate::tools`].

use crate::aggregator::{AdaptiveBatcher, ConsumerSink, ToolCallAssembler};
use crate::json_extract::extract_json;
use crate::provider::Provider;
use crate::tools::Tool;
use crate::{
    Error, GenerationOptions, MemoryManager, MemoryStrategy, Message, Result, ToolCall,
    ToolDefinition, Usage,
};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// Renders a message history into the text substituted for `{{history}}`.
pub type HistoryFormatter = Arc<dyn Fn(&[Message]) -> String + Send + Sync>;

fn default_history_formatter(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let text = m.content.as_ref().map(|c| c.flatten_text()).unwrap_or_default();
            format!("{}: {}", m.role, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parameters for one orchestration call. `window` follows
/// [`MemoryManager::current_history`]'s convention (`-1` = all, `0` = none).
#[derive(Clone)]
pub struct QueryOptions {
    pub template: Option<String>,
    pub strategy: MemoryStrategy,
    pub window: i64,
    pub temp_system: Option<String>,
    pub formatter: Option<HistoryFormatter>,
    pub generation: GenerationOptions,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            template: None,
            strategy: MemoryStrategy::ReadWrite,
            window: -1,
            temp_system: None,
            formatter: None,
            generation: GenerationOptions::default(),
        }
    }
}

/// A short-lived orchestration context: registered tools, last usage, and a
/// tool-round limit, created for each top-level conversation call.
pub struct Scope {
    provider: Arc<dyn Provider>,
    memory: Arc<MemoryManager>,
    max_tool_rounds: usize,
    tools: HashMap<String, Tool>,
    tool_definitions: Vec<ToolDefinition>,
    last_usage: Option<Usage>,
}

impl Scope {
    pub(crate) fn new(provider: Arc<dyn Provider>, memory: Arc<MemoryManager>, max_tool_rounds: usize) -> Self {
        Self {
            provider,
            memory,
            max_tool_rounds,
            tools: HashMap::new(),
            tool_definitions: Vec::new(),
            last_usage: None,
        }
    }

    /// Registers a tool, replacing any prior registration under the same
    /// name. Fails if the tool's schema doesn't convert to a valid
    /// [`ToolDefinition`] (invalid name).
    pub fn register_tool(&mut self, tool: Tool) -> Result<()> {
        let def = tool.to_definition()?;
        self.tool_definitions.retain(|d| d.name != def.name);
        self.tool_definitions.push(def);
        self.tools.insert(tool.name().to_string(), tool);
        Ok(())
    }

    pub fn last_usage(&self) -> Option<&Usage> {
        self.last_usage.as_ref()
    }

    /// Unions registered tool definitions into `options.tools`, deduping by
    /// function name (caller-supplied definitions win on conflict).
    fn merge_tools(&self, mut options: GenerationOptions) -> GenerationOptions {
        if self.tool_definitions.is_empty() {
            return options;
        }
        let mut merged = options.tools.take().unwrap_or_default();
        for def in &self.tool_definitions {
            if !merged.iter().any(|d| d.name == def.name) {
                merged.push(def.clone());
            }
        }
        options.tools = Some(merged);
        options
    }

    /// Builds the outgoing request message list per §4.8's context
    /// preparation algorithm. Returns `(request_messages, raw_user_message)`;
    /// `raw_user_message` is what gets written through to memory.
    async fn prepare_messages(&self, user_input: &str, opts: &QueryOptions) -> Result<(Vec<Message>, Message)> {
        let can_read = opts.strategy.can_read();
        let raw_user_message = Message::user(user_input);

        let mut messages = Vec::new();

        if let Some(template) = opts.template.as_deref().filter(|t| !t.trim().is_empty()) {
            if template.contains("{{history}}") && !can_read {
                return Err(Error::argument(
                    "template references {{history}} but the memory strategy disables reads",
                ));
            }

            let effective_system = self.memory.current_history(0, opts.temp_system.as_deref(), true).await?;

            let mut rendered = template.replace("{{it}}", user_input);
            if template.contains("{{history}}") {
                let history = self.memory.current_history(opts.window, opts.temp_system.as_deref(), false).await?;
                let formatter = opts
                    .formatter
                    .clone()
                    .unwrap_or_else(|| Arc::new(default_history_formatter));
                rendered = rendered.replace("{{history}}", &formatter(&history));
            }

            messages.extend(effective_system);
            messages.push(Message::user(rendered));
        } else if can_read {
            let history = self.memory.current_history(opts.window, opts.temp_system.as_deref(), true).await?;
            messages.extend(history);
        } else {
            let effective_system = self.memory.current_history(0, opts.temp_system.as_deref(), true).await?;
            messages.extend(effective_system);
        }

        messages.push(raw_user_message.clone());
        Ok((messages, raw_user_message))
    }

    /// Dispatches finalized tool calls in order, appending a Tool-role result
    /// message per call to `messages` and, when `write` is set, to memory.
    async fn dispatch_tool_calls(&self, tool_calls: &[ToolCall], messages: &mut Vec<Message>, write: bool) -> Result<()> {
        for call in tool_calls {
            let result_text = match self.tools.get(call.function_name.as_str()) {
                None => format!("Error executing tool '{}': not registered", call.function_name),
                Some(tool) => match tool.execute(call.function_arguments.clone()).await {
                    Ok(text) => text,
                    Err(e) => format!("Error executing tool '{}': {e}", call.function_name),
                },
            };
            let msg = Message::tool_result(call.id.clone(), call.function_name.clone(), result_text);
            if write {
                self.memory.append(msg.clone()).await?;
            }
            messages.push(msg);
        }
        Ok(())
    }

    /// Runs the streaming Re-Act loop, delivering content deltas to `sink` as
    /// they arrive. Returns the accumulated text of the final tool-call-free
    /// turn.
    pub async fn ask_streaming(&mut self, user_input: &str, opts: QueryOptions, sink: ConsumerSink) -> Result<String> {
        let can_write = opts.strategy.can_write();
        let (mut messages, raw_user) = self.prepare_messages(user_input, &opts).await?;
        if can_write {
            self.memory.append(raw_user).await?;
        }

        let options = self.merge_tools(opts.generation.clone());

        for round in 0..self.max_tool_rounds {
            let mut stream = self.provider.stream(&messages, &options).await?;
            let batcher = AdaptiveBatcher::new(sink.clone());
            let mut assembler = ToolCallAssembler::new();
            let mut text = String::new();
            let mut usage = None;

            while let Some(item) = stream.next().await {
                let response = item?;
                if !response.content.is_empty() {
                    text.push_str(&response.content);
                    batcher.push(&response.content).await;
                }
                if let Some(deltas) = &response.tool_call_deltas {
                    for delta in deltas {
                        assembler.ingest(delta);
                    }
                }
                if response.usage.is_some() {
                    usage = response.usage;
                }
            }
            batcher.finish().await?;
            if usage.is_some() {
                self.last_usage = usage;
            }

            let tool_calls = if assembler.is_empty() { None } else { Some(assembler.finalize()) };
            let assistant_msg = Message::assistant_with_tool_calls(
                if text.is_empty() { None } else { Some(text.clone()) },
                tool_calls.clone().unwrap_or_default(),
            );
            if can_write {
                self.memory.append(assistant_msg.clone()).await?;
            }
            messages.push(assistant_msg);

            match tool_calls {
                Some(calls) if !calls.is_empty() => {
                    self.dispatch_tool_calls(&calls, &mut messages, can_write).await?;
                    if round + 1 == self.max_tool_rounds {
                        tracing::warn!(rounds = self.max_tool_rounds, "max tool rounds reached without a final turn");
                        return Ok(text);
                    }
                }
                _ => return Ok(text),
            }
        }
        unreachable!("loop always returns before exhausting max_tool_rounds iterations")
    }

    /// Runs the non-streaming Re-Act loop. Returns the final response text.
    pub async fn ask(&mut self, user_input: &str, opts: QueryOptions) -> Result<String> {
        let can_write = opts.strategy.can_write();
        let (mut messages, raw_user) = self.prepare_messages(user_input, &opts).await?;
        if can_write {
            self.memory.append(raw_user).await?;
        }

        let options = self.merge_tools(opts.generation.clone());

        for round in 0..self.max_tool_rounds {
            let response = self.provider.chat(&messages, &options).await?;
            if response.usage.is_some() {
                self.last_usage = response.usage.clone();
            }

            let assistant_msg = Message::assistant_with_tool_calls(
                if response.content.is_empty() { None } else { Some(response.content.clone()) },
                response.tool_calls.clone().unwrap_or_default(),
            );
            if can_write {
                self.memory.append(assistant_msg.clone()).await?;
            }
            messages.push(assistant_msg);

            match response.tool_calls {
                Some(calls) if !calls.is_empty() => {
                    self.dispatch_tool_calls(&calls, &mut messages, can_write).await?;
                    if round + 1 == self.max_tool_rounds {
                        tracing::warn!(rounds = self.max_tool_rounds, "max tool rounds reached without a final turn");
                        return Ok(response.content);
                    }
                }
                _ => return Ok(response.content),
            }
        }
        unreachable!("loop always returns before exhausting max_tool_rounds iterations")
    }

    /// Structured-output retry loop: issues `ask`, sanitizes the result with
    /// the JSON extractor, and deserializes to `T`. On deserialization
    /// failure, re-queries the provider directly (bypassing memory) with a
    /// correction prompt at temperature 0.1, up to `max_retries` attempts.
    /// Non-deserialization errors (provider failures) propagate immediately.
    pub async fn ask_structured<T: DeserializeOwned>(
        &mut self,
        user_input: &str,
        opts: QueryOptions,
        max_retries: u32,
    ) -> Result<T> {
        let raw = self.ask(user_input, opts).await?;
        let mut last_response = raw;
        let mut attempt = 0;

        loop {
            let sanitized = extract_json(&last_response);
            match serde_json::from_str::<T>(&sanitized) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(Error::Serialization(e));
                    }
                    let correction = format!(
                        "Previous JSON invalid: {e}. Return ONLY JSON. Original content: {last_response}"
                    );
                    let correction_options = GenerationOptions {
                        temperature: Some(0.1),
                        ..GenerationOptions::default()
                    };
                    let response = self
                        .provider
                        .chat(&[Message::user(correction)], &correction_options)
                        .await?;
                    last_response = response.content;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryPersistence;
    use crate::{LlmResponse, Role};
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::num::NonZeroUsize;
    use std::sync::Mutex as StdMutex;

    struct ScriptedProvider {
        chat_responses: StdMutex<Vec<LlmResponse>>,
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn chat(&self, _messages: &[Message], _options: &GenerationOptions) -> Result<LlmResponse> {
            Ok(self.chat_responses.lock().unwrap().remove(0))
        }

        async fn stream(&self, _messages: &[Message], _options: &GenerationOptions) -> Result<BoxStream<'static, Result<LlmResponse>>> {
            unimplemented!("not used in these tests")
        }

        async fn close(&self) {}
    }

    fn scope_with(responses: Vec<LlmResponse>) -> Scope {
        let provider = Arc::new(ScriptedProvider {
            chat_responses: StdMutex::new(responses),
        });
        let memory = Arc::new(MemoryManager::new(
            Arc::new(InMemoryPersistence::new()),
            NonZeroUsize::new(4).unwrap(),
        ));
        Scope::new(provider, memory, 5)
    }

    fn text_response(text: &str) -> LlmResponse {
        LlmResponse {
            content: text.to_string(),
            ..LlmResponse::default()
        }
    }

    #[tokio::test]
    async fn ask_without_memory_session_is_stateless_ok() {
        // Stateless strategy never touches memory, so no session need exist.
        let mut scope = scope_with(vec![text_response("hello back")]);
        let opts = QueryOptions {
            strategy: MemoryStrategy::Stateless,
            ..QueryOptions::default()
        };
        let result = scope.ask("hi", opts).await.unwrap();
        assert_eq!(result, "hello back");
    }

    #[tokio::test]
    async fn ask_returns_final_text_when_no_tool_calls() {
        let mut scope = scope_with(vec![text_response("42")]);
        scope.memory.create("s", None).await.unwrap();
        scope.memory.switch_to("s").await.unwrap();

        let opts = QueryOptions::default();
        let result = scope.ask("what is six times seven", opts).await.unwrap();
        assert_eq!(result, "42");
    }

    #[tokio::test]
    async fn history_template_conflict_is_rejected() {
        let mut scope = scope_with(vec![]);
        scope.memory.create("s", None).await.unwrap();
        scope.memory.switch_to("s").await.unwrap();

        let opts = QueryOptions {
            template: Some("{{history}}\n{{it}}".to_string()),
            strategy: MemoryStrategy::WriteOnly,
            ..QueryOptions::default()
        };
        let err = scope.ask("hi", opts).await.unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
    }

    #[tokio::test]
    async fn unregistered_tool_call_yields_synthesized_error_text() {
        let tool_call = ToolCall {
            id: "call_1".to_string(),
            kind: "function".to_string(),
            function_name: "missing_tool".to_string(),
            function_arguments: "{}".to_string(),
        };
        let first = LlmResponse {
            content: String::new(),
            tool_calls: Some(vec![tool_call]),
            ..LlmResponse::default()
        };
        let mut scope = scope_with(vec![first, text_response("done")]);
        scope.memory.create("s", None).await.unwrap();
        scope.memory.switch_to("s").await.unwrap();

        scope.ask("run the missing tool", QueryOptions::default()).await.unwrap();

        let history = scope.memory.current_history(-1, None, false).await.unwrap();
        let tool_msg = history.iter().find(|m| m.role == Role::Tool).unwrap();
        assert_eq!(
            tool_msg.content.as_ref().unwrap().flatten_text(),
            "Error executing tool 'missing_tool': not registered"
        );
    }

    #[tokio::test]
    async fn ask_structured_retries_once_on_invalid_json() {
        let mut scope = scope_with(vec![
            text_response("not json at all"),
            text_response(r#"{"value": 7}"#),
        ]);
        scope.memory.create("s", None).await.unwrap();
        scope.memory.switch_to("s").await.unwrap();

        #[derive(serde::Deserialize)]
        struct Out {
            value: i32,
        }

        let out: Out = scope
            .ask_structured("give me a number", QueryOptions::default(), 3)
            .await
            .unwrap();
        assert_eq!(out.value, 7);
    }
}
