//! OpenAI-compatible chat-completions [`Provider`]. §4.6.
//!
//! Request assembly and response parsing for both code paths are grounded on
//! the teacher's `client.rs`/`utils.rs` (`OpenAIRequest` construction,
//! `parse_sse_stream`'s line-based SSE scanning). The non-streaming path adds
//! `retry::retry_with_backoff_conditional` around the transport call, since a
//! non-streaming request is safely replayable; the streaming path is never
//! retried mid-flight, per §5.

use crate::provider::Provider;
use crate::retry::{self, RetryConfig};
use crate::types::{
    OpenAIChunk, OpenAIContent, OpenAIContentPart, OpenAIMessage, OpenAIRequest, OpenAIResponse,
};
use crate::{Error, GenerationOptions, LlmResponse, Message, Result, ToolCall, ToolCallDelta, Usage};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

/// A `Provider` speaking the OpenAI chat-completions wire format against any
/// compatible endpoint (LM Studio, Ollama, llama.cpp, vLLM, OpenAI itself).
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    retry_config: RetryConfig,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(&base_url.into()),
            api_key: api_key.into(),
            model: model.into(),
            retry_config: RetryConfig::default(),
        }
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, messages: &[Message], options: &GenerationOptions, stream: bool) -> OpenAIRequest {
        OpenAIRequest {
            model: options.model_override.clone().unwrap_or_else(|| self.model.clone()),
            messages: messages.iter().map(OpenAIMessage::from).collect(),
            stream,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            stop: options.stop_sequences.clone(),
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            tools: options
                .tools
                .as_ref()
                .map(|ts| ts.iter().map(|t| t.to_openai_format()).collect()),
            tool_choice: options.tool_choice.clone(),
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn flatten_content(content: &OpenAIContent) -> String {
    match content {
        OpenAIContent::Text(s) => s.clone(),
        OpenAIContent::Parts(parts) => parts
            .iter()
            .filter_map(|p| match p {
                OpenAIContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, messages: &[Message], options: &GenerationOptions) -> Result<LlmResponse> {
        let body = self.build_request(messages, options, false);

        let response: OpenAIResponse = retry::retry_with_backoff_conditional(self.retry_config.clone(), || async {
            let resp = self
                .http
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::from_status(status, text));
            }
            Ok(resp.json::<OpenAIResponse>().await?)
        })
        .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::unknown("provider returned no choices"))?;

        let content = choice
            .message
            .content
            .as_ref()
            .map(flatten_content)
            .unwrap_or_default();

        let tool_calls = choice.message.tool_calls.map(|tcs| {
            tcs.into_iter()
                .map(|tc| ToolCall {
                    id: tc.id,
                    kind: tc.call_type,
                    function_name: tc.function.name,
                    function_arguments: tc.function.arguments,
                })
                .collect()
        });

        Ok(LlmResponse {
            content,
            usage: response.usage.map(Usage::from),
            reasoning_content: choice.message.reasoning_content,
            tool_calls,
            tool_call_deltas: None,
        })
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<BoxStream<'static, Result<LlmResponse>>> {
        let body = self.build_request(messages, options, true);

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::from_status(status, text));
        }

        Ok(parse_sse_stream(resp))
    }

    async fn close(&self) {
        // `reqwest::Client` releases its connection pool on drop; this
        // provider created its own client, but there's nothing to eagerly
        // release before then.
    }
}

/// Transforms an HTTP SSE byte stream into a stream of parsed [`LlmResponse`]
/// partials, per §4.6's line-scanning contract.
fn parse_sse_stream(response: reqwest::Response) -> BoxStream<'static, Result<LlmResponse>> {
    let stream = response.bytes_stream().flat_map(|result| {
        let items = match result {
            Ok(bytes) => parse_sse_bytes(&bytes),
            Err(e) => vec![Err(Error::Http(e))],
        };
        stream::iter(items)
    });
    Box::pin(stream)
}

fn parse_sse_bytes(bytes: &[u8]) -> Vec<Result<LlmResponse>> {
    let text = String::from_utf8_lossy(bytes);
    let mut out = Vec::new();

    for line in text.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            // Non-SSE-framed fallback: a bare JSON object carrying an error.
            if line.starts_with('{') && line.contains("\"error\"") {
                out.push(Err(Error::unknown(format!("provider error: {line}"))));
            }
            continue;
        };
        if data.is_empty() || data == "[DONE]" {
            continue;
        }

        match serde_json::from_str::<OpenAIChunk>(data) {
            Ok(chunk) => out.extend(chunk_to_responses(chunk)),
            Err(e) => {
                tracing::debug!(error = %e, line = %data, "skipping unparseable SSE chunk");
            }
        }
    }

    out
}

fn chunk_to_responses(chunk: OpenAIChunk) -> Vec<Result<LlmResponse>> {
    if let Some(err) = chunk.error {
        return vec![Err(Error::server(err.message))];
    }

    let mut out = Vec::new();

    if let Some(choice) = chunk.choices.into_iter().next() {
        out.push(Ok(LlmResponse {
            content: choice.delta.content.unwrap_or_default(),
            usage: None,
            reasoning_content: choice.delta.reasoning_content,
            tool_calls: None,
            tool_call_deltas: choice
                .delta
                .tool_calls
                .map(|deltas| deltas.iter().map(ToolCallDelta::from).collect()),
        }));
    }

    if let Some(usage) = chunk.usage {
        out.push(Ok(LlmResponse {
            content: String::new(),
            usage: Some(Usage::from(usage)),
            reasoning_content: None,
            tool_calls: None,
            tool_call_deltas: None,
        }));
    }

    out
}
