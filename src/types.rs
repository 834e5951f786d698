//! Core data model: messages, content, tool definitions, and the
//! OpenAI-compatible wire types used by the provider.
//!
//! The internal model ([`Message`], [`Content`], [`ToolCall`]) is distinct
//! from the wire format ([`OpenAIMessage`] and friends) so the orchestrator
//! and memory layers never depend on a specific provider's JSON shape.

use crate::Error;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// ============================================================================
// ROLE
// ============================================================================

/// Identifies the sender of a [`Message`].
///
/// Serializes to its lowercase wire name (`"system"`, `"user"`, `"assistant"`,
/// `"tool"`) to match the OpenAI chat-completions format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// CONTENT
// ============================================================================

/// A single typed part of multimodal [`Content`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    #[serde(rename = "text")]
    TextPart { text: String },
    #[serde(rename = "image_url")]
    ImagePart {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    #[serde(rename = "audio_url")]
    AudioPart { url: String },
    #[serde(rename = "video_url")]
    VideoPart {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_frames: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fps: Option<f32>,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::TextPart { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImagePart {
            url: url.into(),
            detail: None,
        }
    }
}

/// Polymorphic message content.
///
/// Serializes as a bare string for `Text`, or an array of tagged parts for
/// `Parts`. Deserialization is tolerant, per the wire contract: a JSON string
/// yields `Text`, a JSON array yields `Parts`, and any other shape (object,
/// number, null, missing) decodes to an empty `Text` rather than failing —
/// the caller's own validation decides whether that's acceptable.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    pub fn text(s: impl Into<String>) -> Self {
        Content::Text(s.into())
    }

    /// Flattens to a plain string by concatenating only the `TextPart`
    /// entries of `Parts` content, per the non-streaming response contract.
    pub fn flatten_text(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::TextPart { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

impl Serialize for Content {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Content::Text(s) => serializer.serialize_str(s),
            Content::Parts(parts) => {
                let mut seq = serializer.serialize_seq(Some(parts.len()))?;
                for part in parts {
                    seq.serialize_element(part)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ContentVisitor;

        impl<'de> Visitor<'de> for ContentVisitor {
            type Value = Content;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a string or an array of content parts")
            }

            fn visit_str<E>(self, v: &str) -> Result<Content, E>
            where
                E: de::Error,
            {
                Ok(Content::Text(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Content, E>
            where
                E: de::Error,
            {
                Ok(Content::Text(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Content, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut parts = Vec::new();
                // Unparseable individual parts are skipped rather than
                // failing the whole decode: tolerant decoding is the
                // explicit contract for this type.
                while let Some(value) = seq.next_element::<serde_json::Value>()? {
                    if let Ok(part) = serde_json::from_value::<ContentPart>(value) {
                        parts.push(part);
                    }
                }
                Ok(Content::Parts(parts))
            }

            fn visit_unit<E>(self) -> Result<Content, E>
            where
                E: de::Error,
            {
                Ok(Content::Text(String::new()))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Content, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                // Drain the map so serde's state machine stays consistent,
                // then fall back to the "any other shape" rule.
                while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
                Ok(Content::Text(String::new()))
            }

            fn visit_bool<E>(self, _: bool) -> Result<Content, E>
            where
                E: de::Error,
            {
                Ok(Content::Text(String::new()))
            }

            fn visit_i64<E>(self, _: i64) -> Result<Content, E>
            where
                E: de::Error,
            {
                Ok(Content::Text(String::new()))
            }

            fn visit_u64<E>(self, _: u64) -> Result<Content, E>
            where
                E: de::Error,
            {
                Ok(Content::Text(String::new()))
            }

            fn visit_f64<E>(self, _: f64) -> Result<Content, E>
            where
                E: de::Error,
            {
                Ok(Content::Text(String::new()))
            }
        }

        deserializer.deserialize_any(ContentVisitor)
    }
}

// ============================================================================
// TOOL CALLS
// ============================================================================

/// A tool/function call, either finalized (from a non-streaming response or
/// assembled by the aggregator) or mid-assembly across stream fragments.
///
/// `id` may be empty mid-stream; `function_arguments` is a raw JSON string,
/// not a parsed value, matching the wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_tool_call_kind")]
    pub kind: String,
    pub function_name: String,
    #[serde(default)]
    pub function_arguments: String,
}

fn default_tool_call_kind() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        function_name: impl Into<String>,
        function_arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_string(),
            function_name: function_name.into(),
            function_arguments: function_arguments.into(),
        }
    }
}

// ============================================================================
// MESSAGE
// ============================================================================

/// A single message in a conversation.
///
/// `content` is optional because an Assistant message carrying only
/// `tool_calls` may have no content at all (it is still preserved, never
/// dropped, when it does carry text alongside tool calls).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: Option<Content>) -> Self {
        Self {
            role,
            content,
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, Some(Content::text(text)))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Some(Content::text(text)))
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::new(Role::User, Some(Content::Parts(parts)))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Some(Content::text(text)))
    }

    pub fn assistant_with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.map(Content::Text),
            name: None,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(Content::Text(content.into())),
            name: Some(name.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

// ============================================================================
// TOOL DEFINITION
// ============================================================================

/// A tool the model may call, registered for the duration of one orchestrator
/// scope.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Validates the name (letters, digits, underscore; ≤64 chars) and that
    /// `parameters` is a JSON-schema-shaped value (any JSON object; deeper
    /// schema validation is out of scope).
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        parameters: serde_json::Value,
    ) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty()
            || name.len() > 64
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::argument(format!(
                "invalid tool name '{name}': must be ≤64 chars of letters, digits, or underscore"
            )));
        }
        if !parameters.is_object() {
            return Err(Error::argument("tool parameters must be a JSON object"));
        }
        Ok(Self {
            name,
            description,
            parameters,
        })
    }

    /// Converts to the OpenAI-compatible wire shape:
    /// `{"type":"function","function":{"name","description","parameters"}}`.
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

// ============================================================================
// GENERATION OPTIONS
// ============================================================================

/// Per-call generation parameters merged onto the provider request.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop_sequences: Option<Vec<String>>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub model_override: Option<String>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub tool_choice: Option<String>,
}

impl GenerationOptions {
    pub fn builder() -> GenerationOptionsBuilder {
        GenerationOptionsBuilder::default()
    }
}

/// Builder for [`GenerationOptions`]. No fields are required; everything
/// defaults to provider-default behavior when unset.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptionsBuilder {
    inner: GenerationOptions,
}

impl GenerationOptionsBuilder {
    pub fn temperature(mut self, v: f32) -> Self {
        self.inner.temperature = Some(v);
        self
    }

    pub fn top_p(mut self, v: f32) -> Self {
        self.inner.top_p = Some(v);
        self
    }

    pub fn max_tokens(mut self, v: u32) -> Self {
        self.inner.max_tokens = Some(v);
        self
    }

    pub fn stop_sequences(mut self, v: Vec<String>) -> Self {
        self.inner.stop_sequences = Some(v);
        self
    }

    pub fn frequency_penalty(mut self, v: f32) -> Self {
        self.inner.frequency_penalty = Some(v);
        self
    }

    pub fn presence_penalty(mut self, v: f32) -> Self {
        self.inner.presence_penalty = Some(v);
        self
    }

    pub fn model_override(mut self, v: impl Into<String>) -> Self {
        self.inner.model_override = Some(v.into());
        self
    }

    pub fn tools(mut self, v: Vec<ToolDefinition>) -> Self {
        self.inner.tools = Some(v);
        self
    }

    pub fn tool_choice(mut self, v: impl Into<String>) -> Self {
        self.inner.tool_choice = Some(v.into());
        self
    }

    pub fn build(self) -> GenerationOptions {
        self.inner
    }
}

// ============================================================================
// RESPONSE / USAGE
// ============================================================================

/// Token accounting reported by the provider; pass-through only, per the
/// non-goal on token-level accounting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete or partial response from the provider.
///
/// In streaming mode, many partial instances are produced per call: content
/// and reasoning deltas, tool-call fragments, and a terminal instance
/// carrying only `usage`. `tool_calls` holds the finalized list (set only by
/// the non-streaming `chat()` path); `tool_call_deltas` holds raw,
/// index-keyed fragments (set only by `stream()`, one partial set per chunk)
/// for the aggregator in [`crate::aggregator`] to reassemble.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<Usage>,
    pub reasoning_content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tool_call_deltas: Option<Vec<ToolCallDelta>>,
}

/// One positional fragment of a tool call, as produced mid-stream before the
/// full call is known. Transport-agnostic counterpart of the OpenAI wire
/// chunk's tool-call delta, for [`crate::aggregator::ToolCallAssembler`] to
/// reassemble.
#[derive(Debug, Clone)]
pub struct ToolCallDelta {
    pub index: u32,
    pub id: Option<String>,
    pub kind: Option<String>,
    pub function: Option<FunctionDelta>,
}

/// The function-call half of a [`ToolCallDelta`]: a name fragment (usually
/// sent whole, on the first delta for an index) and an arguments fragment
/// (appended across deltas).
#[derive(Debug, Clone, Default)]
pub struct FunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl From<&OpenAIToolCallDelta> for ToolCallDelta {
    fn from(delta: &OpenAIToolCallDelta) -> Self {
        Self {
            index: delta.index,
            id: delta.id.clone(),
            kind: delta.call_type.clone(),
            function: delta.function.as_ref().map(|f| FunctionDelta {
                name: f.name.clone(),
                arguments: f.arguments.clone(),
            }),
        }
    }
}

// ============================================================================
// MEMORY STRATEGY
// ============================================================================

/// Controls whether an orchestration call reads and/or writes session memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStrategy {
    ReadWrite,
    ReadOnly,
    WriteOnly,
    Stateless,
}

impl MemoryStrategy {
    pub fn can_read(self) -> bool {
        matches!(self, MemoryStrategy::ReadWrite | MemoryStrategy::ReadOnly)
    }

    pub fn can_write(self) -> bool {
        matches!(self, MemoryStrategy::ReadWrite | MemoryStrategy::WriteOnly)
    }
}

// ============================================================================
// SESSION STATE
// ============================================================================

/// In-memory state for one conversation session, as held by the LRU cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    /// Bumped on every cache touch. Not part of the wire contract and never
    /// persisted; exists only so tests can assert single-flight/ordering
    /// invariants without instrumenting the cache itself.
    #[serde(skip)]
    pub revision: u64,
}

// ============================================================================
// OPENAI WIRE TYPES
// ============================================================================

/// Wire-format message content: a bare string, or an array of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIContentPart>),
}

impl From<&Content> for OpenAIContent {
    fn from(c: &Content) -> Self {
        match c {
            Content::Text(s) => OpenAIContent::Text(s.clone()),
            Content::Parts(parts) => {
                OpenAIContent::Parts(parts.iter().map(OpenAIContentPart::from).collect())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAIContentPart {
    Text {
        text: String,
    },
    ImageUrl {
        image_url: OpenAIImageUrl,
    },
    AudioUrl {
        audio_url: OpenAIAudioUrl,
    },
    VideoUrl {
        video_url: OpenAIVideoUrl,
    },
}

impl From<&ContentPart> for OpenAIContentPart {
    fn from(p: &ContentPart) -> Self {
        match p {
            ContentPart::TextPart { text } => OpenAIContentPart::Text { text: text.clone() },
            ContentPart::ImagePart { url, detail } => OpenAIContentPart::ImageUrl {
                image_url: OpenAIImageUrl {
                    url: url.clone(),
                    detail: detail.clone(),
                },
            },
            ContentPart::AudioPart { url } => OpenAIContentPart::AudioUrl {
                audio_url: OpenAIAudioUrl { url: url.clone() },
            },
            ContentPart::VideoPart {
                url,
                detail,
                max_frames,
                fps,
            } => OpenAIContentPart::VideoUrl {
                video_url: OpenAIVideoUrl {
                    url: url.clone(),
                    detail: detail.clone(),
                    max_frames: *max_frames,
                    fps: *fps,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIAudioUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIVideoUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<OpenAIContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl From<&Message> for OpenAIMessage {
    fn from(m: &Message) -> Self {
        Self {
            role: m.role.to_string(),
            content: m.content.as_ref().map(OpenAIContent::from),
            name: m.name.clone(),
            tool_calls: m.tool_calls.as_ref().map(|tcs| {
                tcs.iter()
                    .map(|tc| OpenAIToolCall {
                        id: tc.id.clone(),
                        call_type: tc.kind.clone(),
                        function: OpenAIFunction {
                            name: tc.function_name.clone(),
                            arguments: tc.function_arguments.clone(),
                        },
                    })
                    .collect()
            }),
            tool_call_id: m.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: OpenAIFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIFunction {
    pub name: String,
    pub arguments: String,
}

/// Non-streaming and streaming request body for
/// `POST <base_url>/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

/// Non-streaming response body.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIResponseChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponseChoice {
    pub message: OpenAIResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponseMessage {
    #[serde(default)]
    pub content: Option<OpenAIContent>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<OpenAIUsage> for Usage {
    fn from(u: OpenAIUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

/// A single SSE chunk, per §4.6/§6.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChunk {
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
    #[serde(default)]
    pub error: Option<OpenAIChunkError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChunkError {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    pub delta: OpenAIDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAIDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<OpenAIToolCallDelta>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIToolCallDelta {
    pub index: u32,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    #[serde(default)]
    pub function: Option<OpenAIFunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAIFunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_text_round_trips() {
        let c = Content::text("hello");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"hello\"");
        let back: Content = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn content_parts_round_trips() {
        let c = Content::Parts(vec![ContentPart::text("hi"), ContentPart::image("http://x")]);
        let json = serde_json::to_string(&c).unwrap();
        let back: Content = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn content_tolerant_decode_of_other_shapes() {
        let from_obj: Content = serde_json::from_str("{\"a\":1}").unwrap();
        assert_eq!(from_obj, Content::Text(String::new()));

        let from_number: Content = serde_json::from_str("42").unwrap();
        assert_eq!(from_number, Content::Text(String::new()));

        let from_null: Content = serde_json::from_str("null").unwrap();
        assert_eq!(from_null, Content::Text(String::new()));
    }

    #[test]
    fn content_flatten_text_skips_non_text_parts() {
        let c = Content::Parts(vec![
            ContentPart::text("Look at this"),
            ContentPart::image("http://img.com"),
        ]);
        assert_eq!(c.flatten_text(), "Look at this");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn tool_definition_rejects_bad_names() {
        assert!(ToolDefinition::new("", None, serde_json::json!({})).is_err());
        assert!(ToolDefinition::new("a b", None, serde_json::json!({})).is_err());
        assert!(ToolDefinition::new("x".repeat(65), None, serde_json::json!({})).is_err());
        assert!(ToolDefinition::new("ok_name", None, serde_json::json!([])).is_err());
        assert!(ToolDefinition::new("ok_name", None, serde_json::json!({})).is_ok());
    }

    #[test]
    fn tool_definition_wire_shape() {
        let t = ToolDefinition::new(
            "get_weather",
            Some("fetch weather".into()),
            serde_json::json!({"type": "object"}),
        )
        .unwrap();
        let wire = t.to_openai_format();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "get_weather");
    }

    #[test]
    fn memory_strategy_flags() {
        assert!(MemoryStrategy::ReadWrite.can_read());
        assert!(MemoryStrategy::ReadWrite.can_write());
        assert!(MemoryStrategy::ReadOnly.can_read());
        assert!(!MemoryStrategy::ReadOnly.can_write());
        assert!(!MemoryStrategy::WriteOnly.can_read());
        assert!(MemoryStrategy::WriteOnly.can_write());
        assert!(!MemoryStrategy::Stateless.can_read());
        assert!(!MemoryStrategy::Stateless.can_write());
    }

    #[test]
    fn message_tool_result_constructor() {
        let m = Message::tool_result("call_1", "get_weather", "Sunny");
        assert_eq!(m.role, Role::Tool);
        assert_eq!(m.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(m.content, Some(Content::Text("Sunny".into())));
    }

    #[test]
    fn openai_message_conversion_preserves_tool_calls() {
        let m = Message::assistant_with_tool_calls(
            Some("checking".into()),
            vec![ToolCall::new("call_1", "get_weather", "{}")],
        );
        let wire = OpenAIMessage::from(&m);
        assert_eq!(wire.tool_calls.unwrap().len(), 1);
    }

    #[test]
    fn multimodal_request_assembly_produces_typed_parts() {
        let m = Message::user_parts(vec![
            ContentPart::text("Look at this"),
            ContentPart::image("http://img.com"),
        ]);
        let wire = OpenAIMessage::from(&m);
        let json = serde_json::to_value(&wire).unwrap();
        let content = json["content"].as_array().unwrap();
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "http://img.com");
    }
}
