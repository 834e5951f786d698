//! Executable tool registration for the Re-Act loop. §4.8.
//!
//! [`Tool`] pairs a [`crate::ToolDefinition`] (the wire-facing schema) with an
//! executor. The executor signature is `Fn(String) -> Future<Output =
//! Result<String>>` — raw JSON text in, raw JSON text out — rather than
//! `serde_json::Value`, so a tool's contract with the orchestrator matches
//! exactly what arrives in a `ToolCall.function_arguments` and what goes back
//! in a tool-result message, with no intermediate parse the executor doesn't
//! control.
//!
//! The builder ergonomics (`tool()`, `.param()`, `.build()`) and the schema
//! conversion helpers below are carried over from the teacher's tool system,
//! generalized to the new executor signature.

use crate::{Result, ToolDefinition};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A tool executor: raw JSON arguments in, raw JSON result in `Ok`, raw error
/// text in `Err`.
pub type ToolHandler =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync>;

/// A registered tool: name, description, and JSON Schema for the LLM, plus
/// the handler that runs when the LLM calls it.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    input_schema: Value,
    handler: ToolHandler,
}

impl Tool {
    /// Creates a tool, normalizing `input_schema` to full JSON Schema via
    /// [`convert_schema_to_openai`]. Accepts simple type notation
    /// (`{"location": "string"}`), extended per-property schema
    /// (`{"query": {"type": "string", "optional": true}}`), or a schema
    /// already in full JSON Schema form (passed through unchanged).
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: convert_schema_to_openai(input_schema),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    /// Runs the handler with raw JSON argument text.
    pub async fn execute(&self, arguments: String) -> Result<String> {
        (self.handler)(arguments).await
    }

    /// Converts to the wire-facing [`ToolDefinition`] sent to the provider.
    /// Panics only if `name` fails [`ToolDefinition::new`]'s validation,
    /// which tool registration in [`crate::scope::Scope`] checks eagerly.
    pub fn to_definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new(
            self.name.clone(),
            Some(self.description.clone()),
            self.input_schema.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Normalizes a schema to OpenAI's function-parameters JSON Schema shape.
///
/// A parameter is required unless it's marked `"optional": true`,
/// `"required": false`, or carries a `"default"` value. Already-complete
/// schemas (`"type": "object"` plus `"properties"`) pass through unchanged.
fn convert_schema_to_openai(schema: Value) -> Value {
    let Some(obj) = schema.as_object() else {
        return serde_json::json!({"type": "object", "properties": {}, "required": []});
    };
    if obj.contains_key("type") && obj.contains_key("properties") {
        return schema;
    }

    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for (param_name, param_type) in obj {
        if let Some(type_str) = param_type.as_str() {
            properties.insert(param_name.clone(), type_to_json_schema(type_str));
            required.push(param_name.clone());
        } else if param_type.is_object() {
            let mut prop = param_type.clone();
            let prop_obj = prop
                .as_object_mut()
                .expect("is_object() true implies as_object_mut() returns Some");

            let is_optional = prop_obj
                .remove("optional")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let is_required = prop_obj.remove("required").and_then(|v| v.as_bool());
            let has_default = prop_obj.contains_key("default");

            properties.insert(param_name.clone(), prop);

            if let Some(true) = is_required {
                required.push(param_name.clone());
            } else if is_optional || is_required == Some(false) {
                // explicitly optional
            } else if !has_default {
                required.push(param_name.clone());
            }
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Maps friendly type aliases (`"int"`, `"vec"`, `"dict"`, ...) to their JSON
/// Schema type name. Unknown strings default to `"string"`.
fn type_to_json_schema(type_str: &str) -> Value {
    let json_type = match type_str {
        "string" | "str" => "string",
        "integer" | "int" | "i32" | "i64" | "u32" | "u64" => "integer",
        "number" | "float" | "f32" | "f64" => "number",
        "boolean" | "bool" => "boolean",
        "array" | "list" | "vec" => "array",
        "object" | "dict" | "map" => "object",
        _ => "string",
    };
    serde_json::json!({ "type": json_type })
}

/// Fluent builder for [`Tool`]. Created via [`tool()`].
pub struct ToolBuilder {
    name: String,
    description: String,
    schema: Value,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: serde_json::json!({}),
        }
    }

    /// Replaces the schema entirely. Mixing this with `.param()` calls
    /// overwrites whichever ran first; use one or the other.
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    /// Adds one required parameter with simple type notation. Resets a
    /// non-object schema (e.g. from a prior `.schema(json!("string"))`) to
    /// an empty object first.
    pub fn param(mut self, name: &str, type_str: &str) -> Self {
        if !self.schema.is_object() {
            self.schema = serde_json::json!({});
        }
        let obj = self
            .schema
            .as_object_mut()
            .expect("schema is an object after the check above");
        obj.insert(name.to_string(), Value::String(type_str.to_string()));
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> Tool
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Tool::new(self.name, self.description, self.schema, handler)
    }
}

/// Starts building a tool. See [`ToolBuilder`].
pub fn tool(name: impl Into<String>, description: impl Into<String>) -> ToolBuilder {
    ToolBuilder::new(name, description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_to_json_schema_covers_common_aliases() {
        assert_eq!(type_to_json_schema("string"), serde_json::json!({"type": "string"}));
        assert_eq!(type_to_json_schema("int"), serde_json::json!({"type": "integer"}));
        assert_eq!(type_to_json_schema("f64"), serde_json::json!({"type": "number"}));
        assert_eq!(type_to_json_schema("bool"), serde_json::json!({"type": "boolean"}));
        assert_eq!(type_to_json_schema("vec"), serde_json::json!({"type": "array"}));
        assert_eq!(type_to_json_schema("weird"), serde_json::json!({"type": "string"}));
    }

    #[test]
    fn convert_simple_schema_marks_all_params_required() {
        let schema = serde_json::json!({"location": "string", "units": "string"});
        let result = convert_schema_to_openai(schema);
        assert_eq!(result["type"], "object");
        assert_eq!(result["properties"]["location"]["type"], "string");
        assert_eq!(result["required"], serde_json::json!(["location", "units"]));
    }

    #[test]
    fn convert_extended_schema_respects_optional_and_default() {
        let schema = serde_json::json!({
            "query": {"type": "string"},
            "limit": {"type": "integer", "optional": true},
            "page": {"type": "integer", "default": 1},
        });
        let result = convert_schema_to_openai(schema);
        let required = result["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "query"));
        assert!(!required.iter().any(|v| v == "limit"));
        assert!(!required.iter().any(|v| v == "page"));
    }

    #[test]
    fn full_schema_passes_through_unchanged() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        });
        let result = convert_schema_to_openai(schema.clone());
        assert_eq!(result, schema);
    }

    #[tokio::test]
    async fn tool_executes_and_returns_raw_json_text() {
        let add = tool("add", "Add two numbers")
            .param("a", "number")
            .param("b", "number")
            .build(|args: String| async move {
                let v: Value = serde_json::from_str(&args).unwrap();
                let a = v["a"].as_f64().unwrap();
                let b = v["b"].as_f64().unwrap();
                Ok(serde_json::json!({"result": a + b}).to_string())
            });

        let result = add.execute(r#"{"a": 5.0, "b": 3.0}"#.to_string()).await.unwrap();
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["result"], 8.0);
    }

    #[test]
    fn to_definition_matches_registered_metadata() {
        let t = tool("search", "Search for information")
            .param("query", "string")
            .build(|_| async { Ok("{}".to_string()) });

        let def = t.to_definition().unwrap();
        assert_eq!(def.name, "search");
        assert_eq!(def.description.as_deref(), Some("Search for information"));
        let wire = def.to_openai_format();
        assert_eq!(wire["function"]["name"], "search");
    }

    #[test]
    fn param_after_non_object_schema_resets_to_object() {
        let t = tool("test", "Test tool")
            .schema(serde_json::json!("string"))
            .param("key", "number")
            .build(|_| async { Ok("{}".to_string()) });

        assert!(t.input_schema().is_object());
        assert!(t.input_schema()["properties"]["key"].is_object());
    }
}
