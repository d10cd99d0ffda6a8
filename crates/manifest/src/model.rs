//! Descriptor types embedded in a manifest document.
//!
//! The document itself is handled as a raw JSON object so that fields this crate does not
//! know about (`prompts`, `resources`, vendor extensions) survive normalization untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

/// A named capability exposed to protocol clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool input. Kept as an opaque value so stored schemas round-trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl ToolDescriptor {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: Some(input_schema),
            extra: JsonObject::new(),
        }
    }

    /// Object schema with a single required string property.
    #[must_use]
    pub fn single_string_field(
        name: impl Into<String>,
        description: impl Into<String>,
        field: &str,
    ) -> Self {
        let mut properties = JsonObject::new();
        properties.insert(field.to_string(), serde_json::json!({ "type": "string" }));
        Self::new(
            name,
            description,
            serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": [field],
            }),
        )
    }

    /// JSON form of the descriptor; extra fields are kept alongside the known ones.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = self.extra.clone();
        out.insert("name".into(), Value::String(self.name.clone()));
        if let Some(description) = &self.description {
            out.insert("description".into(), Value::String(description.clone()));
        }
        if let Some(schema) = &self.input_schema {
            out.insert("inputSchema".into(), schema.clone());
        }
        Value::Object(out)
    }
}

/// A transport/endpoint entry a client may connect to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub name: String,
    pub url: String,
    pub transport: String,
    pub version: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl ServerDescriptor {
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = self.extra.clone();
        out.insert("name".into(), Value::String(self.name.clone()));
        out.insert("url".into(), Value::String(self.url.clone()));
        out.insert("transport".into(), Value::String(self.transport.clone()));
        out.insert("version".into(), Value::String(self.version.clone()));
        Value::Object(out)
    }
}

/// Treat absent, `null`, non-string and empty-string values as missing. Whitespace is a
/// value.
#[must_use]
pub fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Short type name of a JSON value, for diagnostics.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
