//! Manifest resolution and compliance normalization.
//!
//! Stored documents are published by a separate process and may be served from several
//! hostnames, so a few fields are always recomputed here:
//! - `endpointURL` is derived from the serving origin, never taken from storage
//! - `protocolVersion` gets a default
//! - `servers` always has at least one entry with `transport` and `url`
//! - `tools` is reconciled against the [`Allowlist`]
//!
//! Malformed stored text never turns into an error response: [`resolve`] hands the raw text
//! back and reports [`ResolutionOutcome::Unparsed`].

use crate::endpoint_url;
use crate::error::{ManifestError, Result};
use crate::fallback::{DEFAULT_NAME, fallback_manifest};
use crate::model::{JsonObject, ServerDescriptor, json_kind, non_empty_str};
use crate::tools::Allowlist;
use rmcp::model::ProtocolVersion;
use serde_json::Value;

pub const DEFAULT_TRANSPORT: &str = "streamable-http";
pub const DEFAULT_SERVER_VERSION: &str = "1.0.0";

/// Protocol version advertised when the stored document has none.
#[must_use]
pub fn default_protocol_version() -> String {
    ProtocolVersion::V_2024_11_05.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// A stored document was parsed and normalized.
    Stored,
    /// The store was empty; the synthesized fallback was normalized.
    Fallback,
    /// The stored text could not be used as a document and is served as-is.
    Unparsed { error: String },
}

impl ResolutionOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Fallback => "fallback",
            Self::Unparsed { .. } => "unparsed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    /// Serialized response body.
    pub body: String,
    pub outcome: ResolutionOutcome,
}

/// Parse stored text into a manifest object.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or is not a JSON object.
pub fn parse_document(text: &str) -> Result<JsonObject> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(doc) => Ok(doc),
        other => Err(ManifestError::NotAnObject(json_kind(&other))),
    }
}

/// Turn the store result into the response body for `origin`.
///
/// `raw` is the stored text; `None` and the empty string both mean "not published yet".
#[must_use]
pub fn resolve(raw: Option<&str>, origin: &str, allowlist: &Allowlist) -> Resolution {
    let (doc, outcome) = match raw.filter(|text| !text.is_empty()) {
        None => (fallback_manifest(origin), ResolutionOutcome::Fallback),
        Some(text) => match parse_document(text) {
            Ok(doc) => (doc, ResolutionOutcome::Stored),
            Err(e) => {
                return Resolution {
                    body: text.to_string(),
                    outcome: ResolutionOutcome::Unparsed {
                        error: e.to_string(),
                    },
                };
            }
        },
    };

    let doc = normalize(doc, origin, allowlist);
    Resolution {
        body: Value::Object(doc).to_string(),
        outcome,
    }
}

/// Rewrite a parsed document so it satisfies the connector contract for `origin`.
#[must_use]
pub fn normalize(mut doc: JsonObject, origin: &str, allowlist: &Allowlist) -> JsonObject {
    let endpoint = endpoint_url(origin);
    doc.insert("endpointURL".into(), Value::String(endpoint.clone()));

    if non_empty_str(doc.get("protocolVersion")).is_none() {
        doc.insert(
            "protocolVersion".into(),
            Value::String(default_protocol_version()),
        );
    }

    let servers = normalize_servers(&doc, &endpoint);
    doc.insert("servers".into(), Value::Array(servers));

    let declared: &[Value] = match doc.get("tools") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    let tools = allowlist.apply(declared);
    doc.insert("tools".into(), Value::Array(tools));

    doc
}

fn normalize_servers(doc: &JsonObject, endpoint: &str) -> Vec<Value> {
    let existing: &[Value] = match doc.get("servers") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    if existing.is_empty() {
        return vec![synthesized_server(doc, endpoint).to_value()];
    }

    // Non-object entries carry no fields to keep; they become filled-in descriptors.
    existing
        .iter()
        .map(|server| {
            let mut server = server.as_object().cloned().unwrap_or_default();
            if non_empty_str(server.get("transport")).is_none() {
                server.insert("transport".into(), Value::String(DEFAULT_TRANSPORT.into()));
            }
            if non_empty_str(server.get("url")).is_none() {
                server.insert("url".into(), Value::String(endpoint.to_string()));
            }
            Value::Object(server)
        })
        .collect()
}

fn synthesized_server(doc: &JsonObject, endpoint: &str) -> ServerDescriptor {
    ServerDescriptor {
        name: non_empty_str(doc.get("name"))
            .unwrap_or(DEFAULT_NAME)
            .to_string(),
        url: endpoint.to_string(),
        transport: DEFAULT_TRANSPORT.to_string(),
        version: non_empty_str(doc.get("version"))
            .unwrap_or(DEFAULT_SERVER_VERSION)
            .to_string(),
        extra: JsonObject::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORIGIN: &str = "https://mcp.example.org";

    fn resolve_json(raw: Option<&str>) -> (Value, ResolutionOutcome) {
        let res = resolve(raw, ORIGIN, &Allowlist::default());
        let v: Value = serde_json::from_str(&res.body).expect("normalized body is json");
        (v, res.outcome)
    }

    fn tool_names(doc: &Value) -> Vec<&str> {
        doc["tools"]
            .as_array()
            .expect("tools array")
            .iter()
            .map(|t| t["name"].as_str().expect("tool name"))
            .collect()
    }

    #[test]
    fn empty_store_serves_normalized_fallback() {
        for raw in [None, Some("")] {
            let (doc, outcome) = resolve_json(raw);
            assert_eq!(outcome, ResolutionOutcome::Fallback);
            assert_eq!(doc["prompts"], json!([]));
            assert_eq!(doc["resources"], json!([]));
            assert_eq!(doc["endpoint"], json!("/mcp"));
            assert_eq!(doc["endpointURL"], json!("https://mcp.example.org/mcp"));
            assert_eq!(doc["protocolVersion"], json!("2024-11-05"));
            assert_eq!(tool_names(&doc), vec!["fetch", "search"]);
            assert_eq!(
                doc["servers"],
                json!([{
                    "name": "Stelae MCP Proxy",
                    "url": "https://mcp.example.org/mcp",
                    "transport": "streamable-http",
                    "version": "1.0.0"
                }])
            );
        }
    }

    #[test]
    fn stored_endpoint_url_is_never_trusted() {
        let stored = json!({
            "name": "Stelae",
            "endpointURL": "https://staging.example.org/mcp",
            "protocolVersion": "2025-06-18"
        })
        .to_string();
        let (doc, outcome) = resolve_json(Some(&stored));
        assert_eq!(outcome, ResolutionOutcome::Stored);
        assert_eq!(doc["endpointURL"], json!("https://mcp.example.org/mcp"));
        assert_eq!(doc["protocolVersion"], json!("2025-06-18"));
    }

    #[test]
    fn blank_protocol_version_is_defaulted() {
        let stored = json!({ "protocolVersion": "" }).to_string();
        let (doc, _) = resolve_json(Some(&stored));
        assert_eq!(doc["protocolVersion"], json!("2024-11-05"));
    }

    #[test]
    fn malformed_text_is_served_verbatim() {
        let res = resolve(Some("not json"), ORIGIN, &Allowlist::default());
        assert_eq!(res.body, "not json");
        assert!(matches!(res.outcome, ResolutionOutcome::Unparsed { .. }));
    }

    #[test]
    fn non_object_json_is_served_verbatim() {
        let res = resolve(Some("[1,2,3]"), ORIGIN, &Allowlist::default());
        assert_eq!(res.body, "[1,2,3]");
        let ResolutionOutcome::Unparsed { error } = res.outcome else {
            panic!("expected unparsed outcome");
        };
        assert!(error.contains("array"));
    }

    #[test]
    fn custom_fetch_schema_is_preserved_and_unknown_tools_dropped() {
        let fetch = json!({
            "name": "fetch",
            "description": "Fetch a search result by id",
            "inputSchema": {
                "type": "object",
                "properties": { "id": { "type": "string" } },
                "required": ["id"]
            }
        });
        let stored = json!({
            "name": "Stelae",
            "tools": [
                { "name": "workspace_fs_read", "inputSchema": { "type": "object" } },
                fetch.clone(),
                "garbage"
            ]
        })
        .to_string();
        let (doc, _) = resolve_json(Some(&stored));
        assert_eq!(tool_names(&doc), vec!["fetch", "search"]);
        assert_eq!(doc["tools"][0], fetch);
        assert_eq!(doc["tools"][1]["inputSchema"]["required"], json!(["query"]));
    }

    #[test]
    fn stored_fetch_tool_is_emitted_exactly_as_stored() {
        let localized = json!({
            "name": "fetch",
            "description": { "en": "Fetch" },
            "inputSchema": { "type": "object", "properties": { "id": { "type": "string" } } }
        });
        let sparse = json!({ "name": "search", "description": null, "inputSchema": null, "title": "S" });
        let stored = json!({ "tools": [localized.clone(), sparse.clone()] }).to_string();
        let (doc, _) = resolve_json(Some(&stored));
        assert_eq!(doc["tools"], json!([localized, sparse]));
    }

    #[test]
    fn whitespace_values_are_not_defaulted() {
        let stored = json!({
            "protocolVersion": " ",
            "servers": [{ "transport": " ", "url": "" }]
        })
        .to_string();
        let (doc, _) = resolve_json(Some(&stored));
        assert_eq!(doc["protocolVersion"], json!(" "));
        assert_eq!(doc["servers"][0]["transport"], json!(" "));
        assert_eq!(doc["servers"][0]["url"], json!("https://mcp.example.org/mcp"));
    }

    #[test]
    fn tools_that_are_not_an_array_become_placeholders() {
        let stored = json!({ "tools": { "fetch": {} } }).to_string();
        let (doc, _) = resolve_json(Some(&stored));
        assert_eq!(tool_names(&doc), vec!["fetch", "search"]);
        assert_eq!(doc["tools"][0]["inputSchema"]["required"], json!(["url"]));
    }

    #[test]
    fn every_existing_server_is_shallow_merged_in_order() {
        let stored = json!({
            "servers": [
                { "name": "primary", "transport": "sse", "region": "eu" },
                { "name": "secondary", "url": "https://other.example/mcp", "transport": "" },
                42
            ]
        })
        .to_string();
        let (doc, _) = resolve_json(Some(&stored));
        assert_eq!(
            doc["servers"],
            json!([
                {
                    "name": "primary",
                    "transport": "sse",
                    "region": "eu",
                    "url": "https://mcp.example.org/mcp"
                },
                {
                    "name": "secondary",
                    "url": "https://other.example/mcp",
                    "transport": "streamable-http"
                },
                {
                    "transport": "streamable-http",
                    "url": "https://mcp.example.org/mcp"
                }
            ])
        );
    }

    #[test]
    fn synthesized_server_uses_document_name_and_version() {
        let stored = json!({ "name": "Docs", "version": "2.3.0", "servers": [] }).to_string();
        let (doc, _) = resolve_json(Some(&stored));
        assert_eq!(doc["servers"][0]["name"], json!("Docs"));
        assert_eq!(doc["servers"][0]["version"], json!("2.3.0"));
        assert_eq!(doc["servers"][0]["transport"], json!("streamable-http"));
    }

    #[test]
    fn prompts_resources_and_unknown_fields_pass_through() {
        let stored = json!({
            "prompts": [{ "name": "summarize" }],
            "resources": [{ "uri": "file:///a" }],
            "x-build": "abc123"
        })
        .to_string();
        let (doc, _) = resolve_json(Some(&stored));
        assert_eq!(doc["prompts"], json!([{ "name": "summarize" }]));
        assert_eq!(doc["resources"], json!([{ "uri": "file:///a" }]));
        assert_eq!(doc["x-build"], json!("abc123"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let allow = Allowlist::default();
        let once = normalize(fallback_manifest(ORIGIN), ORIGIN, &allow);
        let twice = normalize(once.clone(), ORIGIN, &allow);
        assert_eq!(once, twice);
    }
}
