use crate::model::JsonObject;
use crate::{ENDPOINT_PATH, endpoint_url};
use serde_json::{Value, json};

pub const DEFAULT_NAME: &str = "Stelae MCP Proxy";
pub const FALLBACK_DESCRIPTION: &str = "Edge-served manifest (fallback); KV not populated yet.";

/// Minimal manifest served when the store has nothing under the manifest key.
///
/// `tools` and `servers` are left out on purpose; normalization fills them in.
#[must_use]
pub fn fallback_manifest(origin: &str) -> JsonObject {
    let mut doc = JsonObject::new();
    doc.insert("name".into(), json!(DEFAULT_NAME));
    doc.insert("description".into(), json!(FALLBACK_DESCRIPTION));
    doc.insert("endpoint".into(), json!(ENDPOINT_PATH));
    doc.insert("endpointURL".into(), Value::String(endpoint_url(origin)));
    doc.insert("prompts".into(), json!([]));
    doc.insert("resources".into(), json!([]));
    doc
}
