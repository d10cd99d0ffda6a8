//! Allowlist-driven tool reconciliation.
//!
//! The downstream connector verifier only recognizes a fixed set of capability names. The
//! emitted `tools` list therefore always contains exactly the allowlisted names, in allowlist
//! order, regardless of what the stored document declares.

use crate::model::ToolDescriptor;
use serde_json::Value;
use std::collections::HashMap;

pub const FETCH_TOOL: &str = "fetch";
pub const SEARCH_TOOL: &str = "search";

/// Ordered allowlist of tool names plus the placeholder used when a name is not declared.
#[derive(Debug, Clone)]
pub struct Allowlist {
    names: Vec<String>,
    placeholders: HashMap<String, ToolDescriptor>,
}

impl Allowlist {
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn placeholders(&self) -> &HashMap<String, ToolDescriptor> {
        &self.placeholders
    }

    /// Reconcile declared tool entries against this allowlist.
    #[must_use]
    pub fn apply(&self, declared: &[Value]) -> Vec<Value> {
        reconcile(&self.names, declared, &self.placeholders)
    }
}

impl Default for Allowlist {
    fn default() -> Self {
        let fetch = ToolDescriptor::single_string_field(
            FETCH_TOOL,
            "Fetch a document by URL and return its contents.",
            "url",
        );
        let search = ToolDescriptor::single_string_field(
            SEARCH_TOOL,
            "Search indexed documents and return matching results.",
            "query",
        );
        Self {
            names: vec![FETCH_TOOL.to_string(), SEARCH_TOOL.to_string()],
            placeholders: HashMap::from([
                (FETCH_TOOL.to_string(), fetch),
                (SEARCH_TOOL.to_string(), search),
            ]),
        }
    }
}

/// `name` of a declared entry, if it is an object with a string `name`.
fn declared_name(entry: &Value) -> Option<&str> {
    entry.as_object()?.get("name")?.as_str()
}

/// Produce exactly one descriptor per allowed name, in `allowed` order.
///
/// A declared entry with the exact name is emitted as stored, byte for byte (first one
/// wins); otherwise the placeholder is used. Entries that are not objects, have no string
/// `name`, or are named outside `allowed` are dropped. An allowed name with neither a
/// declaration nor a placeholder is skipped.
#[must_use]
pub fn reconcile(
    allowed: &[String],
    declared: &[Value],
    placeholders: &HashMap<String, ToolDescriptor>,
) -> Vec<Value> {
    allowed
        .iter()
        .filter_map(|name| {
            declared
                .iter()
                .find(|entry| declared_name(entry) == Some(name.as_str()))
                .cloned()
                .or_else(|| placeholders.get(name).map(ToolDescriptor::to_value))
        })
        .collect()
}
