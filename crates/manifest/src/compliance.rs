//! Connector compliance checks for a served manifest.
//!
//! Mirrors what the downstream connector verifier rejects, so an operator can check a live
//! edge (or a rendered document) before pointing a client at it.

use crate::endpoint_url;
use crate::model::{json_kind, non_empty_str};
use crate::tools::Allowlist;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplianceIssue {
    #[error("manifest is not a JSON object (got {0})")]
    NotAnObject(&'static str),

    #[error("endpointURL is missing")]
    MissingEndpointUrl,

    #[error("endpointURL is '{actual}', expected '{expected}'")]
    EndpointUrlMismatch { expected: String, actual: String },

    #[error("protocolVersion is missing or empty")]
    MissingProtocolVersion,

    #[error("servers is missing or empty")]
    NoServers,

    #[error("servers[{index}] is missing '{field}'")]
    ServerFieldMissing { index: usize, field: &'static str },

    #[error("tools are {actual:?}, expected exactly {expected:?}")]
    ToolSetMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("tool '{name}' has no object inputSchema with a properties map")]
    InvalidInputSchema { name: String },
}

/// Check `doc` against the connector contract.
///
/// When `expected_origin` is given, `endpointURL` must equal `${origin}/mcp`.
#[must_use]
pub fn check(
    doc: &Value,
    expected_origin: Option<&str>,
    allowlist: &Allowlist,
) -> Vec<ComplianceIssue> {
    let Some(obj) = doc.as_object() else {
        return vec![ComplianceIssue::NotAnObject(json_kind(doc))];
    };
    let mut issues = Vec::new();

    match (non_empty_str(obj.get("endpointURL")), expected_origin) {
        (None, _) => issues.push(ComplianceIssue::MissingEndpointUrl),
        (Some(actual), Some(origin)) => {
            let expected = endpoint_url(origin);
            if actual != expected {
                issues.push(ComplianceIssue::EndpointUrlMismatch {
                    expected,
                    actual: actual.to_string(),
                });
            }
        }
        (Some(_), None) => {}
    }

    if non_empty_str(obj.get("protocolVersion")).is_none() {
        issues.push(ComplianceIssue::MissingProtocolVersion);
    }

    match obj.get("servers").and_then(Value::as_array) {
        Some(servers) if !servers.is_empty() => {
            for (index, server) in servers.iter().enumerate() {
                for field in ["transport", "url"] {
                    if non_empty_str(server.get(field)).is_none() {
                        issues.push(ComplianceIssue::ServerFieldMissing { index, field });
                    }
                }
            }
        }
        _ => issues.push(ComplianceIssue::NoServers),
    }

    let tools: &[Value] = obj
        .get("tools")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let actual: Vec<String> = tools
        .iter()
        .map(|t| t.get("name").and_then(Value::as_str).unwrap_or("").to_string())
        .collect();
    if actual != allowlist.names() {
        issues.push(ComplianceIssue::ToolSetMismatch {
            expected: allowlist.names().to_vec(),
            actual: actual.clone(),
        });
    }
    for (tool, name) in tools.iter().zip(actual) {
        let has_properties = tool
            .get("inputSchema")
            .and_then(|s| s.get("properties"))
            .is_some_and(Value::is_object);
        if !has_properties {
            issues.push(ComplianceIssue::InvalidInputSchema { name });
        }
    }

    issues
}
