mod common;

use common::*;
use parking_lot::Mutex;
use serde_json::Value;
use std::io;
use std::sync::Arc;
use stelae_manifest_edge::store::MemoryStore;

/// Shared buffer the JSON formatter writes into.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn records(&self) -> Vec<Value> {
        let raw = String::from_utf8_lossy(&self.0.lock()).into_owned();
        raw.lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

fn stages_for<'a>(records: &'a [Value], path: &str) -> Vec<&'a str> {
    records
        .iter()
        .filter(|r| r["path"] == path)
        .filter_map(|r| r["stage"].as_str())
        .collect()
}

#[tokio::test]
async fn every_request_logs_entry_and_routing_decision() -> anyhow::Result<()> {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = MemoryStore::new();
    store.put("manifest_json", "not json");
    let origin = spawn_stub_origin().await?;
    let base = spawn_edge(context(Arc::new(store), &origin)?).await?;

    let client = http_client()?;
    for path in ["/", "/__diag", "/.well-known/mcp/manifest.json", "/mcp"] {
        client
            .get(format!("{base}{path}"))
            .header("user-agent", "stelae-tests/1.0")
            .send()
            .await?;
    }

    let records = captured.records();
    assert_eq!(stages_for(&records, "/"), ["request", "redirect"]);
    assert_eq!(stages_for(&records, "/__diag"), ["request", "diag"]);
    assert_eq!(
        stages_for(&records, "/.well-known/mcp/manifest.json"),
        ["request", "manifest_parse_error", "manifest"]
    );
    assert_eq!(stages_for(&records, "/mcp"), ["request", "forward"]);

    let staged: Vec<&Value> = records.iter().filter(|r| r["stage"].is_string()).collect();
    assert_eq!(staged.len(), 9);
    for record in staged {
        assert_eq!(record["method"], "GET");
        assert_eq!(record["user_agent"], "stelae-tests/1.0");
        assert!(record["ts"].as_i64().is_some_and(|ts| ts > 0), "{record}");
    }

    let manifest = records
        .iter()
        .find(|r| r["stage"] == "manifest")
        .expect("manifest record");
    assert_eq!(manifest["outcome"], "unparsed");
    let parse_error = records
        .iter()
        .find(|r| r["stage"] == "manifest_parse_error")
        .expect("parse error record");
    assert!(parse_error["error"].as_str().is_some_and(|e| !e.is_empty()));
    Ok(())
}
