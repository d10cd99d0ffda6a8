mod api;
mod config;

use anyhow::Context as _;
use api::EdgeClient;
use config::CliConfig;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize as _;
use serde_json::Value;
use std::io::Read as _;
use std::path::PathBuf;
use std::process::ExitCode;
use stelae_manifest::compliance::{self, ComplianceIssue};
use stelae_manifest::{Allowlist, ResolutionOutcome, resolve};
use url::Url;

const MANIFEST_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Parser)]
#[command(
    name = "stelae-manifest-admin",
    version,
    about = "Check and render the MCP connector manifest"
)]
struct Cli {
    /// Public base URL of the edge (overrides the saved config).
    #[arg(long, env = "STELAE_ADMIN_BASE_URL", global = true)]
    base: Option<String>,

    /// Config file path (default: `$XDG_CONFIG_HOME/stelae/manifest-admin.json`).
    #[arg(long, env = "STELAE_ADMIN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of human output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch the served manifest (or read a local file) and report compliance issues.
    Check {
        /// Check this file instead of the live edge.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Origin the document's endpointURL must match (defaults to the base URL's origin).
        #[arg(long)]
        origin: Option<String>,
    },
    /// Render what the edge would serve for a stored document, without any network access.
    Render {
        /// Stored manifest text (`-` for stdin); a missing file renders the fallback.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Request origin, e.g. `https://mcp.example.org`.
        #[arg(long)]
        origin: String,
    },
    /// Call the edge's diagnostic endpoint.
    Diag,
    /// Manage the saved CLI config.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Save the edge base URL.
    SetBase { url: String },
    /// Print the saved config.
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = match &cli.config {
        Some(p) => p.clone(),
        None => CliConfig::default_path()?,
    };

    match cli.command {
        Command::Config { command } => {
            let mut cfg = CliConfig::load(&config_path)?;
            match command {
                ConfigCommand::SetBase { url } => {
                    let url = parse_base(&url)?;
                    cfg.set_base(&url);
                    cfg.save(&config_path)?;
                    println!("{} base url set to {url}", "ok".green());
                }
                ConfigCommand::Show => {
                    println!("{}", serde_json::to_string_pretty(&cfg)?);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Render { input, origin } => {
            let raw = match &input {
                Some(path) => read_stored(path)?,
                None => None,
            };
            let origin = parse_base(&origin)?.origin().ascii_serialization();
            let resolution = resolve(raw.as_deref(), &origin, &Allowlist::default());
            if let ResolutionOutcome::Unparsed { error } = &resolution.outcome {
                eprintln!(
                    "{} stored document is unusable and would be served verbatim: {error}",
                    "warning:".yellow().bold()
                );
            }
            match serde_json::from_str::<Value>(&resolution.body) {
                Ok(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
                Err(_) => println!("{}", resolution.body),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { file, origin } => {
            let (doc, expected_origin) = match file {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("read {}", path.display()))?;
                    let doc: Value = serde_json::from_str(&text)
                        .with_context(|| format!("parse {}", path.display()))?;
                    (doc, origin)
                }
                None => {
                    let client = edge_client(cli.base.as_deref(), &config_path)?;
                    let served = client.manifest().await?;
                    if !cli.json {
                        println!("{} {}", served.status, client.origin().dimmed());
                        for (name, value) in [
                            ("content-type", &served.content_type),
                            ("cache-control", &served.cache_control),
                        ] {
                            println!("  {name}: {}", value.as_deref().unwrap_or("-"));
                        }
                    }
                    if served.content_type.as_deref() != Some(MANIFEST_CONTENT_TYPE) {
                        eprintln!(
                            "{} unexpected content-type {:?}",
                            "warning:".yellow().bold(),
                            served.content_type
                        );
                    }
                    (served.json()?, origin.or_else(|| Some(client.origin())))
                }
            };
            let issues =
                compliance::check(&doc, expected_origin.as_deref(), &Allowlist::default());
            report(&issues, cli.json)?;
            Ok(if issues.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Diag => {
            let client = edge_client(cli.base.as_deref(), &config_path)?;
            let diag = client.diag().await?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": diag.ok,
                        "host": diag.host,
                        "path": diag.path,
                        "ts": diag.ts,
                    })
                );
            } else {
                println!(
                    "{} host={} path={} ts={}",
                    if diag.ok {
                        "ok".green().to_string()
                    } else {
                        "not ok".red().to_string()
                    },
                    diag.host,
                    diag.path,
                    diag.ts
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Stored text for `render`. `-` is stdin; a missing file is an empty store.
fn read_stored(path: &std::path::Path) -> anyhow::Result<Option<String>> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin")?;
        return Ok(Some(text));
    }
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

fn parse_base(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("url must be http(s), got '{raw}'");
    }
    Ok(url)
}

fn edge_client(flag: Option<&str>, config_path: &std::path::Path) -> anyhow::Result<EdgeClient> {
    let base = match flag {
        Some(b) => b.to_string(),
        None => CliConfig::load(config_path)?.base_url.context(
            "no edge base url; pass --base or run `stelae-manifest-admin config set-base <url>`",
        )?,
    };
    EdgeClient::new(parse_base(&base)?)
}

fn report(issues: &[ComplianceIssue], json: bool) -> anyhow::Result<()> {
    if json {
        let issues: Vec<String> = issues.iter().map(ToString::to_string).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "compliant": issues.is_empty(),
                "issues": issues,
            }))?
        );
        return Ok(());
    }
    if issues.is_empty() {
        println!("{} manifest is compliant", "ok".green());
    } else {
        for issue in issues {
            println!("{} {issue}", "✗".red());
        }
    }
    Ok(())
}
