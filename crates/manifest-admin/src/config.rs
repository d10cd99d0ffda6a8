//! Saved CLI settings.

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_DIR: &str = "stelae";
const FILE_NAME: &str = "manifest-admin.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Public base URL of the edge, e.g. `https://mcp.example.org/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl CliConfig {
    /// `$XDG_CONFIG_HOME/stelae/manifest-admin.json`, falling back to `~/.config`.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let config_home = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .context("neither XDG_CONFIG_HOME nor HOME is set")?,
        };
        Ok(config_home.join(APP_DIR).join(FILE_NAME))
    }

    /// Read the config at `path`. A missing file is an empty config.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("read config {}", path.display())),
        };
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Write the config to a sibling temp file, then rename it into place.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        let mut text = serde_json::to_string_pretty(self).context("serialize config")?;
        text.push('\n');
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, text).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("replace config {}", path.display()))?;
        Ok(())
    }

    pub fn set_base(&mut self, base: &Url) {
        self.base_url = Some(base.to_string());
    }
}
