use super::{ManifestStore, non_empty};
use crate::error::{EdgeError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// One file per key inside a directory. A missing file is an absent key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\', '\0']);
        if !valid {
            return Err(EdgeError::Store(format!("invalid store key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl ManifestStore for FileStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            // Invalid UTF-8 is decoded lossily, matching an HTTP text body.
            Ok(bytes) => Ok(non_empty(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EdgeError::Store(format!("read {}: {e}", path.display()))),
        }
    }
}
