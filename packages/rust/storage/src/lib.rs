//! Used-reference store.
//!
//! Persists the reference URLs already cited by previous runs so a URL is
//! never offered to the model twice. The on-disk format is a small JSON
//! file: `{"used_urls": ["https://...", ...]}`, read once at run start,
//! appended and rewritten after each successful reference fetch.
//!
//! No locking: the process is single-instance per run. Concurrent runs
//! would race on this file (documented limitation).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use postsmith_shared::{PostsmithError, Result};

/// On-disk shape of the store file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UsedRefsFile {
    #[serde(default)]
    used_urls: Vec<String>,
}

/// Append-only store of previously used reference URLs.
#[derive(Debug)]
pub struct UsedRefStore {
    path: PathBuf,
    urls: Vec<String>,
}

impl UsedRefStore {
    /// Load the store from `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(?path, "used-reference file not found, starting empty");
            return Ok(Self {
                path: path.to_path_buf(),
                urls: Vec::new(),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| PostsmithError::io(path, e))?;
        let file: UsedRefsFile = serde_json::from_str(&content).map_err(|e| {
            PostsmithError::Storage(format!("invalid used-reference file {}: {e}", path.display()))
        })?;

        info!(count = file.used_urls.len(), ?path, "loaded used references");

        Ok(Self {
            path: path.to_path_buf(),
            urls: file.used_urls,
        })
    }

    /// Whether `url` has already been cited in a previous run.
    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    /// All recorded URLs, oldest first.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Append `new_urls` and rewrite the file.
    pub fn record(&mut self, new_urls: &[String]) -> Result<()> {
        self.urls.extend(new_urls.iter().cloned());
        self.save()
    }

    fn save(&self) -> Result<()> {
        let file = UsedRefsFile {
            used_urls: self.urls.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| PostsmithError::Storage(format!("serialize used references: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PostsmithError::io(parent, e))?;
            }
        }
        std::fs::write(&self.path, json).map_err(|e| PostsmithError::io(&self.path, e))?;

        debug!(count = self.urls.len(), path = %self.path.display(), "saved used references");
        Ok(())
    }
}
