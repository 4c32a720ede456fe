use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json;

use super::TokenPair;

/// File-backed persistence for the token pair.
///
/// The pair is written as a single JSON document so both tokens land on
/// disk in one atomic rename; a reader never sees a half-updated pair.
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted pair, `None` if no file exists.
    pub fn load(&self) -> Result<Option<TokenPair>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read token file")?;
        let pair: TokenPair =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(pair))
    }

    /// Write the pair via a temp file and rename.
    pub fn save(&self, pair: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create token directory")?;
        }
        let contents = serde_json::to_string_pretty(pair)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents).context("Failed to write token file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace token file")?;
        Ok(())
    }

    /// Remove the persisted pair. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}
