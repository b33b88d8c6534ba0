//! Watermark persisted as a plain decimal in a file.

use anyhow::{Context, Result};
use notify_core::host::WatermarkStore;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileWatermark {
    path: PathBuf,
}

impl FileWatermark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WatermarkStore for FileWatermark {
    /// A missing file reads as 0.
    fn load(&mut self) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        content
            .trim()
            .parse()
            .with_context(|| format!("Invalid watermark in {}", self.path.display()))
    }

    fn save(&mut self, watermark: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        fs::write(&self.path, format!("{watermark}\n"))
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
