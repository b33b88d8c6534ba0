use anyhow::{Context, Result};
use notify_core::EngineConfig;
use notify_core::config::load_config;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::output::{self, OutputMode};

/// `<config dir>/notify/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("notify").join("config.toml"))
}

/// Load the engine config, or defaults when no path is known.
pub fn resolve_config(path: Option<&Path>) -> Result<EngineConfig> {
    path.map_or_else(|| Ok(EngineConfig::default()), load_config)
}

pub fn run_config(path: Option<&Path>, output: OutputMode) -> Result<()> {
    let config = resolve_config(path)?;
    let stdout = io::stdout();
    let mut w = stdout.lock();

    if output.is_json() {
        output::write_json(&mut w, &config)?;
        return Ok(());
    }

    let source = path.map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string());
    output::pretty_kv(&mut w, "source", source)?;
    output::pretty_rule(&mut w)?;
    let body = toml::to_string_pretty(&config).context("Failed to serialize config")?;
    write!(w, "{body}")?;
    Ok(())
}
