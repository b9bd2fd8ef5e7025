//! Configuration file loading

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use yindent_core::YindentConfig;

use crate::cli::OutputFormat;

/// Load `--config` when given, otherwise `.yindent.toml` from the working
/// directory if it exists.
pub fn load_config(path: Option<&Utf8PathBuf>) -> Result<Option<YindentConfig>> {
    if let Some(p) = path {
        let config = YindentConfig::from_file(p.as_std_path())
            .with_context(|| format!("failed to load {p}"))?;
        return Ok(Some(config));
    }
    Ok(YindentConfig::load_default_strict()?)
}

/// `--json` wins over the configured format.
pub fn output_format(json: bool, config: Option<&YindentConfig>) -> OutputFormat {
    if json {
        return OutputFormat::Json;
    }
    match config.and_then(|c| c.format.as_deref()) {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Human,
    }
}
