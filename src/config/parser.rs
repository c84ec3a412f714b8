//! TOML parsing with file context.

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::PugcheckError;

/// Read and deserialize a TOML file.
///
/// Syntax and schema errors become [`PugcheckError::ConfigParseError`]
/// naming the file.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content).map_err(|e| PugcheckError::ConfigParseError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(config)
}
