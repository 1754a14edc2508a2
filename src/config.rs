use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::generate::DEFAULT_GENERATOR;
use crate::options::ResolveOptions;

pub const CONFIG_ENV: &str = "TW_INLINE_CONFIG";
pub const GENERATOR_ENV: &str = "TW_INLINE_GENERATOR";

/// Contents of a setup file. Mirrors the arguments of
/// [`crate::resolver::tailwind_to_css`]; `warmup` stays a raw JSON value so
/// non-string batches can be rejected by warmup itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetupFile {
    pub config: Option<Value>,
    pub options: Option<ResolveOptions>,
    pub warmup: Option<Value>,
}

pub fn resolve_setup_path(cli: &Cli) -> Result<Option<PathBuf>> {
    if let Some(p) = cli.config.clone() {
        return Ok(Some(p));
    }

    if let Ok(p) = env::var(CONFIG_ENV) {
        return Ok(Some(PathBuf::from(p)));
    }

    let default_path = tw_inline_home()?.join("config.json");
    if default_path.exists() {
        return Ok(Some(default_path));
    }

    Ok(None)
}

pub fn load_setup(path: Option<&Path>) -> Result<SetupFile> {
    let Some(path) = path else {
        return Ok(SetupFile::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read setup file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse setup file: {}", path.display()))
}

pub fn resolve_generator_path(cli: &Cli) -> PathBuf {
    if let Some(p) = cli.generator.clone() {
        return p;
    }

    if let Ok(p) = env::var(GENERATOR_ENV) {
        return PathBuf::from(p);
    }

    PathBuf::from(DEFAULT_GENERATOR)
}

fn tw_inline_home() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve config directory"))?;
    Ok(base.join("tw-inline"))
}
