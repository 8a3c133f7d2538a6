//! Subcommands of the `ordr` binary.

pub mod batch;
pub mod config;
pub mod fingerprint;
pub mod process;

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::debug;

use ordr_core::models::ConflictPolicy;
use ordr_core::{OrdrConfig, Vendor};

/// Default configuration file, `<config dir>/ordr/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ordr")
        .join("config.json")
}

/// Load the configuration named by `--config`, else the default file when
/// it exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<OrdrConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return Ok(OrdrConfig::from_file(Path::new(path))?);
    }
    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(OrdrConfig::from_file(&default_path)?)
    } else {
        Ok(OrdrConfig::default())
    }
}

/// `--on-conflict` values.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OnConflict {
    Overwrite,
    Reject,
    Skip,
}

impl From<OnConflict> for ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Overwrite => ConflictPolicy::Overwrite,
            OnConflict::Reject => ConflictPolicy::Reject,
            OnConflict::Skip => ConflictPolicy::Skip,
        }
    }
}

/// Parse `--vendor` through the library's vendor identifiers.
pub fn parse_vendor(value: &str) -> Result<Vendor, String> {
    value.parse::<Vendor>().map_err(|e| {
        let known: Vec<&str> = Vendor::ALL.iter().map(Vendor::id).collect();
        format!("{} (expected one of: {})", e, known.join(", "))
    })
}
