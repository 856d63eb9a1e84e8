use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::image::DEFAULT_BUFFER_BYTES;

const MIN_BUFFER_BYTES: usize = 4 * 1024;
const MAX_BUFFER_BYTES: usize = 64 * 1024 * 1024;

/// Global configuration loaded from `~/.config/chunkcheck/config.toml`.
///
/// The signing key is not configurable; it is compiled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkcheckConfig {
    /// Image read buffer in bytes. Clamped to 4 KiB..=64 MiB.
    pub read_buffer_bytes: usize,
    /// Directory searched for image/chunklist pairs when no paths are given.
    pub recovery_dir: PathBuf,
    /// Basename of the pair inside `recovery_dir` (`<name>.dmg`, `<name>.chunklist`).
    pub default_basename: String,
    /// Print per-chunk progress to stderr.
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_show_progress() -> bool {
    true
}

impl Default for ChunkcheckConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: DEFAULT_BUFFER_BYTES,
            recovery_dir: PathBuf::from("com.apple.recovery.boot"),
            default_basename: "BaseSystem".to_string(),
            show_progress: true,
        }
    }
}

impl ChunkcheckConfig {
    /// Read buffer size actually used for image streaming.
    pub fn buffer_bytes(&self) -> usize {
        self.read_buffer_bytes
            .clamp(MIN_BUFFER_BYTES, MAX_BUFFER_BYTES)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunkcheck")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ChunkcheckConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ChunkcheckConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ChunkcheckConfig = toml::from_str(&data)?;
    Ok(cfg)
}
