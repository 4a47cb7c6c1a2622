//! Seed-tool configuration.
//!
//! The seed file and entropy device live at installation-defined paths;
//! the tool reads them from an optional TOML file and falls back to the
//! built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filesystem locations used by the seed tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPaths {
    /// Location of the persisted seed file.
    pub seed_file: PathBuf,
    /// The kernel's write-entropy device node.
    pub entropy_device: PathBuf,
}

impl Default for SeedPaths {
    fn default() -> Self {
        Self {
            seed_file: PathBuf::from("/var/db/prng.seed"),
            entropy_device: PathBuf::from("/dev/random"),
        }
    }
}

impl SeedPaths {
    /// Validates the configured paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.seed_file.is_absolute() || !self.entropy_device.is_absolute() {
            return Err(ConfigError::RelativePath);
        }
        Ok(())
    }

    /// Loads paths from a TOML file, falling back to the defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::Io(err)),
        };
        toml::from_str(&text).map_err(ConfigError::Parse)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured path is empty or relative.
    #[error("paths must be absolute")]
    RelativePath,
    /// The configuration file could not be read.
    #[error("config read: {0}")]
    Io(#[source] std::io::Error),
    /// The configuration file is not valid TOML.
    #[error("config parse: {0}")]
    Parse(#[source] toml::de::Error),
}
