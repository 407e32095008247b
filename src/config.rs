//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, else the platform config dir's
//!    `dupemgr/config.toml`)
//! 3. `DUPEMGR_*` environment variables (e.g. `DUPEMGR_USE_TRASH=true`)
//! 4. CLI flags, applied by the caller after loading
//!
//! ```toml
//! trash_dirs = [".Trash", ".local/share/Trash", "$RECYCLE.BIN"]
//! block_size = 32768
//! algorithm = "sha256"
//! skip_hidden = false
//! use_trash = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::DeleteConfig;
use crate::duplicates::{FinderConfig, DEFAULT_TRASH_DIRS};
use crate::scanner::{HashAlgorithm, Hasher, TreeOptions, DEFAULT_BLOCK_SIZE};

/// Prefix of environment variables read by [`Config::figment`].
pub const ENV_PREFIX: &str = "DUPEMGR_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path fragments treated as trash cans and never searched.
    pub trash_dirs: Vec<String>,
    /// Read block size used while hashing, capped at `MAX_BLOCK_SIZE`.
    pub block_size: usize,
    /// Content digest.
    pub algorithm: HashAlgorithm,
    /// Ignore dot-prefixed files and directories.
    pub skip_hidden: bool,
    /// Move removed files to the system trash instead of unlinking them.
    pub use_trash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trash_dirs: DEFAULT_TRASH_DIRS.iter().map(|s| (*s).to_string()).collect(),
            block_size: DEFAULT_BLOCK_SIZE,
            algorithm: HashAlgorithm::default(),
            skip_hidden: false,
            use_trash: false,
        }
    }
}

impl Config {
    /// Load configuration from `path` (or the default location) and the
    /// environment.
    ///
    /// A missing file is not an error; a malformed one is.
    ///
    /// # Errors
    ///
    /// Returns a figment error if a source cannot be parsed into a `Config`.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// The layered provider stack, without CLI overrides.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            log::debug!("Reading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Platform-specific configuration file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupemgr").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Hasher for these settings.
    #[must_use]
    pub fn hasher(&self) -> Hasher {
        Hasher::new()
            .with_algorithm(self.algorithm)
            .with_block_size(self.block_size)
    }

    /// Finder configuration for these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_trash_dirs(self.trash_dirs.clone())
            .with_tree_options(TreeOptions {
                skip_hidden: self.skip_hidden,
            })
    }

    /// Deletion settings for these settings.
    #[must_use]
    pub fn delete_config(&self) -> DeleteConfig {
        if self.use_trash {
            DeleteConfig::trash()
        } else {
            DeleteConfig::permanent()
        }
    }
}
