//! # Configuration
//!
//! Optional TOML file plus CLI flags, resolved in the order
//! CLI flag > config file > built-in default.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [storage]
//! database = "sprout.db"
//! backend = "redb"
//!
//! [content]
//! path = "data/milestones_en.csv"
//! ```
//!
//! Security knobs (`SPROUT_API_KEY`, `SPROUT_CORS_ORIGINS`,
//! `SPROUT_RATE_LIMIT`) stay in the environment.

use serde::Deserialize;
use sprout_core::{Registry, SproutError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "sprout.toml";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE: &str = "sprout.db";
pub const DEFAULT_CONTENT: &str = "data/milestones_en.csv";

/// Maximum config file size (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

// =============================================================================
// BACKEND
// =============================================================================

/// Record storage selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// ACID redb database file.
    #[default]
    Redb,
    /// Process-local maps, lost on exit.
    Memory,
}

impl Backend {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Redb => "redb",
            Backend::Memory => "memory",
        }
    }

    /// Open a registry on this backend.
    pub fn open(&self, database: &Path) -> Result<Registry, SproutError> {
        match self {
            Backend::Redb => Registry::with_redb(database),
            Backend::Memory => Ok(Registry::new()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Backend::Redb),
            "memory" => Ok(Backend::Memory),
            other => Err(SproutError::InvalidInput(format!(
                "unknown backend '{}' (expected redb or memory)",
                other
            ))),
        }
    }
}

// =============================================================================
// FILE CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub database: Option<PathBuf>,
    pub backend: Option<Backend>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentSection {
    pub path: Option<PathBuf>,
}

/// Contents of a `sprout.toml` file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub storage: StorageSection,
    pub content: ContentSection,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, SproutError> {
        toml::from_str(text).map_err(|e| SproutError::SerializationError(format!("Config: {}", e)))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, SproutError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            SproutError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(SproutError::SerializationError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            SproutError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Load the explicit file if given, else `sprout.toml` if it exists,
    /// else an empty config. A missing explicit file is an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, SproutError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    tracing::debug!("Using config file {}", DEFAULT_CONFIG_FILE);
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub content: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub backend: Backend,
    /// `None` when no content file was configured and the default is absent.
    pub content: Option<PathBuf>,
}

impl Settings {
    #[must_use]
    pub fn resolve(file: FileConfig, cli: Overrides) -> Self {
        let content = cli.content.or(file.content.path).or_else(|| {
            let default = PathBuf::from(DEFAULT_CONTENT);
            default.is_file().then_some(default)
        });

        Self {
            host: cli
                .host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            database: cli
                .database
                .or(file.storage.database)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            backend: cli.backend.or(file.storage.backend).unwrap_or_default(),
            content,
        }
    }

    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
