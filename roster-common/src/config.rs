//! Bootstrap configuration and root folder resolution
//!
//! The TOML file carries only what is needed to start the admin service.
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent default (fallback)

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::library::DEFAULT_MAX_UPLOAD_BYTES;
use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ROSTER_ROOT_FOLDER";

/// Default admin service port
pub const DEFAULT_PORT: u16 = 5780;

/// Where team data is persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Local SQLite file at `database_path`
    #[default]
    Sqlite,
    /// Hosted PostgREST-style backend
    Rest { url: String, api_key: String },
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Admin service bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub root_folder: Option<PathBuf>,
    /// Relative paths resolve against the root folder
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    pub image_dir: PathBuf,
    pub public_image_base_url: String,
    pub max_upload_bytes: usize,
    pub content_dir: PathBuf,
    /// Unset disables the admin token check
    pub admin_token: Option<String>,
    pub seed_defaults: bool,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_path: PathBuf::from("roster.db"),
            bind_addr: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            image_dir: PathBuf::from("images"),
            public_image_base_url: "/images".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            content_dir: PathBuf::from("content"),
            admin_token: None,
            seed_defaults: true,
            backend: BackendConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AdminConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, else the platform config file if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }
        if let BackendConfig::Rest { url, .. } = &self.backend {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!("backend url must be http(s): {}", url)));
            }
        }
        Ok(())
    }

    /// Resolve relative paths against `root`
    pub fn resolve_paths(&self, root: &Path) -> ResolvedPaths {
        let under_root = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        ResolvedPaths {
            root: root.to_path_buf(),
            database: under_root(&self.database_path),
            images: under_root(&self.image_dir),
            content: under_root(&self.content_dir),
        }
    }
}

/// Absolute locations derived from the root folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub database: PathBuf,
    pub images: PathBuf,
    pub content: PathBuf,
}

pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &AdminConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Platform config file: `<config dir>/roster/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("roster").join("config.toml"))
}

fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("roster"))
        .unwrap_or_else(|| PathBuf::from("./roster_data"))
}
