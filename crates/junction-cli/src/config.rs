//! Discovery and loading of the TOML configuration file.
//!
//! The first existing candidate wins: the `--config` path, then
//! `junction/config.toml` under the working directory, then `config.toml` in
//! the platform configuration directory. Without any file the defaults apply.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use junction::{JunctionError, config::AppConfig};

const LOCAL_CONFIG: &str = "junction/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for JunctionError {
    fn from(err: ConfigError) -> Self {
        let kind = match err {
            ConfigError::Parse { .. } => io::ErrorKind::InvalidData,
            ConfigError::MissingFile(_) => io::ErrorKind::NotFound,
        };
        JunctionError::Io(io::Error::new(kind, err.to_string()))
    }
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Explicit,
    Local,
    System,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Origin::Explicit => "explicit",
            Origin::Local => "local",
            Origin::System => "system",
        })
    }
}

/// Load the configuration for this run.
///
/// # Errors
///
/// Fails when an explicit path does not exist, or when the chosen file is
/// not valid configuration TOML.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, JunctionError> {
    if let Some(path) = explicit_path {
        return load_config_file(path.as_ref(), Origin::Explicit);
    }

    let mut candidates = vec![(PathBuf::from(LOCAL_CONFIG), Origin::Local)];
    match ProjectDirs::from("com", "junction", "junction") {
        Some(dirs) => candidates.push((dirs.config_dir().join("config.toml"), Origin::System)),
        None => debug!("Could not determine platform-specific config directory"),
    }

    for (path, origin) in candidates {
        if path.exists() {
            return load_config_file(&path, origin);
        }
        debug!(path:? = path, origin:%; "Configuration file not found");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: &Path, origin: Origin) -> Result<AppConfig, JunctionError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }
    info!(path:? = path, origin:%; "Loading configuration");

    let content = fs::read_to_string(path)?;
    let config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(config)
}
