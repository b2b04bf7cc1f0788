//! Layered key/value configuration sources.
//!
//! Sources, lowest precedence first:
//! 1. user env file (`<config dir>/commit-gate/config.env`)
//! 2. repository env file (`<repo>/.commit-gate.env`)
//! 3. process environment
//!
//! Files use dotenv syntax and are read without touching the process
//! environment, so the resolver only ever sees the merged map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

/// Merged configuration values keyed by variable name.
pub type EnvMap = BTreeMap<String, String>;

/// Env file looked up at the repository root.
pub const REPO_ENV_FILE: &str = ".commit-gate.env";

/// Location of the user-wide env file, if the platform has a config dir.
pub fn user_env_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("commit-gate").join("config.env"))
}

/// Read one dotenv-style file. A missing file is an empty map.
pub fn read_env_file(path: &Path) -> Result<EnvMap, ConfigError> {
    if !path.is_file() {
        return Ok(EnvMap::new());
    }

    let iter = dotenvy::from_path_iter(path).map_err(|source| ConfigError::ReadEnvFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut map = EnvMap::new();
    for item in iter {
        let (key, value) = item.map_err(|source| ConfigError::ReadEnvFile {
            path: path.to_path_buf(),
            source,
        })?;
        map.insert(key, value);
    }

    debug!("Read {} settings from {}", map.len(), path.display());
    Ok(map)
}

/// Overlay `upper` onto `base`; keys in `upper` win.
pub fn layer(mut base: EnvMap, upper: EnvMap) -> EnvMap {
    base.extend(upper);
    base
}

/// Build the merged map for a run.
///
/// `repo_root` is `None` when running outside a repository (e.g. `config`
/// from an arbitrary directory); only the user file and process env apply.
pub fn load_layered(repo_root: Option<&Path>) -> Result<EnvMap, ConfigError> {
    let mut merged = match user_env_file() {
        Some(path) => read_env_file(&path)?,
        None => EnvMap::new(),
    };

    if let Some(root) = repo_root {
        merged = layer(merged, read_env_file(&root.join(REPO_ENV_FILE))?);
    }

    Ok(layer(merged, std::env::vars().collect()))
}
