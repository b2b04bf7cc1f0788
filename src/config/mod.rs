//! Run configuration: layered env sources and provider resolution.

pub mod env;
pub mod provider;

pub use env::{EnvMap, REPO_ENV_FILE, load_layered, read_env_file, user_env_file};
pub use provider::{DEFAULT_PRESET, PRESETS, ProviderPreset, ResolvedConfig, find_preset, keys};
