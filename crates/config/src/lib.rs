//! Configuration loading, env substitution, and validation.
//!
//! Config files: `commbot.toml`, `commbot.yaml`, `commbot.yml` or `commbot.json`,
//! searched in `./` then the user config directory (`~/.config/commbot/` on
//! Linux).
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
    },
    schema::{BotConfig, MediaGroupConfig, StorageConfig, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_file},
};
