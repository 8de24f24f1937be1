use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{Error, Result, env_subst::substitute_env, schema::BotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "commbot.toml",
    "commbot.yaml",
    "commbot.yml",
    "commbot.json",
];

/// Environment variable that overrides `telegram.token`.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable that overrides `storage.database_url`.
pub const DATABASE_URL_ENV: &str = "COMMBOT_DATABASE_URL";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<BotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./commbot.{toml,yaml,yml,json}`
/// 2. `<user config dir>/commbot/commbot.{toml,yaml,yml,json}`
///
/// Returns `BotConfig::default()` if no file is found or the file found does
/// not load.
pub fn discover_and_load() -> BotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    BotConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "commbot").map(|d| d.config_dir().to_path_buf())
}

/// Apply `TELEGRAM_BOT_TOKEN` and `COMMBOT_DATABASE_URL` on top of the file.
pub fn apply_env_overrides(config: BotConfig) -> BotConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: BotConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> BotConfig {
    if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
        debug!(var = TOKEN_ENV, "telegram token taken from environment");
        config.telegram.token = Secret::new(token);
    }
    if let Some(url) = lookup(DATABASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
        debug!(var = DATABASE_URL_ENV, "database url taken from environment");
        config.storage.database_url = Some(url);
    }
    config
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<BotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn loads_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            ("commbot.toml", "admins = [\"ferris\"]\n"),
            ("commbot.yaml", "admins:\n  - ferris\n"),
            ("commbot.json", r#"{"admins": ["ferris"]}"#),
        ];
        for (name, body) in cases {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            let cfg = load_config(&path).unwrap();
            assert_eq!(cfg.admins, vec!["ferris"], "{name}");
        }
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commbot.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(&dir.path().join("nope.toml")),
            Err(Error::Read { .. })
        ));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = BotConfig::default();
        cfg.storage.database_url = Some("sqlite://file.db".into());

        let cfg = apply_env_overrides_with(cfg, |name| match name {
            TOKEN_ENV => Some("999:ENV".into()),
            DATABASE_URL_ENV => Some("sqlite://env.db".into()),
            _ => None,
        });
        assert_eq!(cfg.telegram.token.expose_secret(), "999:ENV");
        assert_eq!(cfg.storage.database_url.as_deref(), Some("sqlite://env.db"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = BotConfig::default();
        cfg.telegram.token = Secret::new("123:FILE".into());

        let cfg = apply_env_overrides_with(cfg, |_| Some("  ".into()));
        assert_eq!(cfg.telegram.token.expose_secret(), "123:FILE");
        assert!(cfg.storage.database_url.is_none());
    }
}
