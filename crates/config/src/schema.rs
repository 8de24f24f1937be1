//! Config schema types.

use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Root configuration (`commbot.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    /// Usernames allowed to run privileged commands. `*` wildcards allowed.
    pub admins: Vec<String>,
    pub media_group: MediaGroupConfig,
    pub storage: StorageConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,
    /// Long-poll timeout passed to `getUpdates`.
    pub polling_timeout_secs: u32,
    /// Updates processed at once; further updates wait for a free slot.
    pub max_concurrent_updates: usize,
    pub command_prefix: char,
}

impl TelegramConfig {
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("polling_timeout_secs", &self.polling_timeout_secs)
            .field("max_concurrent_updates", &self.max_concurrent_updates)
            .field("command_prefix", &self.command_prefix)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            polling_timeout_secs: 30,
            max_concurrent_updates: 16,
            command_prefix: '/',
        }
    }
}

/// Album assembly timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaGroupConfig {
    /// Quiet period after the last item before an album is complete.
    pub debounce_ms: u64,
    /// Incomplete albums older than this are dropped.
    pub expiry_secs: u64,
    pub sweep_interval_secs: u64,
    /// Chat that receives completed albums. Albums are only logged when unset.
    pub repost_chat_id: Option<i64>,
}

impl MediaGroupConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for MediaGroupConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            expiry_secs: 30,
            sweep_interval_secs: 5,
            repost_chat_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite URL such as `sqlite://commbot.db?mode=rwc`. The chat list is
    /// kept in memory when unset.
    pub database_url: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BotConfig::default();
        assert!(!cfg.telegram.has_token());
        assert_eq!(cfg.telegram.polling_timeout_secs, 30);
        assert_eq!(cfg.telegram.max_concurrent_updates, 16);
        assert_eq!(cfg.telegram.command_prefix, '/');
        assert_eq!(cfg.media_group.debounce(), Duration::from_millis(500));
        assert_eq!(cfg.media_group.expiry(), Duration::from_secs(30));
        assert_eq!(cfg.media_group.sweep_interval(), Duration::from_secs(5));
        assert!(cfg.storage.database_url.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: BotConfig = toml::from_str(
            r#"
            admins = ["ferris"]

            [telegram]
            token = "123:ABC"

            [media_group]
            repost_chat_id = -100500
            "#,
        )
        .unwrap();
        assert!(cfg.telegram.has_token());
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.admins, vec!["ferris"]);
        assert_eq!(cfg.media_group.repost_chat_id, Some(-100500));
        assert_eq!(cfg.media_group.debounce_ms, 500);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = toml::from_str::<BotConfig>("[telegram]\ntokn = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("tokn"));
    }

    #[test]
    fn debug_redacts_token() {
        let cfg: BotConfig = serde_json::from_str(r#"{"telegram":{"token":"123:SECRET"}}"#).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("SECRET"));
        assert!(debug.contains("[REDACTED]"));
    }
}
