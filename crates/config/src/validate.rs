//! Configuration checks reported by `commbot check-config` and at startup.

use std::path::{Path, PathBuf};

use crate::{env_subst::substitute_env, loader, schema::BotConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. `media_group.debounce_ms`. Empty for file-level issues.
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, path: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{}: {}: {}", self.severity, self.path, self.message)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Check a loaded config for values the bot cannot run with.
pub fn validate(config: &BotConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    if !config.telegram.has_token() {
        out.push(Diagnostic::new(
            Severity::Error,
            "telegram.token",
            format!("bot token is missing; set it in the file or via {}", loader::TOKEN_ENV),
        ));
    }
    if config.telegram.max_concurrent_updates == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "telegram.max_concurrent_updates",
            "must be at least 1",
        ));
    }
    if config.telegram.command_prefix.is_whitespace() {
        out.push(Diagnostic::new(
            Severity::Error,
            "telegram.command_prefix",
            "must not be whitespace",
        ));
    }

    let media = &config.media_group;
    if media.debounce_ms == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "media_group.debounce_ms",
            "must be greater than zero",
        ));
    }
    if media.debounce() >= media.expiry() {
        out.push(Diagnostic::new(
            Severity::Error,
            "media_group.debounce_ms",
            format!(
                "debounce ({} ms) must be shorter than expiry ({} s)",
                media.debounce_ms, media.expiry_secs
            ),
        ));
    }
    if media.sweep_interval_secs == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "media_group.sweep_interval_secs",
            "must be greater than zero",
        ));
    }
    if media.repost_chat_id.is_none() {
        out.push(Diagnostic::new(
            Severity::Info,
            "media_group.repost_chat_id",
            "not set; completed albums are only logged",
        ));
    }

    if config.admins.iter().all(|a| a.trim().is_empty()) {
        out.push(Diagnostic::new(
            Severity::Warning,
            "admins",
            "no admins configured; remove_chat will refuse everyone",
        ));
    }
    if config.storage.database_url.is_none() {
        out.push(Diagnostic::new(
            Severity::Info,
            "storage.database_url",
            "not set; the chat list lives in memory and is lost on restart",
        ));
    }

    out
}

/// Load the file at `path` (or the discovered one), apply env overrides and
/// validate it. Read and parse failures become error diagnostics.
pub fn validate_file(path: Option<&Path>) -> ValidationResult {
    let config_path = path.map(Path::to_path_buf).or_else(loader::find_config_file);

    let Some(actual_path) = config_path.clone() else {
        let config = loader::apply_env_overrides(BotConfig::default());
        let mut diagnostics = vec![Diagnostic::new(
            Severity::Info,
            "",
            "no config file found; using defaults",
        )];
        diagnostics.extend(validate(&config));
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let parsed = std::fs::read_to_string(&actual_path)
        .map_err(|e| format!("failed to read config file: {e}"))
        .and_then(|raw| {
            loader::parse_config(&substitute_env(&raw), &actual_path).map_err(|e| e.to_string())
        });

    let diagnostics = match parsed {
        Ok(config) => validate(&loader::apply_env_overrides(config)),
        Err(message) => vec![Diagnostic::new(Severity::Error, "", message)],
    };
    ValidationResult {
        diagnostics,
        config_path,
    }
}
