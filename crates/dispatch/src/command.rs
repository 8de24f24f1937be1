//! Bot command grammar.
//!
//! A command is a prefix character at the very start of the text, a name that
//! runs to the first whitespace, an optional `@botname` suffix, and the raw
//! remainder as the argument:
//!
//! ```text
//! /add_chat@mybot Chat name
//! https://t.me/joinchat/AAAA
//! ```
//!
//! parses to name `add_chat` and argument `"Chat name\nhttps://t.me/joinchat/AAAA"`.

/// Prefix that starts a command token.
pub const DEFAULT_PREFIX: char = '/';

/// A command extracted from message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    /// Everything after the command token and the whitespace following it.
    pub argument: String,
}

impl Command {
    /// Non-empty, trimmed argument lines.
    pub fn argument_lines(&self) -> Vec<&str> {
        self.argument
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Parse with the default prefix and no bot-name filtering.
pub fn parse_command(text: &str) -> Option<Command> {
    CommandParser::default().parse(text)
}

/// Remove a trailing `@botname` from a command name.
///
/// Idempotent: applying it to its own output changes nothing.
pub fn strip_mention(name: &str) -> &str {
    name.split_once('@').map_or(name, |(bare, _)| bare)
}

/// Command parser bound to a prefix and, optionally, to the bot's own username.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: char,
    bot_username: Option<String>,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl CommandParser {
    pub fn new(prefix: char) -> Self {
        Self {
            prefix,
            bot_username: None,
        }
    }

    /// Ignore commands explicitly addressed to other bots (`/cmd@otherbot`).
    #[must_use]
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        let username = username.trim_start_matches('@');
        if !username.is_empty() {
            self.bot_username = Some(username.to_string());
        }
        self
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Extract the command from `text`, or `None` if the text is not a command
    /// for this bot.
    pub fn parse(&self, text: &str) -> Option<Command> {
        let rest = text.strip_prefix(self.prefix)?;
        let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (token, tail) = rest.split_at(token_end);

        let name = strip_mention(token);
        if name.is_empty() {
            return None;
        }

        if let Some((_, addressee)) = token.split_once('@')
            && let Some(me) = self.bot_username.as_deref()
            && !addressee.eq_ignore_ascii_case(me)
        {
            return None;
        }

        Some(Command {
            name: name.to_string(),
            argument: tail.trim_start().to_string(),
        })
    }
}
