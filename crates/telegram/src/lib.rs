//! Telegram adapter built on teloxide.
//!
//! Converts polled updates into the bot's own types, dispatches them through
//! an [`UpdateRouter`](commbot_dispatch::UpdateRouter), and implements the
//! outbound [`Transport`](commbot_dispatch::Transport).

pub mod bot;
pub mod convert;
pub mod error;
pub mod outbound;

pub use {
    bot::{Connected, PollingOptions, connect, register_commands, run_polling},
    error::{Error, Result},
    outbound::TelegramTransport,
};
