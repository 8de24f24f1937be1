//! Update dispatch pipeline.
//!
//! Inbound updates are offered to an ordered list of [`UpdateHandler`]s; the
//! first handler that accepts the update's kind and reports it relevant runs,
//! and nothing else does. Handlers talk back to the platform through the
//! [`Transport`] trait and parse commands with the [`command`] grammar.

pub mod allowlist;
pub mod command;
pub mod error;
pub mod handler;
pub mod router;
pub mod transport;

pub use {
    command::{Command, CommandParser, parse_command},
    error::{Error, Result},
    handler::UpdateHandler,
    router::{DispatchOutcome, UpdateRouter, UpdateRouterBuilder},
    transport::Transport,
};
