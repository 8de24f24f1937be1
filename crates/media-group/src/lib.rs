//! Media album assembly.
//!
//! Telegram delivers an album as separate messages sharing a media group id.
//! [`MediaGroupStore`] buffers the items per group; [`MediaGroupHandler`]
//! waits until a group goes quiet and hands the finished album to an
//! [`AlbumSink`] exactly once.

pub mod handler;
pub mod sink;
pub mod store;

pub use {
    handler::MediaGroupHandler,
    sink::{AlbumSink, CompletedAlbum, LogAlbumSink, RepostAlbumSink},
    store::{AddOutcome, MediaGroupEntry, MediaGroupStore, TakeOutcome},
};
