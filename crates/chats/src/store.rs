//! Persistence contract for the saved chat list.

use {async_trait::async_trait, commbot_common::types::SavedChat};

use crate::Result;

/// Storage backend for saved chats.
///
/// Implementations guarantee that [`add_or_update`](Self::add_or_update) is
/// atomic: one record per name, and one record per known chat id. Handlers do
/// no locking of their own.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Insert `chat`, or update the record with the same name or the same
    /// known id in place. An unknown id (`-1`) never overwrites a known one.
    async fn add_or_update(&self, chat: SavedChat) -> Result<()>;

    /// Remove the chat with exactly this name. Absent names are not an error.
    async fn remove_by_name(&self, name: &str) -> Result<()>;

    /// All saved chats, ordered by name.
    async fn list(&self) -> Result<Vec<SavedChat>>;
}
