use {async_trait::async_trait, commbot_common::types::MediaItem};

use crate::Result;

/// Outbound calls handlers make to the messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `text` to `chat_id` as a threaded reply to `reply_to`.
    async fn send_reply(&self, chat_id: i64, text: &str, reply_to: i32) -> Result<()>;

    /// Create (or fetch) the primary invite link of a chat. Requires the bot to
    /// be an administrator there.
    async fn export_invite_link(&self, chat_id: i64) -> Result<String>;

    /// Send `items` to `chat_id` as one album.
    async fn send_media_group(&self, chat_id: i64, items: &[MediaItem]) -> Result<()>;
}
