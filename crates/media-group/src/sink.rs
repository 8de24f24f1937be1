use std::sync::Arc;

use {
    async_trait::async_trait,
    commbot_common::types::MediaItem,
    commbot_dispatch::{Result, Transport},
    tracing::info,
};

use crate::store::MediaGroupEntry;

/// An album whose group went quiet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAlbum {
    pub group_id: String,
    pub chat_id: i64,
    pub items: Vec<MediaItem>,
}

impl From<MediaGroupEntry> for CompletedAlbum {
    fn from(entry: MediaGroupEntry) -> Self {
        Self {
            group_id: entry.group_id,
            chat_id: entry.chat_id,
            items: entry.items,
        }
    }
}

/// Receives each completed album exactly once.
#[async_trait]
pub trait AlbumSink: Send + Sync {
    async fn deliver(&self, album: &CompletedAlbum) -> Result<()>;
}

/// Re-sends every album to one chat.
pub struct RepostAlbumSink {
    transport: Arc<dyn Transport>,
    target_chat_id: i64,
}

impl RepostAlbumSink {
    pub fn new(transport: Arc<dyn Transport>, target_chat_id: i64) -> Self {
        Self {
            transport,
            target_chat_id,
        }
    }
}

#[async_trait]
impl AlbumSink for RepostAlbumSink {
    async fn deliver(&self, album: &CompletedAlbum) -> Result<()> {
        self.transport
            .send_media_group(self.target_chat_id, &album.items)
            .await?;
        info!(
            group_id = %album.group_id,
            from_chat = album.chat_id,
            to_chat = self.target_chat_id,
            items = album.items.len(),
            "album reposted"
        );
        Ok(())
    }
}

/// Logs a one-line summary per album.
pub struct LogAlbumSink;

#[async_trait]
impl AlbumSink for LogAlbumSink {
    async fn deliver(&self, album: &CompletedAlbum) -> Result<()> {
        let kinds: Vec<String> = album.items.iter().map(|i| i.kind.to_string()).collect();
        info!(
            group_id = %album.group_id,
            chat_id = album.chat_id,
            items = album.items.len(),
            kinds = %kinds.join(","),
            "album complete"
        );
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use {commbot_common::types::MediaKind, commbot_dispatch::Error};

    use super::*;

    #[derive(Default)]
    struct AlbumTransport {
        sent: Mutex<Vec<(i64, Vec<MediaItem>)>>,
    }

    #[async_trait]
    impl Transport for AlbumTransport {
        async fn send_reply(&self, _chat_id: i64, _text: &str, _reply_to: i32) -> Result<()> {
            Ok(())
        }

        async fn export_invite_link(&self, _chat_id: i64) -> Result<String> {
            Err(Error::malformed_update("unused"))
        }

        async fn send_media_group(&self, chat_id: i64, items: &[MediaItem]) -> Result<()> {
            self.sent.lock().unwrap().push((chat_id, items.to_vec()));
            Ok(())
        }
    }

    fn album() -> CompletedAlbum {
        CompletedAlbum {
            group_id: "g1".into(),
            chat_id: -100,
            items: vec![
                MediaItem::new(MediaKind::Photo, "a").with_caption("first"),
                MediaItem::new(MediaKind::Photo, "b"),
            ],
        }
    }

    #[tokio::test]
    async fn repost_sends_album_to_target_chat() {
        let transport = Arc::new(AlbumTransport::default());
        let sink = RepostAlbumSink::new(transport.clone(), -200);

        sink.deliver(&album()).await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, -200);
        assert_eq!(sent[0].1, album().items);
    }

    #[tokio::test]
    async fn log_sink_accepts_albums() {
        LogAlbumSink.deliver(&album()).await.unwrap();
    }
}
