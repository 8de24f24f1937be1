use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    commbot_common::types::{Update, UpdateKind},
    commbot_dispatch::{Error, Result, UpdateHandler},
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    sink::{AlbumSink, CompletedAlbum},
    store::{AddOutcome, MediaGroupStore, TakeOutcome},
};

/// Quiet period after the last item before an album counts as complete.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Collects album items and emits each album once its group goes quiet.
pub struct MediaGroupHandler {
    store: Arc<MediaGroupStore>,
    sink: Arc<dyn AlbumSink>,
    window: Duration,
    cancel: CancellationToken,
}

impl MediaGroupHandler {
    pub fn new(store: Arc<MediaGroupStore>, sink: Arc<dyn AlbumSink>) -> Self {
        Self {
            store,
            sink,
            window: DEFAULT_DEBOUNCE,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Pending debounce tasks stop when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn store(&self) -> &Arc<MediaGroupStore> {
        &self.store
    }

    fn spawn_debounce(&self, group_id: String) {
        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);
        let window = self.window;
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut wait = window;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!(group_id = %group_id, "media group debounce cancelled");
                        return;
                    },
                    () = tokio::time::sleep(wait) => {},
                }
                match store.take_if_idle(&group_id, window) {
                    TakeOutcome::Taken(entry) => {
                        let album = CompletedAlbum::from(entry);
                        debug!(group_id = %group_id, items = album.items.len(), "media group complete");
                        if let Err(e) = sink.deliver(&album).await {
                            warn!(group_id = %group_id, chat_id = album.chat_id, error = %e, "album delivery failed");
                        }
                        return;
                    },
                    TakeOutcome::Pending { remaining } => wait = remaining,
                    TakeOutcome::Missing => {
                        debug!(group_id = %group_id, "media group gone before completion");
                        return;
                    },
                }
            }
        });
    }
}

#[async_trait]
impl UpdateHandler for MediaGroupHandler {
    fn name(&self) -> &str {
        "media-group"
    }

    fn accepted_kinds(&self) -> &[UpdateKind] {
        &[UpdateKind::Message]
    }

    fn can_handle(&self, update: &Update) -> bool {
        update
            .message
            .as_ref()
            .is_some_and(|m| m.media_group_id.is_some() && m.media.is_some())
    }

    async fn handle(&self, update: &Update) -> Result<()> {
        let Some(message) = update.message.as_ref() else {
            return Err(Error::malformed_update("media group update without message"));
        };
        let (Some(group_id), Some(item)) = (message.media_group_id.as_ref(), message.media.clone())
        else {
            return Err(Error::malformed_update("message is not part of a media group"));
        };

        match self
            .store
            .add_media_to_group(group_id, message.chat.id, item)
        {
            AddOutcome::Created => {
                debug!(group_id = %group_id, chat_id = message.chat.id, "media group opened");
                self.spawn_debounce(group_id.clone());
            },
            AddOutcome::Appended { len } => {
                debug!(group_id = %group_id, items = len, "media group item appended");
            },
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use commbot_common::types::{Chat, ChatKind, MediaItem, MediaKind, Message};

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        albums: Mutex<Vec<CompletedAlbum>>,
    }

    impl RecordingSink {
        fn albums(&self) -> Vec<CompletedAlbum> {
            self.albums.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AlbumSink for RecordingSink {
        async fn deliver(&self, album: &CompletedAlbum) -> Result<()> {
            self.albums.lock().unwrap().push(album.clone());
            Ok(())
        }
    }

    fn album_update(id: i64, group_id: &str, file_id: &str) -> Update {
        let mut message = Message::plain(
            id as i32,
            Chat::group(-100, ChatKind::Supergroup, "Rust"),
            None,
            "",
        );
        message.text = None;
        message.media = Some(MediaItem::new(MediaKind::Photo, file_id));
        message.media_group_id = Some(group_id.to_string());
        Update::from_message(id, message)
    }

    fn file_ids(album: &CompletedAlbum) -> Vec<&str> {
        album.items.iter().map(|i| i.file_id.as_str()).collect()
    }

    fn setup() -> (Arc<RecordingSink>, MediaGroupHandler) {
        let sink = Arc::new(RecordingSink::default());
        let handler = MediaGroupHandler::new(Arc::new(MediaGroupStore::default()), sink.clone());
        (sink, handler)
    }

    #[test]
    fn relevant_only_for_album_media() {
        let (_, handler) = setup();
        assert!(handler.can_handle(&album_update(1, "g1", "a")));

        let mut no_group = album_update(2, "g1", "a");
        if let Some(m) = no_group.message.as_mut() {
            m.media_group_id = None;
        }
        assert!(!handler.can_handle(&no_group));

        let plain = Update::from_message(3, Message::plain(3, Chat::private(1), None, "hi"));
        assert!(!handler.can_handle(&plain));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_becomes_one_album() {
        let (sink, handler) = setup();

        handler.handle(&album_update(1, "g1", "a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handler.handle(&album_update(2, "g1", "b")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handler.handle(&album_update(3, "g1", "c")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(sink.albums().is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let albums = sink.albums();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].group_id, "g1");
        assert_eq!(albums[0].chat_id, -100);
        assert_eq!(file_ids(&albums[0]), vec!["a", "b", "c"]);
        assert!(handler.store().get_media_by_group_id("g1").is_none());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.albums().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn groups_complete_independently() {
        let (sink, handler) = setup();

        handler.handle(&album_update(1, "g1", "a")).await.unwrap();
        handler.handle(&album_update(2, "g2", "x")).await.unwrap();
        handler.handle(&album_update(3, "g1", "b")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let mut albums = sink.albums();
        albums.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        assert_eq!(albums.len(), 2);
        assert_eq!(file_ids(&albums[0]), vec!["a", "b"]);
        assert_eq!(file_ids(&albums[1]), vec!["x"]);
    }

    #[tokio::test(start_paused = true)]
    async fn late_item_starts_a_new_album() {
        let (sink, handler) = setup();

        handler.handle(&album_update(1, "g1", "a")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        handler.handle(&album_update(2, "g1", "late")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let albums = sink.albums();
        assert_eq!(albums.len(), 2);
        assert_eq!(file_ids(&albums[0]), vec!["a"]);
        assert_eq!(file_ids(&albums[1]), vec!["late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_pending_albums() {
        let cancel = CancellationToken::new();
        let sink = Arc::new(RecordingSink::default());
        let handler = MediaGroupHandler::new(Arc::new(MediaGroupStore::default()), sink.clone())
            .with_cancellation(cancel.clone());

        handler.handle(&album_update(1, "g1", "a")).await.unwrap();
        cancel.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(sink.albums().is_empty());
        assert!(handler.store().get_media_by_group_id("g1").is_some());
    }
}
