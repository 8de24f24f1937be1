use std::{sync::Arc, time::Duration};

use {
    commbot_common::types::MediaItem,
    dashmap::{DashMap, mapref::entry::Entry},
    tokio::{task::JoinHandle, time::Instant},
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

/// Hard ceiling on how long an album may stay incomplete.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(30);

/// Items received so far for one album.
#[derive(Debug, Clone)]
pub struct MediaGroupEntry {
    pub group_id: String,
    pub chat_id: i64,
    /// Arrival order.
    pub items: Vec<MediaItem>,
    pub first_seen: Instant,
    pub last_seen: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The item opened a new entry.
    Created,
    /// The item joined a live entry, which now holds `len` items.
    Appended { len: usize },
}

#[derive(Debug)]
pub enum TakeOutcome {
    /// The entry was idle and has been removed.
    Taken(MediaGroupEntry),
    /// Something arrived recently; ask again after `remaining`.
    Pending { remaining: Duration },
    /// No live entry under that id.
    Missing,
}

/// Concurrent buffer of album items keyed by media group id.
///
/// Each group lives in one `DashMap` shard, so appends and takes on the same
/// group serialize while different groups proceed independently.
pub struct MediaGroupStore {
    groups: DashMap<String, MediaGroupEntry>,
    expiry: Duration,
}

impl Default for MediaGroupStore {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY)
    }
}

impl MediaGroupStore {
    pub fn new(expiry: Duration) -> Self {
        Self {
            groups: DashMap::new(),
            expiry,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Append `item` to its group, opening the group if needed.
    ///
    /// An entry past the expiry ceiling is discarded and the item opens a
    /// fresh one, so it is never buried in a group the janitor will drop.
    pub fn add_media_to_group(&self, group_id: &str, chat_id: i64, item: MediaItem) -> AddOutcome {
        let now = Instant::now();
        let fresh = MediaGroupEntry {
            group_id: group_id.to_string(),
            chat_id,
            items: Vec::new(),
            first_seen: now,
            last_seen: now,
        };
        match self.groups.entry(group_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if self.is_expired(occupied.get(), now) {
                    let stale = occupied.insert(MediaGroupEntry {
                        items: vec![item],
                        ..fresh
                    });
                    log_dropped(&stale);
                    return AddOutcome::Created;
                }
                let entry = occupied.get_mut();
                entry.items.push(item);
                entry.last_seen = now;
                AddOutcome::Appended {
                    len: entry.items.len(),
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(MediaGroupEntry {
                    items: vec![item],
                    ..fresh
                });
                AddOutcome::Created
            },
        }
    }

    /// Items buffered for `group_id`, without consuming them.
    ///
    /// Entries past the expiry ceiling read as absent even before the janitor
    /// removes them.
    pub fn get_media_by_group_id(&self, group_id: &str) -> Option<Vec<MediaItem>> {
        let entry = self.groups.get(group_id)?;
        if self.is_expired(&entry, Instant::now()) {
            return None;
        }
        Some(entry.items.clone())
    }

    /// Remove and return the entry for `group_id`.
    pub fn take(&self, group_id: &str) -> Option<MediaGroupEntry> {
        self.groups.remove(group_id).map(|(_, entry)| entry)
    }

    /// Remove the entry only if nothing arrived within `window` of now.
    ///
    /// An expired entry is dropped and reported as [`TakeOutcome::Missing`],
    /// matching what [`get_media_by_group_id`](Self::get_media_by_group_id) shows.
    pub fn take_if_idle(&self, group_id: &str, window: Duration) -> TakeOutcome {
        let now = Instant::now();
        match self.groups.entry(group_id.to_string()) {
            Entry::Occupied(occupied) => {
                if self.is_expired(occupied.get(), now) {
                    log_dropped(&occupied.remove());
                    return TakeOutcome::Missing;
                }
                let idle = now.duration_since(occupied.get().last_seen);
                if idle >= window {
                    TakeOutcome::Taken(occupied.remove())
                } else {
                    TakeOutcome::Pending {
                        remaining: window - idle,
                    }
                }
            },
            Entry::Vacant(_) => TakeOutcome::Missing,
        }
    }

    /// Drop entries opened longer ago than the expiry ceiling.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        self.groups.retain(|_, entry| {
            if self.is_expired(entry, now) {
                log_dropped(entry);
                evicted += 1;
                false
            } else {
                true
            }
        });
        evicted
    }

    fn is_expired(&self, entry: &MediaGroupEntry, now: Instant) -> bool {
        now.duration_since(entry.first_seen) > self.expiry
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Run [`evict_expired`](Self::evict_expired) every `interval` until `cancel` fires.
    pub fn spawn_janitor(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(interval) => {
                        let evicted = store.evict_expired();
                        if evicted > 0 {
                            debug!(evicted, "media group janitor sweep");
                        }
                    },
                }
            }
            debug!("media group janitor stopped");
        })
    }
}

fn log_dropped(entry: &MediaGroupEntry) {
    warn!(
        group_id = %entry.group_id,
        chat_id = entry.chat_id,
        items = entry.items.len(),
        "dropping incomplete media group"
    );
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use commbot_common::types::MediaKind;

    use super::*;

    fn photo(id: &str) -> MediaItem {
        MediaItem::new(MediaKind::Photo, id)
    }

    fn file_ids(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.file_id.as_str()).collect()
    }

    #[tokio::test]
    async fn append_reports_creation_then_length() {
        let store = MediaGroupStore::default();
        assert_eq!(store.add_media_to_group("g1", 1, photo("a")), AddOutcome::Created);
        assert_eq!(
            store.add_media_to_group("g1", 1, photo("b")),
            AddOutcome::Appended { len: 2 }
        );
        assert_eq!(store.add_media_to_group("g2", 1, photo("c")), AddOutcome::Created);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn peek_does_not_consume() {
        let store = MediaGroupStore::default();
        store.add_media_to_group("g1", 1, photo("a"));

        let first = store.get_media_by_group_id("g1").unwrap();
        let second = store.get_media_by_group_id("g1").unwrap();
        assert_eq!(first, second);
        assert!(store.get_media_by_group_id("missing").is_none());

        let taken = store.take("g1").unwrap();
        assert_eq!(file_ids(&taken.items), vec!["a"]);
        assert!(store.get_media_by_group_id("g1").is_none());
        assert!(store.take("g1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn take_if_idle_waits_for_quiet() {
        let window = Duration::from_millis(500);
        let store = MediaGroupStore::default();
        store.add_media_to_group("g1", 1, photo("a"));

        tokio::time::advance(Duration::from_millis(200)).await;
        match store.take_if_idle("g1", window) {
            TakeOutcome::Pending { remaining } => {
                assert_eq!(remaining, Duration::from_millis(300));
            },
            other => panic!("expected pending, got {other:?}"),
        }

        store.add_media_to_group("g1", 1, photo("b"));
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(matches!(
            store.take_if_idle("g1", window),
            TakeOutcome::Pending { .. }
        ));

        tokio::time::advance(Duration::from_millis(100)).await;
        match store.take_if_idle("g1", window) {
            TakeOutcome::Taken(entry) => assert_eq!(file_ids(&entry.items), vec!["a", "b"]),
            other => panic!("expected taken, got {other:?}"),
        }
        assert!(matches!(store.take_if_idle("g1", window), TakeOutcome::Missing));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_evicted() {
        let store = MediaGroupStore::new(Duration::from_secs(30));
        store.add_media_to_group("old", 1, photo("a"));
        tokio::time::advance(Duration::from_secs(20)).await;
        store.add_media_to_group("young", 1, photo("b"));
        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(store.get_media_by_group_id("old").is_none());
        assert_eq!(store.evict_expired(), 1);
        assert!(store.get_media_by_group_id("young").is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn item_after_expiry_opens_a_fresh_group() {
        let store = MediaGroupStore::new(Duration::from_secs(30));
        store.add_media_to_group("g1", 1, photo("a"));
        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(store.add_media_to_group("g1", 1, photo("fresh")), AddOutcome::Created);
        assert_eq!(file_ids(&store.get_media_by_group_id("g1").unwrap()), vec!["fresh"]);
        assert_eq!(store.evict_expired(), 0);
        assert_eq!(file_ids(&store.take("g1").unwrap().items), vec!["fresh"]);
    }

    #[tokio::test(start_paused = true)]
    async fn take_if_idle_drops_expired_entry() {
        let store = MediaGroupStore::new(Duration::from_secs(30));
        store.add_media_to_group("g1", 1, photo("a"));
        tokio::time::advance(Duration::from_secs(31)).await;

        assert!(matches!(
            store.take_if_idle("g1", Duration::from_millis(500)),
            TakeOutcome::Missing
        ));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn janitor_sweeps_until_cancelled() {
        let store = Arc::new(MediaGroupStore::new(Duration::from_secs(30)));
        let cancel = CancellationToken::new();
        let janitor = store.spawn_janitor(Duration::from_secs(5), cancel.clone());

        store.add_media_to_group("g1", 1, photo("a"));
        tokio::time::sleep(Duration::from_secs(36)).await;
        assert!(store.is_empty());

        cancel.cancel();
        janitor.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_every_item() {
        let store = Arc::new(MediaGroupStore::default());
        let mut tasks = Vec::new();
        for writer in 0..8 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                for n in 0..50 {
                    store.add_media_to_group("g1", 1, photo(&format!("{writer}-{n}")));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let items = store.take("g1").unwrap().items;
        assert_eq!(items.len(), 400);
        for writer in 0..8 {
            let prefix = format!("{writer}-");
            let mine: Vec<usize> = items
                .iter()
                .filter_map(|i| i.file_id.strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(mine, (0..50).collect::<Vec<_>>());
        }
    }
}
