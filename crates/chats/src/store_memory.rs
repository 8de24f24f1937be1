//! In-memory chat store. Nothing survives a restart.

use std::sync::Mutex;

use {async_trait::async_trait, commbot_common::types::SavedChat};

use crate::{Result, store::ChatRepository};

/// Chat list backed by a `Vec` behind one mutex.
#[derive(Default)]
pub struct MemoryChatStore {
    chats: Mutex<Vec<SavedChat>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chats(chats: impl IntoIterator<Item = SavedChat>) -> Self {
        Self {
            chats: Mutex::new(chats.into_iter().collect()),
        }
    }
}

/// Merge `chat` into `chats`, dropping every record it supersedes.
fn upsert(chats: &mut Vec<SavedChat>, mut chat: SavedChat) {
    let mut known_id = None;
    chats.retain(|existing| {
        let same = existing.name == chat.name
            || (chat.has_known_id() && existing.id == chat.id);
        if same && existing.has_known_id() && known_id.is_none() {
            known_id = Some(existing.id);
        }
        !same
    });
    if !chat.has_known_id()
        && let Some(id) = known_id
    {
        chat.id = id;
    }
    chats.push(chat);
}

#[async_trait]
impl ChatRepository for MemoryChatStore {
    async fn add_or_update(&self, chat: SavedChat) -> Result<()> {
        let mut chats = self.chats.lock().unwrap_or_else(|e| e.into_inner());
        upsert(&mut chats, chat);
        Ok(())
    }

    async fn remove_by_name(&self, name: &str) -> Result<()> {
        let mut chats = self.chats.lock().unwrap_or_else(|e| e.into_inner());
        chats.retain(|c| c.name != name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SavedChat>> {
        let chats = self.chats.lock().unwrap_or_else(|e| e.into_inner());
        let mut all = chats.clone();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}
