use std::sync::Arc;

use {
    async_trait::async_trait,
    commbot_common::types::{SavedChat, Update, UpdateKind},
    commbot_dispatch::{CommandParser, Error, Result, Transport, UpdateHandler},
};

use crate::{replies, store::ChatRepository};

pub const CHATS: &str = "chats";

/// Answers `/chats` with the saved chat list.
pub struct ChatListHandler {
    repository: Arc<dyn ChatRepository>,
    transport: Arc<dyn Transport>,
    parser: CommandParser,
}

impl ChatListHandler {
    pub fn new(repository: Arc<dyn ChatRepository>, transport: Arc<dyn Transport>) -> Self {
        Self {
            repository,
            transport,
            parser: CommandParser::default(),
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: CommandParser) -> Self {
        self.parser = parser;
        self
    }
}

fn render(chats: &[SavedChat]) -> String {
    if chats.is_empty() {
        return replies::CHAT_LIST_EMPTY.to_string();
    }
    chats
        .iter()
        .map(|c| format!("{} — {}", c.name, c.invite_link))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl UpdateHandler for ChatListHandler {
    fn name(&self) -> &str {
        "chat-list"
    }

    fn accepted_kinds(&self) -> &[UpdateKind] {
        &[UpdateKind::Message]
    }

    fn can_handle(&self, update: &Update) -> bool {
        update
            .text()
            .and_then(|text| self.parser.parse(text))
            .is_some_and(|c| c.name == CHATS)
    }

    async fn handle(&self, update: &Update) -> Result<()> {
        let Some(message) = update.message.as_ref() else {
            return Err(Error::malformed_update("expected a command message"));
        };
        let chats = self
            .repository
            .list()
            .await
            .map_err(|e| Error::storage("list saved chats", e))?;
        self.transport
            .send_reply(message.chat.id, &render(&chats), message.id)
            .await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use commbot_common::types::{Chat, Message};

    use {
        super::*,
        crate::{MemoryChatStore, handler::tests::RecordingTransport},
    };

    fn chats_update() -> Update {
        Update::from_message(1, Message::plain(9, Chat::private(5), None, "/chats"))
    }

    #[tokio::test]
    async fn empty_list_reply() {
        let transport = Arc::new(RecordingTransport::default());
        let handler = ChatListHandler::new(Arc::new(MemoryChatStore::new()), transport.clone());

        let update = chats_update();
        assert!(handler.can_handle(&update));
        handler.handle(&update).await.unwrap();

        assert_eq!(transport.replies(), vec![(
            5,
            replies::CHAT_LIST_EMPTY.to_string(),
            9
        )]);
    }

    #[tokio::test]
    async fn lists_chats_sorted_by_name() {
        let store = MemoryChatStore::with_chats([
            SavedChat::new(-1, "Zig", "https://t.me/joinchat/z").unwrap(),
            SavedChat::new(-2, "Ada", "https://t.me/joinchat/a").unwrap(),
        ]);
        let transport = Arc::new(RecordingTransport::default());
        let handler = ChatListHandler::new(Arc::new(store), transport.clone());

        handler.handle(&chats_update()).await.unwrap();

        assert_eq!(
            transport.replies()[0].1,
            "Ada — https://t.me/joinchat/a\nZig — https://t.me/joinchat/z"
        );
    }

    #[test]
    fn ignores_other_commands() {
        let handler = ChatListHandler::new(
            Arc::new(MemoryChatStore::new()),
            Arc::new(RecordingTransport::default()),
        );
        let update = Update::from_message(1, Message::plain(9, Chat::private(5), None, "/chatsx"));
        assert!(!handler.can_handle(&update));
    }
}
