use std::sync::Arc;

use {
    async_trait::async_trait,
    commbot_common::types::{Chat, Message, SavedChat, Update, UpdateKind},
    commbot_dispatch::{
        Command, CommandParser, Error, Result, Transport, UpdateHandler, allowlist,
    },
    tracing::{debug, info, warn},
};

use crate::{
    replies::{self, Rejection},
    store::ChatRepository,
};

pub const ADD_CHAT: &str = "add_chat";
pub const ADD_THIS_CHAT: &str = "add_this_chat";
pub const REMOVE_CHAT: &str = "remove_chat";
pub const GET_ID_OF_THIS_CHAT: &str = "get_id_of_this_chat";

const COMMANDS: [&str; 4] = [ADD_CHAT, ADD_THIS_CHAT, REMOVE_CHAT, GET_ID_OF_THIS_CHAT];

/// Only private invite links are accepted; public chats are reachable by name.
pub const INVITE_LINK_PREFIX: &str = "https://t.me/joinchat/";

/// What to send back for one command.
enum Reply {
    Done(String),
    Rejected(Rejection),
    Silent,
}

/// Maintains the community chat list through bot commands.
pub struct ChatManageHandler {
    repository: Arc<dyn ChatRepository>,
    transport: Arc<dyn Transport>,
    admins: Vec<String>,
    parser: CommandParser,
}

impl ChatManageHandler {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        transport: Arc<dyn Transport>,
        admins: Vec<String>,
    ) -> Self {
        Self {
            repository,
            transport,
            admins,
            parser: CommandParser::default(),
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: CommandParser) -> Self {
        self.parser = parser;
        self
    }

    fn command(&self, update: &Update) -> Option<Command> {
        update.text().and_then(|text| self.parser.parse(text))
    }

    async fn add_chat(&self, command: &Command) -> Result<Reply> {
        let lines = command.argument_lines();
        let [name, link, ..] = lines.as_slice() else {
            return Ok(Reply::Rejected(Rejection::MalformedAddChat));
        };
        if !link.starts_with(INVITE_LINK_PREFIX) {
            return Ok(Reply::Rejected(Rejection::InvalidInviteLink));
        }

        let chat = SavedChat::new(SavedChat::UNKNOWN_ID, *name, *link)
            .map_err(|_| Error::malformed_update("add_chat name line is blank"))?;
        self.save(chat).await?;
        Ok(Reply::Done(replies::CHAT_SAVED.to_string()))
    }

    async fn add_this_chat(&self, command: &Command, chat: &Chat) -> Result<Reply> {
        if chat.is_private() {
            return Ok(Reply::Rejected(Rejection::PrivateChat));
        }
        if !chat.is_group_like() {
            debug!(chat_id = chat.id, kind = ?chat.kind, "ignoring add_this_chat outside a group");
            return Ok(Reply::Silent);
        }

        let link = match command.argument_lines().first() {
            Some(link) => Some((*link).to_string()),
            None => match chat.invite_link.as_deref().map(str::trim) {
                Some(link) if !link.is_empty() => Some(link.to_string()),
                _ => self.export_invite_link(chat.id).await,
            },
        };
        let Some(link) = link else {
            return Ok(Reply::Rejected(Rejection::NoInviteLink));
        };

        // Untitled groups fall back to their id so the record stays addressable.
        let name = chat
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map_or_else(|| chat.id.to_string(), str::to_string);
        let saved = SavedChat::new(chat.id, name, link)
            .map_err(|e| Error::malformed_update(e.to_string()))?;
        self.save(saved).await?;
        Ok(Reply::Done(replies::THIS_CHAT_SAVED.to_string()))
    }

    async fn remove_chat(&self, command: &Command, message: &Message) -> Result<Reply> {
        let handle = message.sender_username().unwrap_or_default();
        if !allowlist::is_listed(handle, &self.admins) {
            info!(chat_id = message.chat.id, user = handle, "remove_chat refused: not an admin");
            return Ok(Reply::Rejected(Rejection::NotAdmin));
        }

        let name = command.argument.trim();
        if name.is_empty() {
            return Ok(Reply::Rejected(Rejection::MissingChatName));
        }

        self.repository
            .remove_by_name(name)
            .await
            .map_err(|e| Error::storage("remove saved chat", e))?;
        info!(chat = name, user = handle, "saved chat removed");
        Ok(Reply::Done(replies::chat_removed(name)))
    }

    async fn save(&self, chat: SavedChat) -> Result<()> {
        let (id, name) = (chat.id, chat.name.clone());
        self.repository
            .add_or_update(chat)
            .await
            .map_err(|e| Error::storage("save chat", e))?;
        info!(chat_id = id, chat = %name, "saved chat");
        Ok(())
    }

    async fn export_invite_link(&self, chat_id: i64) -> Option<String> {
        match self.transport.export_invite_link(chat_id).await {
            Ok(link) if !link.trim().is_empty() => Some(link),
            Ok(_) => None,
            Err(e) => {
                warn!(chat_id, error = %e, "cannot export invite link");
                None
            },
        }
    }
}

#[async_trait]
impl UpdateHandler for ChatManageHandler {
    fn name(&self) -> &str {
        "chat-manage"
    }

    fn accepted_kinds(&self) -> &[UpdateKind] {
        &[UpdateKind::Message]
    }

    fn can_handle(&self, update: &Update) -> bool {
        self.command(update)
            .is_some_and(|c| COMMANDS.contains(&c.name.as_str()))
    }

    async fn handle(&self, update: &Update) -> Result<()> {
        let (Some(message), Some(command)) = (update.message.as_ref(), self.command(update)) else {
            return Err(Error::malformed_update("expected a command message"));
        };

        let reply = match command.name.as_str() {
            ADD_CHAT => self.add_chat(&command).await?,
            ADD_THIS_CHAT => self.add_this_chat(&command, &message.chat).await?,
            REMOVE_CHAT => self.remove_chat(&command, message).await?,
            GET_ID_OF_THIS_CHAT => Reply::Done(replies::chat_id(message.chat.id)),
            other => {
                return Err(Error::malformed_update(format!(
                    "unexpected command: {other}"
                )));
            },
        };

        let text = match reply {
            Reply::Done(text) => text,
            Reply::Rejected(rejection) => rejection.to_string(),
            Reply::Silent => return Ok(()),
        };
        self.transport
            .send_reply(message.chat.id, &text, message.id)
            .await
    }
}
