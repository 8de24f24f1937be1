//! Platform-neutral view of inbound updates.
//!
//! The transport adapter converts raw platform events into these types so the
//! router and handlers never see the wire model.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ── Updates ─────────────────────────────────────────────────────────────────

/// Kind tag of an inbound update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    CallbackQuery,
    /// Anything the bot does not model. Always passed through unhandled.
    Other,
}

/// One inbound event from the messaging platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub id: i64,
    pub kind: UpdateKind,
    /// Present for message-like kinds.
    pub message: Option<Message>,
}

impl Update {
    pub fn from_message(id: i64, message: Message) -> Self {
        Self {
            id,
            kind: UpdateKind::Message,
            message: Some(message),
        }
    }

    pub fn other(id: i64, kind: UpdateKind) -> Self {
        Self {
            id,
            kind,
            message: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.text.as_deref())
    }
}

/// A message carried by an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub media: Option<MediaItem>,
    /// Identifier shared by every item of one album.
    pub media_group_id: Option<String>,
}

impl Message {
    /// Plain text message, the shape commands arrive in.
    pub fn plain(id: i32, chat: Chat, from: Option<User>, text: impl Into<String>) -> Self {
        Self {
            id,
            chat,
            from,
            text: Some(text.into()),
            media: None,
            media_group_id: None,
        }
    }

    pub fn sender_username(&self) -> Option<&str> {
        self.from.as_ref().and_then(|u| u.username.as_deref())
    }
}

// ── Chats and users ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// Origin chat of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub kind: ChatKind,
    pub title: Option<String>,
    pub invite_link: Option<String>,
}

impl Chat {
    pub fn private(id: i64) -> Self {
        Self {
            id,
            kind: ChatKind::Private,
            title: None,
            invite_link: None,
        }
    }

    pub fn group(id: i64, kind: ChatKind, title: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            title: Some(title.into()),
            invite_link: None,
        }
    }

    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }

    /// Basic groups and supergroups. Channels are not group-like.
    pub fn is_group_like(&self) -> bool {
        matches!(self.kind, ChatKind::Group | ChatKind::Supergroup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: Option<String>,
    pub first_name: String,
}

// ── Media ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Photo => write!(f, "photo"),
            Self::Video => write!(f, "video"),
            Self::Document => write!(f, "document"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// A single album item, referenced by the platform's file id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub file_id: String,
    pub caption: Option<String>,
}

impl MediaItem {
    pub fn new(kind: MediaKind, file_id: impl Into<String>) -> Self {
        Self {
            kind,
            file_id: file_id.into(),
            caption: None,
        }
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

// ── Saved chats ─────────────────────────────────────────────────────────────

/// A chat the community keeps in its public list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedChat {
    pub id: i64,
    pub name: String,
    pub invite_link: String,
}

impl SavedChat {
    /// Chat known only by name; the platform has not confirmed its id yet.
    pub const UNKNOWN_ID: i64 = -1;

    pub fn new(id: i64, name: impl Into<String>, invite_link: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::BlankChatName);
        }
        Ok(Self {
            id,
            name,
            invite_link: invite_link.into().trim().to_string(),
        })
    }

    pub fn has_known_id(&self) -> bool {
        self.id != Self::UNKNOWN_ID
    }
}
