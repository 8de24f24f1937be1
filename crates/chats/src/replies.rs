//! User-facing reply texts of the chat commands.

use std::fmt;

/// Why a chat command was refused. `Display` is the reply sent to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// `add_chat` without a name line and a link line.
    MalformedAddChat,
    /// `add_chat` whose link is not a private invite link.
    InvalidInviteLink,
    /// `add_this_chat` sent in a private conversation.
    PrivateChat,
    /// `add_this_chat` with no link given, recorded, or exportable.
    NoInviteLink,
    /// `remove_chat` from someone outside the admin list.
    NotAdmin,
    /// `remove_chat` without a chat name.
    MissingChatName,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MalformedAddChat => {
                "Malformed command. Send the chat name on the first line and its invite link on \
                 the second, or ask the admins for help."
            },
            Self::InvalidInviteLink => {
                "Invalid invite link: it must start with 'https://t.me/joinchat/'. Public chats \
                 don't need to be added."
            },
            Self::PrivateChat => "Why are you trying to add our private chat to the chat list? >_>",
            Self::NoInviteLink => {
                "Either send me an invite link with the command, or make me an admin so I can \
                 create one myself."
            },
            Self::NotAdmin => "If you want a chat removed from my list, ask the admins.",
            Self::MissingChatName => "Write the full name of the chat to remove next to the command.",
        };
        f.write_str(text)
    }
}

pub const CHAT_SAVED: &str = "Chat added/updated! Thanks for helping the bot!";
pub const THIS_CHAT_SAVED: &str = "Chat added! Thanks for helping the bot!";
pub const CHAT_LIST_EMPTY: &str = "The chat list is empty.";

pub fn chat_removed(name: &str) -> String {
    format!("If a chat named {name} was in my list, it has been removed.")
}

pub fn chat_id(id: i64) -> String {
    format!("ID of this chat: {id}")
}
