//! Conversion from teloxide's wire model into the bot's own update types.

use {
    commbot_common::types::{
        Chat, ChatKind, MediaItem, MediaKind, Message, Update, UpdateKind, User,
    },
    teloxide::types::{
        Chat as TgChat, MediaKind as TgMediaKind, Message as TgMessage, MessageKind,
        Update as TgUpdate, UpdateKind as TgUpdateKind, User as TgUser,
    },
};

/// Convert one polled update. Kinds the bot does not model become
/// [`UpdateKind::Other`] without a message.
pub fn convert_update(update: &TgUpdate) -> Update {
    let id = i64::from(update.id.0);
    let (kind, message) = match &update.kind {
        TgUpdateKind::Message(msg) => (UpdateKind::Message, Some(msg)),
        TgUpdateKind::EditedMessage(msg) => (UpdateKind::EditedMessage, Some(msg)),
        TgUpdateKind::ChannelPost(msg) => (UpdateKind::ChannelPost, Some(msg)),
        TgUpdateKind::CallbackQuery(_) => (UpdateKind::CallbackQuery, None),
        _ => (UpdateKind::Other, None),
    };
    Update {
        id,
        kind,
        message: message.map(convert_message),
    }
}

pub fn convert_message(msg: &TgMessage) -> Message {
    Message {
        id: msg.id.0,
        chat: convert_chat(&msg.chat),
        from: msg.from.as_ref().map(convert_user),
        text: msg.text().map(str::to_string),
        media: media_item(msg),
        media_group_id: msg.media_group_id().map(ToString::to_string),
    }
}

fn convert_chat(chat: &TgChat) -> Chat {
    let kind = if chat.is_private() {
        ChatKind::Private
    } else if chat.is_channel() {
        ChatKind::Channel
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Group
    };
    // Updates never carry the invite link; it is exported on demand.
    Chat {
        id: chat.id.0,
        kind,
        title: chat.title().map(str::to_string),
        invite_link: None,
    }
}

fn convert_user(user: &TgUser) -> User {
    User {
        id: user.id.0,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

/// The album-capable payload of a message, if any.
fn media_item(msg: &TgMessage) -> Option<MediaItem> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };
    let (kind, file_id, caption) = match &common.media_kind {
        // Largest size last.
        TgMediaKind::Photo(p) => (MediaKind::Photo, p.photo.last()?.file.id.clone(), &p.caption),
        TgMediaKind::Video(v) => (MediaKind::Video, v.video.file.id.clone(), &v.caption),
        TgMediaKind::Document(d) => (MediaKind::Document, d.document.file.id.clone(), &d.caption),
        TgMediaKind::Audio(a) => (MediaKind::Audio, a.audio.file.id.clone(), &a.caption),
        _ => return None,
    };
    Some(MediaItem {
        kind,
        file_id,
        caption: caption.clone(),
    })
}
