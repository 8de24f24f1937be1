use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    commbot_common::types::{MediaItem, MediaKind},
    commbot_dispatch::{Error, Result, Transport},
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{
            ChatId, InputFile, InputMedia, InputMediaAudio, InputMediaDocument, InputMediaPhoto,
            InputMediaVideo, MessageId, ReplyParameters,
        },
    },
    tracing::{debug, warn},
};

const RETRY_AFTER_MAX_RETRIES: usize = 4;

/// [`Transport`] over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Run `request`, sleeping through Telegram's flood-control waits.
    async fn with_retry<T, F, Fut>(
        &self,
        chat_id: i64,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;
        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };
                    if retries >= RETRY_AFTER_MAX_RETRIES {
                        warn!(chat_id, operation, retries, "telegram rate limit persisted after retries");
                        return Err(err);
                    }
                    retries += 1;
                    warn!(
                        chat_id,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_reply(&self, chat_id: i64, text: &str, reply_to: i32) -> Result<()> {
        let params = ReplyParameters::new(MessageId(reply_to)).allow_sending_without_reply();
        self.with_retry(chat_id, "send reply", || {
            let req = self
                .bot
                .send_message(ChatId(chat_id), text)
                .reply_parameters(params.clone());
            async move { req.await }
        })
        .await
        .map_err(|e| Error::transport("send reply", e))?;
        debug!(chat_id, reply_to, "reply sent");
        Ok(())
    }

    async fn export_invite_link(&self, chat_id: i64) -> Result<String> {
        self.with_retry(chat_id, "export invite link", || {
            let req = self.bot.export_chat_invite_link(ChatId(chat_id));
            async move { req.await }
        })
        .await
        .map_err(|e| Error::transport("export invite link", e))
    }

    async fn send_media_group(&self, chat_id: i64, items: &[MediaItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let media: Vec<InputMedia> = items.iter().map(input_media).collect();
        self.with_retry(chat_id, "send media group", || {
            let req = self.bot.send_media_group(ChatId(chat_id), media.clone());
            async move { req.await }
        })
        .await
        .map_err(|e| Error::transport("send media group", e))?;
        debug!(chat_id, items = items.len(), "media group sent");
        Ok(())
    }
}

fn input_media(item: &MediaItem) -> InputMedia {
    let file = InputFile::file_id(item.file_id.clone());
    let caption = item.caption.clone();
    match item.kind {
        MediaKind::Photo => {
            let mut m = InputMediaPhoto::new(file);
            m.caption = caption;
            InputMedia::Photo(m)
        },
        MediaKind::Video => {
            let mut m = InputMediaVideo::new(file);
            m.caption = caption;
            InputMedia::Video(m)
        },
        MediaKind::Document => {
            let mut m = InputMediaDocument::new(file);
            m.caption = caption;
            InputMedia::Document(m)
        },
        MediaKind::Audio => {
            let mut m = InputMediaAudio::new(file);
            m.caption = caption;
            InputMedia::Audio(m)
        },
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}
