use std::{sync::Arc, time::Duration};

use {
    commbot_dispatch::UpdateRouter,
    secrecy::{ExposeSecret, Secret},
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand},
    },
    tokio::sync::Semaphore,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    convert::convert_update,
    error::{Error, Result},
};

/// Back-off after a failed `getUpdates` call.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Long-polling settings.
#[derive(Debug, Clone, Copy)]
pub struct PollingOptions {
    pub timeout_secs: u32,
    /// Updates dispatched at once.
    pub max_concurrent: usize,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_concurrent: 16,
        }
    }
}

/// A verified bot connection.
pub struct Connected {
    pub bot: Bot,
    pub username: Option<String>,
}

/// Build a client for `token`, verify it and clear any webhook.
///
/// The HTTP timeout is kept above the long-poll timeout so the client does
/// not abort `getUpdates` before Telegram answers.
pub async fn connect(token: &Secret<String>, polling_timeout_secs: u32) -> Result<Connected> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(polling_timeout_secs) + 15))
        .build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;
    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    Ok(Connected {
        username: me.username.clone(),
        bot,
    })
}

/// Register command descriptions for autocomplete in Telegram clients.
/// Failure is logged and otherwise ignored.
pub async fn register_commands(bot: &Bot, commands: &[(&str, &str)]) {
    let commands: Vec<BotCommand> = commands
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(error = %e, "failed to register bot commands");
    }
}

/// Poll for updates and dispatch each through `router` until `cancel` fires.
///
/// Every update runs on its own task; at most `max_concurrent` run at once
/// and polling waits for a free slot. Returns [`Error::Conflict`] when another
/// instance polls with the same token.
pub async fn run_polling(
    bot: Bot,
    router: Arc<UpdateRouter>,
    options: PollingOptions,
    cancel: CancellationToken,
) -> Result<()> {
    let permits = Arc::new(Semaphore::new(options.max_concurrent.max(1)));
    let mut offset: i32 = 0;
    info!(
        timeout_secs = options.timeout_secs,
        max_concurrent = options.max_concurrent,
        "starting telegram polling loop"
    );

    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(options.timeout_secs)
            .allowed_updates(vec![
                AllowedUpdate::Message,
                AllowedUpdate::EditedMessage,
                AllowedUpdate::ChannelPost,
                AllowedUpdate::CallbackQuery,
            ]);

        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for raw in updates {
                    offset = raw.id.as_offset();
                    let update = convert_update(&raw);

                    let permit = tokio::select! {
                        () = cancel.cancelled() => break,
                        permit = Arc::clone(&permits).acquire_owned() => permit,
                    };
                    let Ok(permit) = permit else {
                        break;
                    };

                    let router = Arc::clone(&router);
                    tokio::spawn(async move {
                        let _permit = permit;
                        // Failures are logged by the router.
                        router.dispatch(&update).await;
                    });
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("telegram polling stopped: another instance is already running with this token");
                return Err(Error::Conflict);
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                }
            },
        }
    }

    info!("telegram polling stopped");
    Ok(())
}
