//! Wires config, storage, handlers and the Telegram adapter into a running bot.

use std::{path::Path, sync::Arc};

use {
    anyhow::Context,
    commbot_chats::{
        BOT_COMMANDS, ChatListHandler, ChatManageHandler, ChatRepository, MemoryChatStore,
        SqliteChatStore,
    },
    commbot_config::{BotConfig, Severity},
    commbot_dispatch::{CommandParser, Transport, UpdateRouter},
    commbot_media_group::{
        AlbumSink, LogAlbumSink, MediaGroupHandler, MediaGroupStore, RepostAlbumSink,
    },
    commbot_telegram::{PollingOptions, TelegramTransport},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

/// Load config from `path` or the standard locations, then apply env overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<BotConfig> {
    let config = match path {
        Some(path) => commbot_config::load_config(path)?,
        None => commbot_config::discover_and_load(),
    };
    Ok(commbot_config::apply_env_overrides(config))
}

/// Log every diagnostic; fail when any is an error.
fn check(config: &BotConfig) -> anyhow::Result<()> {
    let diagnostics = commbot_config::validate(config);
    for d in &diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => info!(path = %d.path, "{}", d.message),
        }
    }
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        anyhow::bail!("invalid configuration; run `commbot check-config` for details");
    }
    Ok(())
}

async fn open_repository(config: &BotConfig) -> anyhow::Result<Arc<dyn ChatRepository>> {
    Ok(match config.storage.database_url.as_deref() {
        Some(url) => {
            let store = SqliteChatStore::connect(url)
                .await
                .with_context(|| format!("failed to open chat database {url}"))?;
            info!("chat list stored in sqlite");
            Arc::new(store)
        },
        None => {
            info!("chat list kept in memory");
            Arc::new(MemoryChatStore::new())
        },
    })
}

/// Handlers in priority order: chat commands first, album assembly last.
pub fn build_router(
    config: &BotConfig,
    parser: CommandParser,
    repository: Arc<dyn ChatRepository>,
    transport: Arc<dyn Transport>,
    media: MediaGroupHandler,
) -> UpdateRouter {
    let manage = ChatManageHandler::new(
        Arc::clone(&repository),
        Arc::clone(&transport),
        config.admins.clone(),
    )
    .with_parser(parser.clone());
    let list = ChatListHandler::new(repository, transport).with_parser(parser);

    UpdateRouter::builder()
        .handler(Arc::new(manage))
        .handler(Arc::new(list))
        .handler(Arc::new(media))
        .build()
}

/// Album sink for the configured repost target, or a logging sink.
pub fn album_sink(config: &BotConfig, transport: Arc<dyn Transport>) -> Arc<dyn AlbumSink> {
    match config.media_group.repost_chat_id {
        Some(chat_id) => Arc::new(RepostAlbumSink::new(transport, chat_id)),
        None => Arc::new(LogAlbumSink),
    }
}

/// Run the bot until Ctrl-C.
pub async fn run(config: BotConfig) -> anyhow::Result<()> {
    check(&config)?;

    let connected =
        commbot_telegram::connect(&config.telegram.token, config.telegram.polling_timeout_secs)
            .await
            .context("failed to connect to telegram")?;
    commbot_telegram::register_commands(&connected.bot, BOT_COMMANDS).await;

    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(connected.bot.clone()));
    let repository = open_repository(&config).await?;

    let mut parser = CommandParser::new(config.telegram.command_prefix);
    if let Some(username) = connected.username.as_deref() {
        parser = parser.with_bot_username(username);
    }

    let cancel = CancellationToken::new();
    let store = Arc::new(MediaGroupStore::new(config.media_group.expiry()));
    let janitor = store.spawn_janitor(config.media_group.sweep_interval(), cancel.clone());
    let media = MediaGroupHandler::new(store, album_sink(&config, Arc::clone(&transport)))
        .with_window(config.media_group.debounce())
        .with_cancellation(cancel.clone());

    let router = Arc::new(build_router(&config, parser, repository, transport, media));
    info!(handlers = ?router.list(), "update router ready");

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                shutdown.cancel();
            },
            Err(e) => warn!(error = %e, "cannot listen for ctrl-c"),
        }
    });

    let options = PollingOptions {
        timeout_secs: config.telegram.polling_timeout_secs,
        max_concurrent: config.telegram.max_concurrent_updates,
    };
    let result = commbot_telegram::run_polling(connected.bot, router, options, cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = janitor.await {
        warn!(error = %e, "media group janitor ended abnormally");
    }
    result.context("telegram polling failed")
}
