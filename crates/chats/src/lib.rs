//! Community chat list: the saved-chat repository and the command handlers
//! that maintain it.
//!
//! Persistent storage lives behind [`ChatRepository`]; [`MemoryChatStore`]
//! serves tests and ephemeral runs, [`SqliteChatStore`] the real bot.

pub mod error;
pub mod handler;
pub mod list;
pub mod replies;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    handler::ChatManageHandler,
    list::ChatListHandler,
    replies::Rejection,
    store::ChatRepository,
    store_memory::MemoryChatStore,
    store_sqlite::SqliteChatStore,
};

/// Commands handled by this crate with their autocomplete descriptions.
pub const BOT_COMMANDS: &[(&str, &str)] = &[
    (list::CHATS, "List community chats"),
    (handler::ADD_CHAT, "Add a chat: name and invite link on separate lines"),
    (handler::ADD_THIS_CHAT, "Add the current group to the list"),
    (handler::REMOVE_CHAT, "Remove a chat by exact name (admins only)"),
    (handler::GET_ID_OF_THIS_CHAT, "Show the id of this chat"),
];

/// Run database migrations for the chat list.
///
/// Creates the `saved_chats` table. Call at startup before constructing
/// [`SqliteChatStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
