//! SQLite-backed chat store using sqlx.

use {
    async_trait::async_trait,
    commbot_common::types::SavedChat,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
};

use crate::{Result, store::ChatRepository};

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct ChatRow {
    name: String,
    chat_id: i64,
    invite_link: String,
}

impl TryFrom<ChatRow> for SavedChat {
    type Error = crate::Error;

    fn try_from(r: ChatRow) -> Result<Self> {
        Ok(SavedChat::new(r.chat_id, r.name, r.invite_link)?)
    }
}

/// Persistent chat list in the `saved_chats` table.
pub struct SqliteChatStore {
    pool: SqlitePool,
}

impl SqliteChatStore {
    /// Open a pool for `database_url` and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Use an existing pool; [`crate::run_migrations`] must already have run.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[async_trait]
impl ChatRepository for SqliteChatStore {
    async fn add_or_update(&self, chat: SavedChat) -> Result<()> {
        let ts = now();
        let mut tx = self.pool.begin().await?;

        if chat.has_known_id() {
            // A renamed chat keeps one row: drop rows filed under its old name.
            sqlx::query("DELETE FROM saved_chats WHERE chat_id = ? AND name <> ?")
                .bind(chat.id)
                .bind(&chat.name)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"INSERT INTO saved_chats (name, chat_id, invite_link, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(name) DO UPDATE SET
                 chat_id = CASE WHEN excluded.chat_id = -1
                                THEN saved_chats.chat_id
                                ELSE excluded.chat_id END,
                 invite_link = excluded.invite_link,
                 updated_at = excluded.updated_at"#,
        )
        .bind(&chat.name)
        .bind(chat.id)
        .bind(&chat.invite_link)
        .bind(ts)
        .bind(ts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_by_name(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM saved_chats WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SavedChat>> {
        let rows = sqlx::query_as::<_, ChatRow>(
            "SELECT name, chat_id, invite_link FROM saved_chats ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteChatStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SqliteChatStore::with_pool(pool)
    }

    fn chat(id: i64, name: &str, link: &str) -> SavedChat {
        SavedChat::new(id, name, link).unwrap()
    }

    #[tokio::test]
    async fn upsert_and_list() {
        let store = test_store().await;
        store
            .add_or_update(chat(-1, "Test Chat", "https://t.me/joinchat/ABC123"))
            .await
            .unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all, vec![chat(-1, "Test Chat", "https://t.me/joinchat/ABC123")]);
    }

    #[tokio::test]
    async fn same_name_updates_existing_row() {
        let store = test_store().await;
        store
            .add_or_update(chat(-100, "Rust", "https://t.me/joinchat/old"))
            .await
            .unwrap();
        store
            .add_or_update(chat(-1, "Rust", "https://t.me/joinchat/new"))
            .await
            .unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all, vec![chat(-100, "Rust", "https://t.me/joinchat/new")]);
    }

    #[tokio::test]
    async fn known_id_replaces_old_name() {
        let store = test_store().await;
        store
            .add_or_update(chat(-100, "Old", "https://t.me/joinchat/a"))
            .await
            .unwrap();
        store
            .add_or_update(chat(-100, "New", "https://t.me/joinchat/b"))
            .await
            .unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all, vec![chat(-100, "New", "https://t.me/joinchat/b")]);
    }

    #[tokio::test]
    async fn remove_by_name_is_idempotent() {
        let store = test_store().await;
        store
            .add_or_update(chat(-1, "Rust", "https://t.me/joinchat/a"))
            .await
            .unwrap();

        store.remove_by_name("Rust").await.unwrap();
        store.remove_by_name("Rust").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
