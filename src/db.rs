use std::str::FromStr;
use std::sync::Arc;

use anyhow::{ensure, Context};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::is_identifier;
use crate::models::Paste;

const COLUMNS: &str = "key, data, heading, created_at, ip_address, open_count";

/// Handle to the paste collection. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    table: Arc<str>,
}

impl Database {
    /// Connect to a database by URL and make sure the paste table exists.
    pub async fn connect(url: &str, table: &str) -> anyhow::Result<Self> {
        ensure!(is_identifier(table), "invalid table name '{table}'");

        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?;

        // every connection to an in-memory database sees its own empty database
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("failed to connect to database")?;

        let database = Self {
            pool,
            table: table.into(),
        };
        database
            .create_schema()
            .await
            .context("failed to create paste table")?;

        Ok(database)
    }

    async fn create_schema(&self) -> sqlx::Result<()> {
        let table = &self.table;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                key TEXT PRIMARY KEY NOT NULL,
                data TEXT NOT NULL,
                heading TEXT NOT NULL,
                created_at TEXT NOT NULL,
                ip_address TEXT NOT NULL,
                open_count INTEGER NOT NULL DEFAULT 0
            )"
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {table}_created_at ON {table} (created_at)"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a paste with an open count of zero.
    ///
    /// Returns `None` without touching the stored record if the key is already taken.
    pub async fn insert_paste(
        &self,
        key: &str,
        data: &str,
        heading: &str,
        ip_address: &str,
        created_at: DateTime<Utc>,
    ) -> crate::ApiResult<Option<Paste>> {
        let table = &self.table;
        let paste = sqlx::query_as::<_, Paste>(&format!(
            "INSERT INTO {table} (key, data, heading, created_at, ip_address, open_count) \
             VALUES (?, ?, ?, ?, ?, 0) ON CONFLICT (key) DO NOTHING RETURNING {COLUMNS}"
        ))
        .bind(key)
        .bind(data)
        .bind(heading)
        .bind(created_at)
        .bind(ip_address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(paste)
    }

    /// Increment a paste's open count and return the updated paste.
    pub async fn open_paste(&self, key: &str) -> crate::ApiResult<Paste> {
        let table = &self.table;
        let paste = sqlx::query_as::<_, Paste>(&format!(
            "UPDATE {table} SET open_count = open_count + 1 WHERE key = ? RETURNING {COLUMNS}"
        ))
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        Ok(paste)
    }

    /// Delete every paste opened fewer than `min_opens` times and created before `cutoff`.
    pub async fn delete_stale_pastes(
        &self,
        min_opens: i64,
        cutoff: DateTime<Utc>,
    ) -> crate::ApiResult<u64> {
        let table = &self.table;
        let result = sqlx::query(&format!(
            "DELETE FROM {table} WHERE open_count < ? AND created_at < ?"
        ))
        .bind(min_opens)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
impl Database {
    pub async fn memory() -> Self {
        Database::connect("sqlite::memory:", "pastes")
            .await
            .expect("in-memory database")
    }

    /// Read a paste without counting it as an open.
    pub async fn peek_paste(&self, key: &str) -> Option<Paste> {
        let table = &self.table;
        sqlx::query_as::<_, Paste>(&format!("SELECT {COLUMNS} FROM {table} WHERE key = ?"))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .unwrap()
    }

    pub async fn count_pastes(&self) -> i64 {
        let table = &self.table;
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn drop_table(&self) {
        let table = &self.table;
        sqlx::query(&format!("DROP TABLE {table}"))
            .execute(&self.pool)
            .await
            .unwrap();
    }

    pub async fn recreate_table(&self) {
        self.create_schema().await.unwrap();
    }

    pub async fn backdate(&self, key: &str, created_at: DateTime<Utc>, open_count: i64) {
        let table = &self.table;
        sqlx::query(&format!(
            "UPDATE {table} SET created_at = ?, open_count = ? WHERE key = ?"
        ))
        .bind(created_at)
        .bind(open_count)
        .bind(key)
        .execute(&self.pool)
        .await
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::keys::KeyGenerator;
    use crate::ApiError;

    #[tokio::test]
    async fn insert_then_open_increments() {
        let db = Database::memory().await;
        let now = Utc::now();

        let paste = db
            .insert_paste("abc123", "hello", "My Paste", "127.0.0.1", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paste.open_count, 0);
        assert_eq!(paste.data, "hello");

        for expected in 1..=3 {
            let opened = db.open_paste("abc123").await.unwrap();
            assert_eq!(opened.open_count, expected);
        }
        assert_eq!(db.peek_paste("abc123").await.unwrap().open_count, 3);
    }

    #[tokio::test]
    async fn duplicate_key_is_not_overwritten() {
        let db = Database::memory().await;
        let now = Utc::now();

        db.insert_paste("dup", "first", "a", "ip", now)
            .await
            .unwrap()
            .unwrap();
        let second = db
            .insert_paste("dup", "second", "b", "ip", now)
            .await
            .unwrap();

        assert!(second.is_none());
        assert_eq!(db.peek_paste("dup").await.unwrap().data, "first");
        assert_eq!(db.count_pastes().await, 1);
    }

    #[tokio::test]
    async fn open_missing_is_not_found() {
        let db = Database::memory().await;
        assert!(matches!(
            db.open_paste("nope").await,
            Err(ApiError::NotFound)
        ));
        assert_eq!(db.count_pastes().await, 0);
    }

    #[tokio::test]
    async fn delete_requires_both_conditions() {
        let db = Database::memory().await;
        let now = Utc::now();
        let old = now - Duration::days(8);

        for key in ["old_unread", "old_popular", "new_unread", "new_popular"] {
            db.insert_paste(key, "x", "h", "ip", now)
                .await
                .unwrap()
                .unwrap();
        }
        db.backdate("old_unread", old, 1).await;
        db.backdate("old_popular", old, 2).await;
        db.backdate("new_popular", now, 5).await;

        let deleted = db
            .delete_stale_pastes(2, now - Duration::days(7))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(db.peek_paste("old_unread").await.is_none());
        assert_eq!(db.peek_paste("old_popular").await.unwrap().open_count, 2);
        assert!(db.peek_paste("new_unread").await.is_some());
        assert_eq!(db.peek_paste("new_popular").await.unwrap().open_count, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_opens_see_distinct_counts() {
        const OPENS: i64 = 20;

        let path = std::env::temp_dir().join(format!(
            "pastebin-{}.db",
            KeyGenerator::new(12).generate()
        ));
        let db = Database::connect(&format!("sqlite://{}?mode=rwc", path.display()), "pastes")
            .await
            .unwrap();
        db.insert_paste("shared", "x", "h", "ip", Utc::now())
            .await
            .unwrap()
            .unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..OPENS {
            let db = db.clone();
            tasks.spawn(async move { db.open_paste("shared").await.unwrap().open_count });
        }

        let mut counts = Vec::new();
        while let Some(count) = tasks.join_next().await {
            counts.push(count.unwrap());
        }
        counts.sort_unstable();

        assert_eq!(counts, (1..=OPENS).collect::<Vec<_>>());
        assert_eq!(db.peek_paste("shared").await.unwrap().open_count, OPENS);

        db.pool.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[tokio::test]
    async fn rejects_bad_table_name() {
        assert!(Database::connect("sqlite::memory:", "x y").await.is_err());
    }
}
