//! Link repository.
//!
//! Persists game account <-> chat account links and pending linking codes.
//! Chat account ids are unsigned snowflakes stored bit-for-bit in SQLite's
//! signed `INTEGER` column.

use super::Database;
use crate::error::BackendError;
use crate::linking::{InsertOutcome, LinkBackend, LinkingCode};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

fn user_to_db(user_id: u64) -> i64 {
    user_id as i64
}

fn user_from_db(raw: i64) -> u64 {
    raw as u64
}

fn parse_player(raw: &str) -> Result<Uuid, BackendError> {
    Uuid::parse_str(raw).map_err(|e| BackendError::Corrupt(format!("player uuid {raw:?}: {e}")))
}

fn parse_timestamp(raw: i64) -> Result<DateTime<Utc>, BackendError> {
    Utc.timestamp_opt(raw, 0)
        .single()
        .ok_or_else(|| BackendError::Corrupt(format!("timestamp {raw}")))
}

/// Repository for link operations.
pub struct LinkRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LinkRepository<'a> {
    /// Create a new link repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a write transaction holding SQLite's write lock from the start.
    ///
    /// A deferred transaction that reads before writing cannot wait out a
    /// concurrent writer; its upgrade fails with `SQLITE_BUSY` at once.
    /// `BEGIN IMMEDIATE` queues on the busy timeout instead.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, BackendError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Chat account linked to `player_id`.
    pub async fn user_for(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM links WHERE player_uuid = ?")
            .bind(player_id.to_string())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|(raw,)| user_from_db(raw)))
    }

    /// Game account linked to `user_id`.
    pub async fn player_for(&self, user_id: u64) -> Result<Option<Uuid>, BackendError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT player_uuid FROM links WHERE user_id = ?")
                .bind(user_to_db(user_id))
                .fetch_optional(self.pool)
                .await?;
        row.map(|(raw,)| parse_player(&raw)).transpose()
    }

    /// Insert a link, deciding the outcome and writing in one transaction.
    pub async fn insert(&self, player_id: Uuid, user_id: u64) -> Result<InsertOutcome, BackendError> {
        let player = player_id.to_string();
        let user = user_to_db(user_id);
        let mut tx = self.begin_write().await?;

        let existing: Vec<(String, i64)> =
            sqlx::query_as("SELECT player_uuid, user_id FROM links WHERE player_uuid = ? OR user_id = ?")
                .bind(&player)
                .bind(user)
                .fetch_all(&mut *tx)
                .await?;

        if !existing.is_empty() {
            let exact = existing.len() == 1 && existing[0].0 == player && existing[0].1 == user;
            return Ok(if exact {
                InsertOutcome::AlreadyExists
            } else {
                InsertOutcome::Conflict
            });
        }

        let result = sqlx::query("INSERT INTO links (player_uuid, user_id, linked_at) VALUES (?, ?, ?)")
            .bind(&player)
            .bind(user)
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await;

        match result {
            Ok(_) => {}
            // Another writer won between our read and write.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Ok(InsertOutcome::Conflict);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(InsertOutcome::Created)
    }

    /// Delete the link for `player_id`.
    pub async fn remove(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        let player = player_id.to_string();
        let mut tx = self.begin_write().await?;

        let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM links WHERE player_uuid = ?")
            .bind(&player)
            .fetch_optional(&mut *tx)
            .await?;

        if row.is_some() {
            sqlx::query("DELETE FROM links WHERE player_uuid = ?")
                .bind(&player)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(row.map(|(raw,)| user_from_db(raw)))
    }

    pub async fn count(&self) -> Result<u64, BackendError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
            .fetch_one(self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Store a linking code, replacing the player's earlier code.
    pub async fn put_code(&self, code: &LinkingCode) -> Result<bool, BackendError> {
        let player = code.player_id.to_string();
        let now = Utc::now().timestamp();
        let mut tx = self.begin_write().await?;

        let holder: Option<(String,)> = sqlx::query_as(
            "SELECT player_uuid FROM linking_codes WHERE code = ? AND expires_at > ?",
        )
        .bind(&code.code)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((holder,)) = holder
            && holder != player
        {
            return Ok(false);
        }

        sqlx::query("DELETE FROM linking_codes WHERE player_uuid = ? OR code = ?")
            .bind(&player)
            .bind(&code.code)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO linking_codes (code, player_uuid, expires_at) VALUES (?, ?, ?)")
            .bind(&code.code)
            .bind(&player)
            .bind(code.expires_at.timestamp())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Live code held by `player_id`.
    pub async fn code_for(
        &self,
        player_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<LinkingCode>, BackendError> {
        let row: Option<(String, i64)> = sqlx::query_as(
            "SELECT code, expires_at FROM linking_codes WHERE player_uuid = ? AND expires_at > ?",
        )
        .bind(player_id.to_string())
        .bind(now.timestamp())
        .fetch_optional(self.pool)
        .await?;

        row.map(|(code, expires_at)| {
            Ok(LinkingCode {
                code,
                player_id,
                expires_at: parse_timestamp(expires_at)?,
            })
        })
        .transpose()
    }

    /// Consume `code`. The row is deleted even when expired.
    pub async fn take_code(&self, code: &str, now: DateTime<Utc>) -> Result<Option<Uuid>, BackendError> {
        let mut tx = self.begin_write().await?;

        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT player_uuid, expires_at FROM linking_codes WHERE code = ?")
                .bind(code)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((player, expires_at)) = row else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM linking_codes WHERE code = ?")
            .bind(code)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if expires_at <= now.timestamp() {
            return Ok(None);
        }
        parse_player(&player).map(Some)
    }

    pub async fn prune_codes(&self, now: DateTime<Utc>) -> Result<u64, BackendError> {
        let result = sqlx::query("DELETE FROM linking_codes WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LinkBackend for Database {
    async fn get_user(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        self.links().user_for(player_id).await
    }

    async fn get_player(&self, user_id: u64) -> Result<Option<Uuid>, BackendError> {
        self.links().player_for(user_id).await
    }

    async fn insert_link(
        &self,
        player_id: Uuid,
        user_id: u64,
    ) -> Result<InsertOutcome, BackendError> {
        self.links().insert(player_id, user_id).await
    }

    async fn remove_link(&self, player_id: Uuid) -> Result<Option<u64>, BackendError> {
        self.links().remove(player_id).await
    }

    async fn link_count(&self) -> Result<u64, BackendError> {
        self.links().count().await
    }

    async fn put_linking_code(&self, code: &LinkingCode) -> Result<bool, BackendError> {
        self.links().put_code(code).await
    }

    async fn linking_code_for(
        &self,
        player_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<LinkingCode>, BackendError> {
        self.links().code_for(player_id, now).await
    }

    async fn take_linking_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, BackendError> {
        self.links().take_code(code, now).await
    }

    async fn prune_expired_codes(&self, now: DateTime<Utc>) -> Result<u64, BackendError> {
        self.links().prune_codes(now).await
    }
}
