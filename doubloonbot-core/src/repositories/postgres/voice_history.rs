// src/repositories/postgres/voice_history.rs
use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use crate::Error;
use doubloonbot_common::models::voice::{VoiceJoinRecord, VoiceSessionRecord};

/// Voice-presence history: join rows, completed-session rows, and the
/// per-member cumulative seconds counter.
#[async_trait]
pub trait VoiceHistoryRepo: Send + Sync + 'static {
    /// Append one join row.
    async fn insert_voice_join(&self, join: &VoiceJoinRecord) -> Result<(), Error>;

    /// Append one completed-session row.
    async fn insert_voice_session(&self, session: &VoiceSessionRecord) -> Result<(), Error>;

    /// Add `seconds` to the member's cumulative voice time.
    async fn add_voice_seconds(&self, guild_id: i64, user_id: i64, seconds: i64)
    -> Result<(), Error>;

    /// Cumulative voice time; an absent row reads as 0.
    async fn get_total_seconds(&self, guild_id: i64, user_id: i64) -> Result<i64, Error>;
}

/// Postgres-based voice history repository.
#[derive(Clone)]
pub struct PostgresVoiceHistoryRepository {
    pool: Pool<Postgres>,
}

impl PostgresVoiceHistoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoiceHistoryRepo for PostgresVoiceHistoryRepository {
    async fn insert_voice_join(&self, join: &VoiceJoinRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO voice_joins (
                join_id, guild_id, user_id, channel_id, joined_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(join.join_id)
        .bind(join.guild_id)
        .bind(join.user_id)
        .bind(join.channel_id)
        .bind(join.joined_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_voice_session(&self, session: &VoiceSessionRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO voice_sessions (
                session_id, guild_id, user_id, channel_id,
                started_at, ended_at, duration_seconds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.session_id)
        .bind(session.guild_id)
        .bind(session.user_id)
        .bind(session.channel_id)
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.duration_seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_voice_seconds(
        &self,
        guild_id: i64,
        user_id: i64,
        seconds: i64,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO voice_totals (guild_id, user_id, total_seconds)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, user_id) DO UPDATE
              SET total_seconds = voice_totals.total_seconds + EXCLUDED.total_seconds
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_total_seconds(&self, guild_id: i64, user_id: i64) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT total_seconds
            FROM voice_totals
            WHERE guild_id = $1 AND user_id = $2
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(r.try_get("total_seconds")?),
            None => Ok(0),
        }
    }
}
