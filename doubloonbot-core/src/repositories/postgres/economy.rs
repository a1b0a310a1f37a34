// src/repositories/postgres/economy.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::Error;
use doubloonbot_common::models::economy::{SlotSpinRecord, UserBalance};

/// The reward ledger plus the once-a-day claim gate.
///
/// Balance mutations never read-then-write on the client: credits are
/// single-statement increments and the daily claim is a conditional
/// upsert, so interleaved handlers for the same user cannot overwrite
/// each other's updates.
#[async_trait]
pub trait EconomyRepo: Send + Sync + 'static {
    /// Current balance; an absent row reads as 0.
    async fn get_balance(&self, user_id: i64) -> Result<i64, Error>;

    /// Add `amount` doubloons to the user's balance, creating the row if
    /// needed.
    async fn credit(&self, user_id: i64, amount: i64) -> Result<(), Error>;

    /// Move the user's last-reward date to `today` iff it isn't already
    /// there. Returns whether this call won the claim.
    async fn claim_daily_reward(&self, user_id: i64, today: NaiveDate) -> Result<bool, Error>;

    /// Append one slot-spin history row.
    async fn insert_slot_spin(&self, spin: &SlotSpinRecord) -> Result<(), Error>;
}

/// Postgres-based economy repository.
#[derive(Clone)]
pub struct PostgresEconomyRepository {
    pool: Pool<Postgres>,
}

impl PostgresEconomyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EconomyRepo for PostgresEconomyRepository {
    async fn get_balance(&self, user_id: i64) -> Result<i64, Error> {
        let row = sqlx::query_as::<_, UserBalance>(
            r#"
            SELECT user_id, balance
            FROM user_balances
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.balance).unwrap_or(0))
    }

    async fn credit(&self, user_id: i64, amount: i64) -> Result<(), Error> {
        // Server-side increment; concurrent credits serialize in Postgres.
        sqlx::query(
            r#"
            INSERT INTO user_balances (user_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
              SET balance = user_balances.balance + EXCLUDED.balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn claim_daily_reward(&self, user_id: i64, today: NaiveDate) -> Result<bool, Error> {
        // The WHERE clause makes a same-day second claim a no-op; the
        // affected-row count tells us which side of that we landed on.
        let result = sqlx::query(
            r#"
            INSERT INTO daily_rewards (user_id, last_reward_date)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
              SET last_reward_date = EXCLUDED.last_reward_date
              WHERE daily_rewards.last_reward_date IS DISTINCT FROM EXCLUDED.last_reward_date
            "#,
        )
        .bind(user_id)
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_slot_spin(&self, spin: &SlotSpinRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO slot_spins (
                spin_id, guild_id, user_id, rarity,
                grid, win, symbol, payout, rolled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(spin.spin_id)
        .bind(spin.guild_id)
        .bind(spin.user_id)
        .bind(&spin.rarity)
        .bind(&spin.grid)
        .bind(spin.win)
        .bind(&spin.symbol)
        .bind(spin.payout)
        .bind(spin.rolled_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
