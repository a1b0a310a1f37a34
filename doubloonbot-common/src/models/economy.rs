use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One user's doubloon balance. Credits only in this bot; the row is
/// created lazily on first credit and an absent row reads as zero.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserBalance {
    pub user_id: i64,
    pub balance: i64,
}

/// Append-only row written for every fired slot roll, win or lose.
/// `grid` holds the full 3x3 symbol matrix as JSON; `rarity` is the join
/// announcement tier the roll was scheduled under.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SlotSpinRecord {
    pub spin_id: Uuid,
    pub guild_id: i64,
    pub user_id: i64,
    pub rarity: String,
    pub grid: Value,
    pub win: bool,
    pub symbol: Option<String>,
    pub payout: i64,
    pub rolled_at: DateTime<Utc>,
}
