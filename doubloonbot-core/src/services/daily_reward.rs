//! Once-per-day login bonus.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::Error;
use crate::repositories::EconomyRepo;

/// Doubloons granted on the first join of each UTC calendar day.
pub const DAILY_REWARD_AMOUNT: i64 = 100;

pub struct DailyRewardService {
    economy: Arc<dyn EconomyRepo>,
}

impl DailyRewardService {
    pub fn new(economy: Arc<dyn EconomyRepo>) -> Self {
        Self { economy }
    }

    /// Grant today's reward unless it was already claimed. The claim is
    /// an atomic conditional update keyed on the stored date, so two
    /// interleaved calls for one user on the same day produce exactly
    /// one credit.
    pub async fn grant_if_eligible(&self, user_id: i64) -> Result<bool, Error> {
        let today = Utc::now().date_naive();
        if !self.economy.claim_daily_reward(user_id, today).await? {
            debug!("Daily reward for {user_id} already claimed on {today}");
            return Ok(false);
        }

        self.economy.credit(user_id, DAILY_REWARD_AMOUNT).await?;
        debug!("Granted daily reward of {DAILY_REWARD_AMOUNT} to {user_id}");
        Ok(true)
    }
}
