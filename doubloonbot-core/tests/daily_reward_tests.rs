// tests/daily_reward_tests.rs

mod common;

use std::sync::Arc;

use common::MemoryEconomyRepo;
use doubloonbot_core::services::{DAILY_REWARD_AMOUNT, DailyRewardService};

#[tokio::test]
async fn same_day_double_claim_credits_once() {
    let economy = Arc::new(MemoryEconomyRepo::default());
    let service = DailyRewardService::new(economy.clone());

    let first = service.grant_if_eligible(42).await.unwrap();
    let second = service.grant_if_eligible(42).await.unwrap();

    assert!(first, "first claim of the day should grant");
    assert!(!second, "second claim of the day should not");
    assert_eq!(economy.balance(42), DAILY_REWARD_AMOUNT);
}

#[tokio::test]
async fn claims_are_per_user() {
    let economy = Arc::new(MemoryEconomyRepo::default());
    let service = DailyRewardService::new(economy.clone());

    assert!(service.grant_if_eligible(1).await.unwrap());
    assert!(service.grant_if_eligible(2).await.unwrap());

    assert_eq!(economy.balance(1), DAILY_REWARD_AMOUNT);
    assert_eq!(economy.balance(2), DAILY_REWARD_AMOUNT);
}
