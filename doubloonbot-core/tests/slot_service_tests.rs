// tests/slot_service_tests.rs
//
// Settlement semantics with crafted grids: the spin record is always
// written, the ledger only moves on a win.

mod common;

use std::sync::Arc;

use common::{MemoryEconomyRepo, SilentAudio};
use doubloonbot_common::models::voice::SessionKey;
use doubloonbot_core::games::rarity::RarityTier;
use doubloonbot_core::games::slots::{SlotGrid, SlotSymbol::*};
use doubloonbot_core::services::SlotService;

fn service(economy: Arc<MemoryEconomyRepo>) -> SlotService {
    SlotService::new(economy, Arc::new(SilentAudio))
}

fn key() -> SessionKey {
    SessionKey::new(1, 42)
}

#[tokio::test]
async fn a_winning_grid_credits_the_payout() {
    let economy = Arc::new(MemoryEconomyRepo::default());
    let slots = service(economy.clone());

    let grid: SlotGrid =
        [[Diamond, Diamond, Diamond], [Lemon, Grape, Bell], [Grape, Bell, Lemon]];
    let report = slots.settle(grid, key(), "pirate", 7, RarityTier::Rare).await;

    assert!(report.outcome.win);
    assert_eq!(report.outcome.payout, Diamond.payout());
    assert_eq!(economy.balance(42), Diamond.payout());
    assert!(report.message.contains("+100 doubloons"));

    let spins = economy.spins.lock().unwrap().clone();
    assert_eq!(spins.len(), 1);
    assert!(spins[0].win);
    assert_eq!(spins[0].payout, Diamond.payout());
    assert_eq!(spins[0].rarity, "rare");
}

#[tokio::test]
async fn a_losing_grid_still_writes_a_record() {
    let economy = Arc::new(MemoryEconomyRepo::default());
    let slots = service(economy.clone());

    let grid: SlotGrid =
        [[Cherry, Lemon, Grape], [Grape, Cherry, Lemon], [Cherry, Grape, Lemon]];
    let report = slots.settle(grid, key(), "pirate", 7, RarityTier::Common).await;

    assert!(!report.outcome.win);
    assert_eq!(report.outcome.payout, 0);
    assert_eq!(economy.balance(42), 0);

    let spins = economy.spins.lock().unwrap().clone();
    assert_eq!(spins.len(), 1);
    assert!(!spins[0].win);
    assert_eq!(spins[0].symbol, None);
}
