// src/games/mod.rs
//
// Pure game logic: no I/O, no retained state, entropy comes in through
// the caller's RNG so tests can seed it.

pub mod rarity;
pub mod slots;

pub use rarity::{RarityTier, join_phrase, pick_rarity};
pub use slots::{SlotGrid, SlotSymbol, SpinOutcome, evaluate, spin};
