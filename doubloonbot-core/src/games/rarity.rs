//! Weighted rarity tiers for join announcements.
//!
//! A tier is drawn independently per join; it only affects flavor text
//! (and is carried into the scheduled slot roll as context).

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RarityTier {
    Common,
    Uncommon,
    Rare,
    Mythic,
}

impl RarityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RarityTier::Common => "common",
            RarityTier::Uncommon => "uncommon",
            RarityTier::Rare => "rare",
            RarityTier::Mythic => "mythic",
        }
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier weights in percent. Walked in declared order; must sum to 100.
pub const RARITY_TIERS: [(RarityTier, f64); 4] = [
    (RarityTier::Common, 70.0),
    (RarityTier::Uncommon, 20.0),
    (RarityTier::Rare, 8.75),
    (RarityTier::Mythic, 1.25),
];

/// Up to a handful of phrases per rarity, used verbatim between the
/// display name and the channel name in the announcement.
const COMMON_PHRASES: [&str; 4] = ["joined", "appeared in", "hopped into", "slid into"];
const UNCOMMON_PHRASES: [&str; 4] =
    ["teleported to", "waltzed into", "materialized in", "warped into"];
const RARE_PHRASES: [&str; 4] = ["yeeted into", "flossed into", "dabbed into", "rickrolled into"];
const MYTHIC_PHRASES: [&str; 4] = [
    "became one with",
    "glitched into",
    "was forcibly summoned to",
    "is now trapped in",
];

/// Draw a rarity tier: uniform roll over [0, 100), first tier whose
/// cumulative weight reaches the roll wins. The trailing return is a
/// guard against floating-point drift in the weights; with weights that
/// sum to exactly 100 it is unreachable.
pub fn pick_rarity(rng: &mut impl Rng) -> RarityTier {
    let roll: f64 = rng.random_range(0.0..100.0);
    let mut cumulative = 0.0;
    for (tier, weight) in RARITY_TIERS {
        cumulative += weight;
        if roll <= cumulative {
            return tier;
        }
    }
    RarityTier::Common
}

/// Pick one of the tier's phrases at random.
pub fn join_phrase(tier: RarityTier, rng: &mut impl Rng) -> &'static str {
    let phrases: &[&'static str] = match tier {
        RarityTier::Common => &COMMON_PHRASES,
        RarityTier::Uncommon => &UNCOMMON_PHRASES,
        RarityTier::Rare => &RARE_PHRASES,
        RarityTier::Mythic => &MYTHIC_PHRASES,
    };
    phrases.choose(rng).copied().unwrap_or("joined")
}
