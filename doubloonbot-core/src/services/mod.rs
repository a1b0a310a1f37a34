// src/services/mod.rs

pub mod daily_reward;
pub mod presence_service;
pub mod roll_scheduler;
pub mod session_tracker;
pub mod slot_service;

pub use daily_reward::{DAILY_REWARD_AMOUNT, DailyRewardService};
pub use presence_service::{ANNOUNCE_TTL, PresenceService, Transition, classify};
pub use roll_scheduler::{PendingRoll, ROLL_DELAY, RollDue, RollScheduler};
pub use session_tracker::{ActiveSession, ClosedSession, SessionTracker};
pub use slot_service::{SlotService, SpinReport};
