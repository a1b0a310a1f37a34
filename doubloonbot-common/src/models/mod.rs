pub mod economy;
pub mod voice;

pub use economy::{SlotSpinRecord, UserBalance};
pub use voice::{SessionKey, VoiceJoinRecord, VoiceSessionRecord};
