//! Typing and read-state tracking.

pub mod typing;
pub mod watermark;

pub use typing::{TypingStatus, TypingTracker};
pub use watermark::{ParticipantWatermarks, ReadWatermark, WatermarkNotification};
