//! Timer-driven scene effects
//!
//! - [`flicker`]: neon signs and street lamps dropping out at random
//! - [`fly_by`]: an actor crossing the scene in a loop with its radio

pub mod flicker;
pub mod fly_by;

pub use flicker::{
    choose_flicker_behavior, schedule_flicker, FlickerBehavior, FlickerHost, FlickerProfile, FlickerTarget,
    TargetKind, MAX_EMISSIVE_INTENSITY,
};
pub use fly_by::{AudioChannel, FadeProgress, LoopAnimator, LoopEvent, LoopState, LoopedActor};
