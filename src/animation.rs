//! Per-node enter/exit effects and the state machine that drives them.

pub mod ease;
pub mod mask;
pub mod scheduler;
pub mod spec;

pub use ease::Ease;
pub use mask::RevealMask;
pub use scheduler::{
    AnimPhase, AnimationScheduler, AnimationState, FrameClock, Pixelation, VisualState, pixel_step,
};
pub use spec::{AnimEffect, RevealFrom, Timing, parse_anim};
