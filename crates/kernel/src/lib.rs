//! Animation kernel: the per-tick state transition and the frame scheduler
//! that drives it.
//!
//! # Invariants
//! - [`AnimationState::step`] is pure: same state, target and config give the same result.
//! - Only the scheduler advances the state, at most once per accepted frame.
//! - After [`AnimationScheduler::cancel`] no further tick runs.

pub mod animation;
pub mod scheduler;

pub use animation::{AnimationState, PulseSample, RotationState, pulse};
pub use scheduler::{AnimationScheduler, SchedulerError, SchedulerPhase};
