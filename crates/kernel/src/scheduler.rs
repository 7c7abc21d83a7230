use globeview_common::{FrameRequest, MotionConfig, Orientation};

use crate::animation::AnimationState;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler already started")]
    AlreadyStarted,
    #[error("scheduler was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Running,
    Cancelled,
}

/// Drives [`AnimationState`] from host frame callbacks.
///
/// The host hands out one [`FrameRequest`] token per scheduled callback. The
/// scheduler remembers the single pending token and ticks only when that
/// exact token fires, so a stale or duplicated callback never advances the
/// state twice.
#[derive(Debug)]
pub struct AnimationScheduler {
    state: AnimationState,
    motion: MotionConfig,
    star_rotation: f64,
    phase: SchedulerPhase,
    pending: Option<FrameRequest>,
}

impl AnimationScheduler {
    pub fn new(motion: MotionConfig, star_rotation: f64) -> Self {
        Self {
            state: AnimationState::new(),
            motion,
            star_rotation,
            phase: SchedulerPhase::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Begin ticking; `first` is the host token for the first frame.
    pub fn start(&mut self, first: FrameRequest) -> Result<(), SchedulerError> {
        match self.phase {
            SchedulerPhase::Idle => {
                self.phase = SchedulerPhase::Running;
                self.pending = Some(first);
                tracing::debug!(frame = first.0, "animation scheduler started");
                Ok(())
            }
            SchedulerPhase::Running => Err(SchedulerError::AlreadyStarted),
            SchedulerPhase::Cancelled => Err(SchedulerError::Cancelled),
        }
    }

    /// Register the token for the next frame after a tick has run.
    pub fn rearm(&mut self, next: FrameRequest) -> Result<(), SchedulerError> {
        if self.phase != SchedulerPhase::Running {
            return Err(SchedulerError::Cancelled);
        }
        self.pending = Some(next);
        Ok(())
    }

    /// Run one tick if `frame` is the pending token.
    ///
    /// Returns the new state, or `None` when the callback is stale or the
    /// scheduler is not running. The caller renders once per `Some` and then
    /// calls [`AnimationScheduler::rearm`].
    pub fn on_frame(&mut self, frame: FrameRequest, target: Orientation) -> Option<&AnimationState> {
        if self.phase != SchedulerPhase::Running || self.pending != Some(frame) {
            tracing::trace!(frame = frame.0, phase = ?self.phase, "frame ignored");
            return None;
        }
        self.pending = None;
        self.state = self.state.step(target, &self.motion, self.star_rotation);
        Some(&self.state)
    }

    /// Stop for good. Returns the outstanding token so the host callback can
    /// be released. Cancelling twice returns `None` the second time.
    pub fn cancel(&mut self) -> Option<FrameRequest> {
        if self.phase == SchedulerPhase::Cancelled {
            return None;
        }
        self.phase = SchedulerPhase::Cancelled;
        let pending = self.pending.take();
        tracing::debug!(tick = self.state.tick, ?pending, "animation scheduler cancelled");
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{EngineConfig, QualityPreset};

    fn scheduler() -> AnimationScheduler {
        let cfg = EngineConfig::preset(QualityPreset::Detailed);
        AnimationScheduler::new(cfg.motion, cfg.stars.rotation_speed)
    }

    #[test]
    fn ticks_only_on_pending_token() {
        let mut s = scheduler();
        assert!(s.on_frame(FrameRequest(1), Orientation::ZERO).is_none());
        s.start(FrameRequest(1)).unwrap();
        assert!(s.on_frame(FrameRequest(7), Orientation::ZERO).is_none());
        assert_eq!(s.on_frame(FrameRequest(1), Orientation::ZERO).map(|st| st.tick), Some(1));
        // Duplicate delivery of the same token is ignored.
        assert!(s.on_frame(FrameRequest(1), Orientation::ZERO).is_none());
        s.rearm(FrameRequest(2)).unwrap();
        assert_eq!(s.on_frame(FrameRequest(2), Orientation::ZERO).map(|st| st.tick), Some(2));
    }

    #[test]
    fn cancel_stops_ticks_and_releases_token() {
        let mut s = scheduler();
        s.start(FrameRequest(10)).unwrap();
        assert_eq!(s.cancel(), Some(FrameRequest(10)));
        assert_eq!(s.phase(), SchedulerPhase::Cancelled);
        assert!(s.on_frame(FrameRequest(10), Orientation::ZERO).is_none());
        assert_eq!(s.state().tick, 0);
        assert_eq!(s.cancel(), None);
        assert_eq!(s.rearm(FrameRequest(11)), Err(SchedulerError::Cancelled));
        assert_eq!(s.start(FrameRequest(12)), Err(SchedulerError::Cancelled));
    }

    #[test]
    fn cancel_between_frames_has_no_token() {
        let mut s = scheduler();
        s.start(FrameRequest(1)).unwrap();
        s.on_frame(FrameRequest(1), Orientation::ZERO);
        assert_eq!(s.cancel(), None);
    }

    #[test]
    fn double_start_is_rejected() {
        let mut s = scheduler();
        s.start(FrameRequest(1)).unwrap();
        assert_eq!(s.start(FrameRequest(2)), Err(SchedulerError::AlreadyStarted));
        assert_eq!(s.pending(), Some(FrameRequest(1)));
    }
}
