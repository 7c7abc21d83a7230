use globeview_common::{Extent, MotionConfig, Orientation};

use crate::pointer::normalize;

/// Owns the rotation target written by pointer input.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionController {
    target: Orientation,
    yaw_sensitivity: f64,
    pitch_sensitivity: f64,
}

impl InteractionController {
    pub fn new(motion: &MotionConfig) -> Self {
        Self {
            target: Orientation::ZERO,
            yaw_sensitivity: motion.yaw_sensitivity,
            pitch_sensitivity: motion.pitch_sensitivity,
        }
    }

    pub fn target(&self) -> Orientation {
        self.target
    }

    /// Update the target from a pointer position. Returns whether the event
    /// was accepted.
    pub fn pointer_moved(&mut self, x: f64, y: f64, viewport: Extent) -> bool {
        let Some(p) = normalize(x, y, viewport) else {
            tracing::debug!(x, y, ?viewport, "pointer event dropped");
            return false;
        };
        self.target = Orientation {
            yaw: p.x * self.yaw_sensitivity,
            pitch: p.y * self.pitch_sensitivity,
        };
        true
    }
}
