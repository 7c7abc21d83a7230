use globeview_common::{MotionConfig, Orientation, PulseConfig};
use serde::{Deserialize, Serialize};

/// Where the globe is pointing and where input wants it to point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    pub current: Orientation,
    pub target: Orientation,
}

impl RotationState {
    /// Largest per-axis distance between current and target.
    pub fn error(&self) -> f64 {
        let dy = (self.target.yaw - self.current.yaw).abs();
        let dp = (self.target.pitch - self.current.pitch).abs();
        dy.max(dp)
    }
}

/// Ring pulse for one marker at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseSample {
    pub scale: f64,
    pub opacity: f64,
}

/// `scale = 1 + s * amplitude`, `opacity = base + s * spread`, where
/// `s = sin(time * k + phase)`.
pub fn pulse(time: f64, phase: f64, cfg: &PulseConfig) -> PulseSample {
    let s = (time * cfg.frequency + phase).sin();
    PulseSample {
        scale: 1.0 + s * cfg.amplitude,
        opacity: cfg.base_opacity + s * cfg.opacity_spread,
    }
}

/// Everything that changes from one frame to the next.
///
/// Auto-rotation accumulates in `spin`, separate from the damped
/// `rotation.current`, so damping converges onto the input target exactly
/// while the globe keeps turning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub tick: u64,
    /// Seconds of animation time.
    pub time: f64,
    pub rotation: RotationState,
    /// Accumulated auto-rotation yaw.
    pub spin: f64,
    /// Star field yaw.
    pub star_yaw: f64,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One tick: advance the clock, damp toward `target`, add auto-rotation,
    /// turn the star field.
    pub fn step(&self, target: Orientation, motion: &MotionConfig, star_rotation: f64) -> Self {
        let d = motion.damping;
        let current = self.rotation.current;
        let next = Orientation {
            yaw: current.yaw + (target.yaw - current.yaw) * d,
            pitch: current.pitch + (target.pitch - current.pitch) * d,
        };
        Self {
            tick: self.tick + 1,
            time: self.time + motion.time_step,
            rotation: RotationState {
                current: next,
                target,
            },
            spin: self.spin + motion.auto_rotation,
            star_yaw: self.star_yaw + star_rotation,
        }
    }

    /// Rotation shared by the surface, the wireframe and the marker group.
    pub fn globe_orientation(&self) -> Orientation {
        Orientation {
            yaw: self.rotation.current.yaw + self.spin,
            pitch: self.rotation.current.pitch,
        }
    }

    pub fn pulse(&self, phase: f64, cfg: &PulseConfig) -> PulseSample {
        pulse(self.time, phase, cfg)
    }

    /// FNV-1a over the bit patterns of every field. Equal states hash equal.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: [u8; 8]| {
            for b in bytes {
                h ^= b as u64;
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(self.tick.to_le_bytes());
        for v in [
            self.time,
            self.rotation.current.yaw,
            self.rotation.current.pitch,
            self.rotation.target.yaw,
            self.rotation.target.pitch,
            self.spin,
            self.star_yaw,
        ] {
            mix(v.to_bits().to_le_bytes());
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globeview_common::{EngineConfig, QualityPreset};

    fn motion() -> MotionConfig {
        EngineConfig::preset(QualityPreset::Detailed).motion
    }

    fn pulse_cfg() -> PulseConfig {
        EngineConfig::preset(QualityPreset::Detailed).markers.pulse
    }

    #[test]
    fn damping_converges_geometrically() {
        let m = motion();
        let target = Orientation::new(0.5, -0.3);
        let mut s = AnimationState::new();
        let e0 = s.rotation.error().max(target.yaw.abs().max(target.pitch.abs()));
        for n in 1..=600u64 {
            s = s.step(target, &m, 0.0);
            let bound = e0 * (1.0 - m.damping).powi(n as i32);
            assert!(s.rotation.error() <= bound + 1e-12, "tick {n}");
        }
        assert!(s.rotation.error() < 1e-5);
        assert_eq!(s.rotation.target, target);
    }

    #[test]
    fn auto_rotation_is_unconditional() {
        let m = motion();
        let mut s = AnimationState::new();
        for _ in 0..100 {
            s = s.step(Orientation::ZERO, &m, 0.0001);
        }
        assert_eq!(s.tick, 100);
        assert!((s.spin - 0.3).abs() < 1e-9);
        assert!((s.globe_orientation().yaw - 0.3).abs() < 1e-9);
        assert!((s.time - 1.6).abs() < 1e-9);
        assert!((s.star_yaw - 0.01).abs() < 1e-12);
    }

    #[test]
    fn step_is_pure() {
        let m = motion();
        let s = AnimationState::new().step(Orientation::new(0.2, 0.1), &m, 0.0001);
        let a = s.step(Orientation::new(-0.4, 0.0), &m, 0.0001);
        let b = s.step(Orientation::new(-0.4, 0.0), &m, 0.0001);
        assert_eq!(a, b);
        assert_eq!(a.state_hash(), b.state_hash());
        assert_ne!(a.state_hash(), s.state_hash());
    }

    #[test]
    fn pulse_stays_within_bounds() {
        let cfg = pulse_cfg();
        let mut s = AnimationState::new();
        let m = motion();
        let (mut lo, mut hi) = (f64::MAX, f64::MIN);
        // One period is 2*pi/k seconds; cover it with margin.
        let ticks = (std::f64::consts::TAU / cfg.frequency / m.time_step).ceil() as usize + 2;
        for _ in 0..ticks {
            s = s.step(Orientation::ZERO, &m, 0.0);
            let p = s.pulse(1.0, &cfg);
            assert!(p.opacity >= 0.2 - 1e-12 && p.opacity <= 0.8 + 1e-12);
            assert!(p.scale >= 0.8 - 1e-12 && p.scale <= 1.2 + 1e-12);
            lo = lo.min(p.opacity);
            hi = hi.max(p.opacity);
        }
        assert!(lo < 0.21 && hi > 0.79, "{lo}..{hi}");
    }

    #[test]
    fn phases_desynchronize_rings() {
        let cfg = pulse_cfg();
        let m = motion();
        let mut s = AnimationState::new();
        for _ in 0..500 {
            s = s.step(Orientation::ZERO, &m, 0.0);
            let a = s.pulse(0.0, &cfg);
            let b = s.pulse(1.0, &cfg);
            assert_ne!(a.opacity, b.opacity, "tick {}", s.tick);
        }
    }
}
