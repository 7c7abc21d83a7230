use serde::{Deserialize, Serialize};

use crate::config::Color;

/// Classification bucket for an entity's 0-100 metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Mid,
    High,
}

impl Tier {
    pub const HIGH_THRESHOLD: f64 = 70.0;
    pub const MID_THRESHOLD: f64 = 50.0;

    /// `metric >= 70` is High, `50 <= metric < 70` is Mid, everything else
    /// (including NaN) is Low.
    pub fn classify(metric: f64) -> Self {
        if metric >= Self::HIGH_THRESHOLD {
            Tier::High
        } else if metric >= Self::MID_THRESHOLD {
            Tier::Mid
        } else {
            Tier::Low
        }
    }

    /// Marker color for this tier. Every marker layer uses this palette.
    pub fn color(self) -> Color {
        match self {
            Tier::High => Color::hex(0x22c55e),
            Tier::Mid => Color::hex(0xeab308),
            Tier::Low => Color::hex(0xef4444),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Mid => "mid",
            Tier::Low => "low",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(Tier::classify(70.0), Tier::High);
        assert_eq!(Tier::classify(69.999), Tier::Mid);
        assert_eq!(Tier::classify(50.0), Tier::Mid);
        assert_eq!(Tier::classify(49.999), Tier::Low);
    }

    #[test]
    fn extremes_and_nan() {
        assert_eq!(Tier::classify(100.0), Tier::High);
        assert_eq!(Tier::classify(0.0), Tier::Low);
        assert_eq!(Tier::classify(-5.0), Tier::Low);
        assert_eq!(Tier::classify(f64::NAN), Tier::Low);
    }

    #[test]
    fn known_entities() {
        assert_eq!(Tier::classify(68.0), Tier::Mid);
        assert_eq!(Tier::classify(78.0), Tier::High);
    }

    #[test]
    fn palette_is_distinct() {
        assert_ne!(Tier::High.color(), Tier::Mid.color());
        assert_ne!(Tier::Mid.color(), Tier::Low.color());
        assert_eq!(Tier::High.color().to_rgba8(1.0), [0x22, 0xc5, 0x5e, 0xff]);
    }
}
