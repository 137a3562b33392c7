use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ease-out curves mapping spin progress to rotation progress.
///
/// Every curve is non-decreasing on [0, 1] and maps 0 to 0 and 1 to 1, so a
/// spin always ends on its exact total rotation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Easing {
    Linear,
    CubicOut,
    #[default]
    QuartOut,
    /// Steepest start; coarse frame rates will skip early segments
    CircleOut,
}

impl Easing {
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let inv = 1.0 - t;
        match self {
            Self::Linear => t,
            Self::CubicOut => 1.0 - inv.powi(3),
            Self::QuartOut => 1.0 - inv.powi(4),
            Self::CircleOut => (1.0 - inv * inv).max(0.0).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ALL: [Easing; 4] = [Easing::Linear, Easing::CubicOut, Easing::QuartOut, Easing::CircleOut];

    #[test]
    fn test_endpoints_are_exact() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing}");
            assert_eq!(easing.apply(1.0), 1.0, "{easing}");
        }
    }

    #[test]
    fn test_monotonic() {
        for easing in ALL {
            let mut last = 0.0;
            for step in 0..=1000 {
                let value = easing.apply(step as f64 / 1000.0);
                assert!(value >= last, "{easing} decreased at step {step}");
                last = value;
            }
        }
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        assert_eq!(Easing::QuartOut.apply(-2.0), 0.0);
        assert_eq!(Easing::QuartOut.apply(7.5), 1.0);
        assert_eq!(Easing::CubicOut.apply(f64::NAN), 0.0);
    }

    #[test]
    fn test_ease_out_is_fast_then_slow() {
        let first_tenth = Easing::QuartOut.apply(0.1);
        let last_tenth = 1.0 - Easing::QuartOut.apply(0.9);
        assert!(first_tenth > last_tenth * 100.0);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Easing::from_str("circleout").unwrap(), Easing::CircleOut);
        assert_eq!(Easing::default().to_string(), "quartout");
    }
}
