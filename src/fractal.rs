//! Fractal unfolding: iterate L1 → L2C → L1 … and read the W trajectory.
//!
//! Each step feeds the previous L2C back in as L1. The sequence stops after
//! [`MAX_STEPS`] values or at the first code the engine rejects; an early stop
//! is a termination condition, not an error.

use crate::config::EncoderConfig;
use crate::metrics::Encoding;
use serde::{Deserialize, Serialize};

/// Maximum number of W values produced.
pub const MAX_STEPS: usize = 12;

pub const INHALE: char = '●';
pub const EXHALE: char = '○';
pub const TERMINAL: char = '→';

/// Interpretation of the inhale/exhale ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unfolding {
    /// ratio > 1.05
    Expands,
    /// ratio < 0.95
    Stabilizes,
    Equilibrium,
    /// The first step was already rejected.
    OutOfRange,
}

impl Unfolding {
    fn from_ratio(ratio: f64) -> Self {
        if ratio > 1.05 {
            Unfolding::Expands
        } else if ratio < 0.95 {
            Unfolding::Stabilizes
        } else {
            Unfolding::Equilibrium
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Unfolding::Expands => "expands",
            Unfolding::Stabilizes => "stabilizes",
            Unfolding::Equilibrium => "equilibrium",
            Unfolding::OutOfRange => "out_of_range",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Unfolding::Expands => "слово раскрывается",
            Unfolding::Stabilizes => "слово стабилизирует поле",
            Unfolding::Equilibrium => "слово в равновесии",
            Unfolding::OutOfRange => "out_of_range",
        }
    }
}

/// Result of [`unfold`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalPattern {
    /// One symbol per consecutive pair plus the terminal arrow; empty for the
    /// out-of-range sentinel.
    pub pattern: String,
    pub inhale: usize,
    pub exhale: usize,
    /// inhale / exhale; +∞ when only inhales, 1.0 for a single point,
    /// 0.0 for the sentinel.
    pub ratio: f64,
    pub interpretation: Unfolding,
    pub w_values: Vec<f64>,
}

impl FractalPattern {
    fn out_of_range() -> Self {
        FractalPattern {
            pattern: String::new(),
            inhale: 0,
            exhale: 0,
            ratio: 0.0,
            interpretation: Unfolding::OutOfRange,
            w_values: Vec::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.interpretation == Unfolding::OutOfRange
    }
}

/// W trajectory starting at `l1`.
pub fn w_sequence(l1: i64, config: &EncoderConfig) -> Vec<f64> {
    let mut w_values = Vec::with_capacity(MAX_STEPS);
    let mut current = l1;
    for _ in 0..MAX_STEPS {
        let Ok(step) = Encoding::compute(current, config) else {
            break;
        };
        w_values.push(step.metrics.w);
        current = i64::from(step.l2c());
    }
    w_values
}

/// Unfold `l1` and classify the breathing pattern of its W sequence.
///
/// # Examples
///
/// ```
/// use kryon_encoder::config::EncoderConfig;
/// use kryon_encoder::fractal::{unfold, MAX_STEPS};
///
/// let cfg = EncoderConfig::default();
/// let f = unfold(100, &cfg);
/// assert_eq!(f.w_values.len(), MAX_STEPS);
/// assert_eq!(f.inhale + f.exhale, MAX_STEPS - 1);
/// assert!(f.pattern.ends_with('→'));
///
/// assert!(unfold(-5, &cfg).is_sentinel());
/// ```
pub fn unfold(l1: i64, config: &EncoderConfig) -> FractalPattern {
    let w_values = w_sequence(l1, config);
    if w_values.is_empty() {
        return FractalPattern::out_of_range();
    }

    let mut pattern = String::with_capacity(w_values.len() * 3);
    let (mut inhale, mut exhale) = (0usize, 0usize);
    for pair in w_values.windows(2) {
        if pair[1] > pair[0] {
            pattern.push(INHALE);
            inhale += 1;
        } else {
            pattern.push(EXHALE);
            exhale += 1;
        }
    }
    pattern.push(TERMINAL);

    let ratio = if exhale == 0 {
        if inhale > 0 {
            f64::INFINITY
        } else {
            1.0
        }
    } else {
        inhale as f64 / exhale as f64
    };

    FractalPattern {
        pattern,
        inhale,
        exhale,
        ratio,
        interpretation: Unfolding::from_ratio(ratio),
        w_values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_length_for_in_range_start() {
        let cfg = EncoderConfig::default();
        for l1 in [1, 7, 55, 999, 12_345, 999_999] {
            let f = unfold(l1, &cfg);
            assert_eq!(f.w_values.len(), MAX_STEPS, "l1 = {l1}");
            assert_eq!(f.pattern.chars().count(), MAX_STEPS);
            assert_eq!(f.inhale + f.exhale, MAX_STEPS - 1);
        }
    }

    #[test]
    fn sentinel_for_rejected_start() {
        let cfg = EncoderConfig::default();
        for l1 in [-1, 0, 1_000_000] {
            let f = unfold(l1, &cfg);
            assert!(f.is_sentinel());
            assert!(f.pattern.is_empty());
            assert_eq!((f.inhale, f.exhale), (0, 0));
            assert_eq!(f.ratio, 0.0);
            assert_eq!(f.interpretation.tag(), "out_of_range");
        }
    }

    #[test]
    fn interpretation_thresholds() {
        assert_eq!(Unfolding::from_ratio(f64::INFINITY), Unfolding::Expands);
        assert_eq!(Unfolding::from_ratio(1.06), Unfolding::Expands);
        assert_eq!(Unfolding::from_ratio(1.05), Unfolding::Equilibrium);
        assert_eq!(Unfolding::from_ratio(1.0), Unfolding::Equilibrium);
        assert_eq!(Unfolding::from_ratio(0.95), Unfolding::Equilibrium);
        assert_eq!(Unfolding::from_ratio(0.5), Unfolding::Stabilizes);
    }

    #[test]
    fn ratio_matches_counts() {
        let cfg = EncoderConfig::default();
        let f = unfold(2024, &cfg);
        if f.exhale > 0 {
            assert_eq!(f.ratio, f.inhale as f64 / f.exhale as f64);
        } else {
            assert!(f.ratio.is_infinite());
        }
    }
}
