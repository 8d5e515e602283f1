//! Encoding engine: L1 → L2C and the scalar metrics W, C, Hm, Z.
//!
//! - L2C: code of L1's spelled-out words with spaces and hyphens removed
//! - W = L2C / L1
//! - C = cos²(π·|L2C − L1| / (2·(L2C + L1)))
//! - Hm = 1 − min over harmonic targets of |W − t| / t, clamped to [0, 1]
//! - Z = C · Hm · exp(−((W − 2)/σ)²), clamped to [0, 1]

use crate::alphabet::{code_of, normalize};
use crate::config::{check_sigma, EncoderConfig};
use crate::error::{EncoderError, Result};
use crate::speller::{spell, CODE_MAX};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Harmonic ratios rewarded by Hm. The closest one wins.
pub const HARMONIC_TARGETS: [f64; 6] = [1.0, 1.25, 1.33, 1.5, 2.0, 3.0];

/// Centre of the Z bell.
pub const Z_CENTER: f64 = 2.0;

/// The spelled-out second-level code of an L1 value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecondLevel {
    pub l2c: u32,
    /// Spelled words, space separated.
    pub words: String,
    /// Words glued together and normalized; this is what L2C sums over.
    pub glued: String,
}

/// Spell `l1` and encode the glued words.
///
/// Fails with [`EncoderError::OutOfRange`] outside `0..=999_999`.
pub fn l2c_from_l1(l1: i64) -> Result<SecondLevel> {
    if l1 < 0 || l1 > i64::from(CODE_MAX) {
        return Err(EncoderError::OutOfRange { l1 });
    }
    let words = spell(l1 as u32).ok_or(EncoderError::OutOfRange { l1 })?;
    let glued: String = words
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let glued = normalize(&glued);
    let l2c = code_of(&glued);
    Ok(SecondLevel { l2c, words, glued })
}

/// The four scalar metrics of an (L1, L2C) pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub w: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "Hm")]
    pub hm: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Harmonic fit of W against [`HARMONIC_TARGETS`].
pub fn harmonic_fit(w: f64) -> f64 {
    let closest = HARMONIC_TARGETS
        .iter()
        .map(|t| (w - t).abs() / t)
        .fold(f64::INFINITY, f64::min);
    clamp01(1.0 - closest)
}

/// Coherence of two codes: 1 when equal, falling towards 0 as they diverge.
pub fn coherence(l1: u32, l2c: u32) -> f64 {
    let (a, b) = (f64::from(l1), f64::from(l2c));
    let ratio = (b - a).abs() / (b + a);
    (PI / 2.0 * ratio).cos().powi(2)
}

/// Compute W, C, Hm and Z for a code pair under `sigma_z`.
///
/// A zero, negative or non-finite `sigma_z` is rejected rather than
/// collapsing the bell into NaN.
pub fn metrics(l1: u32, l2c: u32, sigma_z: f64) -> Result<Metrics> {
    check_sigma(sigma_z)?;
    if l1 == 0 {
        return Err(EncoderError::DivisionUndefined);
    }
    let w = f64::from(l2c) / f64::from(l1);
    let c = coherence(l1, l2c);
    let hm = harmonic_fit(w);
    let bell = (-((w - Z_CENTER) / sigma_z).powi(2)).exp();
    let z = clamp01(c * hm * bell);
    Ok(Metrics { w, c, hm, z })
}

/// Full encoding of one L1 value.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoding {
    pub l1: u32,
    pub second: SecondLevel,
    pub metrics: Metrics,
}

impl Encoding {
    /// Run the engine for `l1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kryon_encoder::config::EncoderConfig;
    /// use kryon_encoder::metrics::Encoding;
    ///
    /// let cfg = EncoderConfig::default();
    /// let enc = Encoding::compute(100, &cfg).unwrap();
    /// // СТО = 19 + 20 + 16
    /// assert_eq!(enc.l2c(), 55);
    /// assert!((enc.metrics.w - 0.55).abs() < 1e-12);
    /// assert!(Encoding::compute(1_000_000, &cfg).is_err());
    /// ```
    pub fn compute(l1: i64, config: &EncoderConfig) -> Result<Self> {
        let second = l2c_from_l1(l1)?;
        let l1 = l1 as u32;
        let metrics = metrics(l1, second.l2c, config.sigma_z)?;
        Ok(Encoding {
            l1,
            second,
            metrics,
        })
    }

    pub fn l2c(&self) -> u32 {
        self.second.l2c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2c_of_small_values() {
        // ОДИН = 16 + 5 + 10 + 15
        assert_eq!(l2c_from_l1(1).unwrap().l2c, 46);
        // НОЛЬ = 15 + 16 + 13 + 28
        assert_eq!(l2c_from_l1(0).unwrap().l2c, 72);
        let second = l2c_from_l1(1001).unwrap();
        assert_eq!(second.words, "ОДНА ТЫСЯЧА ОДИН");
        assert_eq!(second.glued, "ОДНАТЫСЯЧАОДИН");
    }

    #[test]
    fn range_boundaries() {
        assert!(l2c_from_l1(999_999).is_ok());
        assert!(matches!(
            l2c_from_l1(1_000_000),
            Err(EncoderError::OutOfRange { l1: 1_000_000 })
        ));
        assert!(matches!(l2c_from_l1(-1), Err(EncoderError::OutOfRange { l1: -1 })));
    }

    #[test]
    fn zero_l1_is_division_undefined() {
        let cfg = EncoderConfig::default();
        assert!(matches!(
            Encoding::compute(0, &cfg),
            Err(EncoderError::DivisionUndefined)
        ));
    }

    #[test]
    fn equal_codes_are_perfectly_coherent() {
        assert!((coherence(50, 50) - 1.0).abs() < 1e-12);
        assert!(coherence(1, 1000) < 0.01);
    }

    #[test]
    fn harmonic_fit_picks_closest_target() {
        assert!((harmonic_fit(2.0) - 1.0).abs() < 1e-12);
        assert!((harmonic_fit(1.5) - 1.0).abs() < 1e-12);
        // 2.2 is nearest to 2 → 1 − 0.1
        assert!((harmonic_fit(2.2) - 0.9).abs() < 1e-9);
        assert_eq!(harmonic_fit(100.0), 0.0);
    }

    #[test]
    fn z_peaks_at_w_two() {
        let m = metrics(50, 100, 0.8).unwrap();
        assert!((m.w - 2.0).abs() < 1e-12);
        let expected_c = (PI / 2.0 * (50.0 / 150.0)).cos().powi(2);
        assert!((m.c - expected_c).abs() < 1e-12);
        assert!((m.hm - 1.0).abs() < 1e-12);
        assert!((m.z - expected_c).abs() < 1e-12);
    }

    #[test]
    fn degenerate_sigma_is_an_error() {
        for sigma in [0.0, -0.8, f64::NAN] {
            assert!(matches!(
                metrics(50, 100, sigma),
                Err(EncoderError::InvalidConfig(_))
            ));
        }
        // W = 2 with a tiny sigma still yields a number
        assert!(metrics(50, 100, 1e-9).unwrap().z.is_finite());
    }

    #[test]
    fn sigma_changes_z_but_not_w() {
        let narrow = metrics(40, 100, 0.2).unwrap();
        let wide = metrics(40, 100, 2.0).unwrap();
        assert_eq!(narrow.w, wide.w);
        assert_eq!(narrow.c, wide.c);
        assert!(narrow.z < wide.z);
    }
}
