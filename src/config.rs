//! Live-tunable encoder configuration.
//!
//! Changing `sigma_Z` or `resonator_threshold` changes the output of the
//! metrics and resonance classification for identical input. Stored entries
//! are not stamped with the configuration they were computed under; a
//! library recomputed under one configuration and read under another may
//! carry different Z values than a fresh analysis would.

use crate::error::{EncoderError, Result};
use crate::store::atomic_write;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Encoder name written into report metadata.
pub const ENCODER_NAME: &str = "Kryon-33";
/// Column contract / encoder version.
pub const ENCODER_VERSION: &str = "v1.2";
/// Formula revision.
pub const CALC_VERSION: &str = "calc@2025-11-05";

pub const DEFAULT_SIGMA_Z: f64 = 0.80;
pub const DEFAULT_RESONATOR_THRESHOLD: f64 = 0.75;

fn default_sigma_z() -> f64 {
    DEFAULT_SIGMA_Z
}

fn default_resonator_threshold() -> f64 {
    DEFAULT_RESONATOR_THRESHOLD
}

/// Advisory cluster bounds. Not consulted by the numeric core.
pub fn default_cluster_bounds() -> BTreeMap<String, [f64; 2]> {
    [
        ("phi", [1.00, 1.60]),
        ("e", [1.60, 2.70]),
        ("e-pi", [2.70, 3.20]),
        ("pi", [3.20, 99.00]),
        ("rt2", [1.214, 1.614]),
    ]
    .into_iter()
    .map(|(name, range)| (name.to_string(), range))
    .collect()
}

/// Encoder configuration as stored in `config.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Gaussian width of the Z bell centred at W = 2.
    #[serde(rename = "sigma_Z", default = "default_sigma_z")]
    pub sigma_z: f64,
    /// Minimum pair strength for a named resonance pair.
    #[serde(default = "default_resonator_threshold")]
    pub resonator_threshold: f64,
    #[serde(default = "default_cluster_bounds")]
    pub cluster_bounds: BTreeMap<String, [f64; 2]>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            sigma_z: DEFAULT_SIGMA_Z,
            resonator_threshold: DEFAULT_RESONATOR_THRESHOLD,
            cluster_bounds: default_cluster_bounds(),
        }
    }
}

impl EncoderConfig {
    /// Copy with new tunables; `bounds` replaces the advisory bounds when given.
    pub fn with_values(
        &self,
        sigma_z: f64,
        resonator_threshold: f64,
        bounds: Option<BTreeMap<String, [f64; 2]>>,
    ) -> Result<Self> {
        let cfg = EncoderConfig {
            sigma_z,
            resonator_threshold,
            cluster_bounds: bounds.unwrap_or_else(|| self.cluster_bounds.clone()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// `sigma_Z` must be finite and positive, the threshold finite.
    pub fn validate(&self) -> Result<()> {
        check_sigma(self.sigma_z)?;
        if !self.resonator_threshold.is_finite() {
            return Err(EncoderError::InvalidConfig(format!(
                "resonator_threshold must be finite, got {}",
                self.resonator_threshold
            )));
        }
        Ok(())
    }

    /// Read a config file. Keys absent from the file take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        let cfg: EncoderConfig = serde_json::from_slice(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`EncoderConfig::load`], falling back to defaults on any failure,
    /// including a file that parses but holds out-of-domain values.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    warn!(path = %path.display(), "config unreadable, using defaults: {err}");
                }
                Self::default()
            }
        }
    }

    /// Write pretty JSON, replacing the file atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        atomic_write(path.as_ref(), &json)
    }
}

pub(crate) fn check_sigma(sigma_z: f64) -> Result<()> {
    if sigma_z.is_finite() && sigma_z > 0.0 {
        Ok(())
    } else {
        Err(EncoderError::InvalidConfig(format!(
            "sigma_Z must be a finite positive number, got {sigma_z}"
        )))
    }
}
