//! JSON report export.

use crate::analysis::{AnalysisMode, AnalysisResult, PhraseAnalysis, PhraseItem};
use crate::config::{CALC_VERSION, ENCODER_NAME, ENCODER_VERSION};
use crate::error::Result;
use crate::index::{Axis, LibraryIndex, Neighbor, DEFAULT_NEIGHBORHOOD_EPS};
use crate::store::atomic_write;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;

/// Round to 3 decimals on the exact binary value of `x`, ties to even.
///
/// Goes through decimal formatting instead of scaling by 1000, so a value
/// such as 0.0005 (stored slightly above the half) rounds up.
pub fn round3(x: f64) -> f64 {
    format!("{x:.3}").parse().unwrap_or(x)
}

/// Fractal interpretation shown for profile-mode results.
pub const PROFILE_FRACTAL_NOTE: &str = "без L1-развёртки";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Meta {
    pub encoder: &'static str,
    pub version: &'static str,
    pub calc_version: &'static str,
    /// UTC, RFC 3339.
    pub generated_at: String,
    pub lang: &'static str,
}

impl Meta {
    pub fn now() -> Self {
        Meta {
            encoder: ENCODER_NAME,
            version: ENCODER_VERSION,
            calc_version: CALC_VERSION,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            lang: "ru",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportMetrics {
    #[serde(rename = "L1")]
    pub l1: u32,
    #[serde(rename = "L2C")]
    pub l2c: u32,
    #[serde(rename = "W")]
    pub w: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "Hm")]
    pub hm: f64,
    #[serde(rename = "Z")]
    pub z: f64,
    #[serde(rename = "Q_total")]
    pub q_total: f64,
    #[serde(rename = "FII")]
    pub fii: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResonanceBlock {
    pub code: String,
    pub en: String,
    pub ru: String,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FractalBlock {
    pub pattern: Option<String>,
    pub inhale: usize,
    pub exhale: usize,
    /// `None` when the ratio is infinite.
    #[serde(rename = "R")]
    pub ratio: Option<f64>,
    pub interpretation: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Related {
    #[serde(rename = "by_L1")]
    pub by_l1: Vec<String>,
    #[serde(rename = "by_L2C")]
    pub by_l2c: Vec<String>,
    pub near: Vec<Neighbor>,
    pub contrast: Vec<Neighbor>,
}

/// Caps for the related-word lists of a full report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelatedLimits {
    pub by_code: usize,
    pub near: usize,
    pub contrast: usize,
}

impl Default for RelatedLimits {
    fn default() -> Self {
        RelatedLimits {
            by_code: 500,
            near: 50,
            contrast: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub meta: Meta,
    pub input: String,
    pub phrase_used: String,
    pub metrics: ReportMetrics,
    pub cluster: &'static str,
    pub resonance_pair: ResonanceBlock,
    pub fractal: FractalBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Related>,
}

impl Report {
    pub fn new(res: &AnalysisResult) -> Self {
        let fractal = match &res.fractal {
            Some(f) => FractalBlock {
                pattern: Some(f.pattern.clone()),
                inhale: f.inhale,
                exhale: f.exhale,
                ratio: f.ratio.is_finite().then_some(f.ratio),
                interpretation: f.interpretation.describe().to_string(),
            },
            None => FractalBlock {
                pattern: None,
                inhale: 0,
                exhale: 0,
                ratio: Some(0.0),
                interpretation: PROFILE_FRACTAL_NOTE.to_string(),
            },
        };
        Report {
            meta: Meta::now(),
            input: res.input.clone(),
            phrase_used: res.phrase_used.clone(),
            metrics: ReportMetrics {
                l1: res.l1,
                l2c: res.l2c,
                w: round3(res.metrics.w),
                c: round3(res.metrics.c),
                hm: round3(res.metrics.hm),
                z: round3(res.metrics.z),
                q_total: round3(res.q),
                fii: round3(res.fii),
            },
            cluster: res.cluster.code(),
            resonance_pair: ResonanceBlock {
                code: res.resonance.code.clone(),
                en: res.resonance.en.clone(),
                ru: res.resonance.ru.clone(),
                value: round3(res.resonance.strength),
            },
            fractal,
            related: None,
        }
    }

    /// Report with related words from `index`. The L1 and L2C lists are
    /// looked up independently, so a word sharing both codes appears in
    /// both. Profile-mode results fall back to the W-neighborhood when a
    /// code list is empty.
    pub fn with_related(res: &AnalysisResult, index: &LibraryIndex, limits: RelatedLimits) -> Self {
        let current = &res.normalized;
        let by_l1 = index.lookup(res.l1, Axis::L1, current, limits.by_code);
        let by_l2c = index.lookup(res.l2c, Axis::L2C, current, limits.by_code);
        let m = res.metrics;
        let proximity =
            index.near_contrast([m.w, m.c, m.z], &res.normalized, limits.near, limits.contrast);

        let mut related = Related {
            by_l1,
            by_l2c,
            near: proximity.near,
            contrast: proximity.contrast,
        };
        if let AnalysisMode::Profile { autopick } = &res.mode {
            let eps = autopick
                .as_ref()
                .map(|p| p.eps)
                .unwrap_or(DEFAULT_NEIGHBORHOOD_EPS);
            let neighborhood = || index.w_neighborhood(m.w, eps, &res.normalized, limits.by_code);
            if related.by_l1.is_empty() {
                related.by_l1 = neighborhood();
            }
            if related.by_l2c.is_empty() {
                related.by_l2c = neighborhood();
            }
        }

        let mut report = Report::new(res);
        report.related = Some(related);
        report
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        atomic_write(path.as_ref(), self.to_json()?.as_bytes())
    }
}

/// Export document for a phrase analysis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhraseReport<'a> {
    pub meta: Meta,
    pub truncated: bool,
    pub words: &'a [PhraseItem],
}

impl<'a> PhraseReport<'a> {
    pub fn new(analysis: &'a PhraseAnalysis) -> Self {
        PhraseReport {
            meta: Meta::now(),
            truncated: analysis.truncated,
            words: &analysis.words,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
