//! The full analysis pipeline.
//!
//! raw input → date phrase (if the input is a date) → normalize → L1 →
//! engine → classification + fractal unfolding → [`AnalysisResult`].
//!
//! Failures come back as [`EncoderError::NoLetters`] or
//! [`EncoderError::OutOfRange`]; callers render them as a neutral
//! "no result" state via [`EncoderError::user_message`].

use crate::alphabet::{encode, first_letter_value};
use crate::classify::{
    classify_initial, cluster_by_w, fii, fii_bar, q_bar, q_total, resonance_pair,
    resonance_space, Cluster, FiiCategory, InitialImpulse, ResonancePair, ResonanceSpace,
};
use crate::config::EncoderConfig;
use crate::date::parse_date_phrase;
use crate::error::{EncoderError, Result};
use crate::fractal::{unfold, FractalPattern};
use crate::index::{Autopick, LibraryIndex};
use crate::metrics::{Encoding, Metrics};
use crate::report::round3;
use serde::Serialize;
use tracing::debug;

/// Appended to the cluster guidance for strongly negative FII.
pub const DESTABILIZATION_WARNING: &str =
    "Повышенная дестабилизация поля — использовать с осторожностью.";

/// Service code used when no library neighborhood matches a profile.
pub const PROFILE_FALLBACK_L1: u32 = 1000;

/// Maximum number of valid tokens analysed by [`analyze_phrase`].
pub const PHRASE_LIMIT: usize = 5000;

/// How a result was produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AnalysisMode {
    /// Full pipeline from a word or date.
    Word,
    /// Built from given metrics; L1/L2C are service codes only.
    Profile { autopick: Option<Autopick> },
}

/// One computed report. Ephemeral; see [`crate::report`] for export.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub input: String,
    /// The date phrase when the input was a date, else the input itself.
    pub phrase_used: String,
    pub normalized: String,
    pub l1: u32,
    pub l2c: u32,
    pub metrics: Metrics,
    pub q: f64,
    pub fii: f64,
    pub cluster: Cluster,
    pub resonance: ResonancePair,
    pub space: ResonanceSpace,
    /// `None` in profile mode.
    pub fractal: Option<FractalPattern>,
    pub first_letter: Option<char>,
    pub first_value: Option<u32>,
    pub impulse: InitialImpulse,
    /// Φ alignment supplied with a profile.
    pub phi_align: Option<f64>,
    pub mode: AnalysisMode,
}

impl AnalysisResult {
    pub fn fii_category(&self) -> FiiCategory {
        FiiCategory::from_fii(self.fii)
    }

    pub fn q_bar(&self) -> String {
        q_bar(self.q)
    }

    pub fn fii_bar(&self) -> String {
        fii_bar(self.fii)
    }

    /// Cluster guidance, with the destabilization warning when FII ≤ −6.
    pub fn guidance(&self) -> String {
        let mut text = self.cluster.guidance().to_string();
        if self.fii <= -6.0 {
            text.push(' ');
            text.push_str(DESTABILIZATION_WARNING);
        }
        text
    }

    pub fn is_profile(&self) -> bool {
        matches!(self.mode, AnalysisMode::Profile { .. })
    }
}

/// Run the full pipeline on one word, phrase or date.
///
/// # Examples
///
/// ```
/// use kryon_encoder::analysis::analyze_word;
/// use kryon_encoder::config::EncoderConfig;
///
/// let cfg = EncoderConfig::default();
/// let res = analyze_word("Гармония", &cfg).unwrap();
/// assert_eq!(res.normalized, "ГАРМОНИЯ");
/// assert!((0.0..=1.0).contains(&res.metrics.z));
/// assert!(analyze_word("42!", &cfg).is_err());
/// ```
pub fn analyze_word(raw: &str, config: &EncoderConfig) -> Result<AnalysisResult> {
    let phrase_used = match parse_date_phrase(raw) {
        Some((phrase, stamp)) => {
            debug!(%stamp, "input recognised as a date");
            phrase
        }
        None => raw.to_string(),
    };
    let (normalized, l1) = encode(&phrase_used)?;
    let enc = Encoding::compute(i64::from(l1), config)?;
    let m = enc.metrics;
    let q = q_total(m.z, m.c, m.hm);
    let fii = fii(m.z, q, m.c, m.hm);
    let first = first_letter_value(&normalized);

    Ok(AnalysisResult {
        input: raw.to_string(),
        phrase_used,
        l1: enc.l1,
        l2c: enc.l2c(),
        metrics: m,
        q,
        fii,
        cluster: cluster_by_w(m.w),
        resonance: resonance_pair(m.w, config.resonator_threshold),
        space: resonance_space(m.w),
        fractal: Some(unfold(i64::from(enc.l1), config)),
        first_letter: first.map(|(ch, _)| ch),
        first_value: first.map(|(_, v)| v),
        impulse: classify_initial(first.map(|(_, v)| v)),
        phi_align: None,
        mode: AnalysisMode::Word,
        normalized,
    })
}

/// An integral profile supplied directly as metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Profile {
    pub w: f64,
    pub c: f64,
    pub hm: f64,
    pub z: f64,
    pub phi: Option<f64>,
}

/// Build a result from given metrics without L1 unfolding.
///
/// Service codes come from the library's W-neighborhood when `index` has
/// one, else L1 = 1000 and L2C = round(W·1000).
pub fn analyze_profile(
    label: &str,
    profile: Profile,
    index: Option<&LibraryIndex>,
    config: &EncoderConfig,
) -> AnalysisResult {
    let autopick = index.and_then(|idx| idx.autopick(profile.w));
    let (l1, l2c) = match &autopick {
        Some(pick) => (pick.l1, pick.l2c),
        None => {
            let synth = (profile.w * f64::from(PROFILE_FALLBACK_L1))
                .round_ties_even()
                .max(0.0);
            (PROFILE_FALLBACK_L1, synth as u32)
        }
    };
    debug!(l1, l2c, picked = autopick.is_some(), "profile service codes");

    let q = q_total(profile.z, profile.c, profile.hm);
    let fii = fii(profile.z, q, profile.c, profile.hm);
    AnalysisResult {
        input: label.to_string(),
        phrase_used: label.to_string(),
        normalized: label.to_string(),
        l1,
        l2c,
        metrics: Metrics {
            w: profile.w,
            c: profile.c,
            hm: profile.hm,
            z: profile.z,
        },
        q,
        fii,
        cluster: cluster_by_w(profile.w),
        resonance: resonance_pair(profile.w, config.resonator_threshold),
        space: resonance_space(profile.w),
        fractal: None,
        first_letter: None,
        first_value: None,
        impulse: classify_initial(None),
        phi_align: profile.phi,
        mode: AnalysisMode::Profile { autopick },
    }
}

/// One row of a phrase analysis; metrics rounded to 3 decimals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhraseItem {
    pub word: String,
    pub phrase_used: String,
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
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PhraseAnalysis {
    pub words: Vec<PhraseItem>,
    /// Set once the token limit was reached.
    pub truncated: bool,
    pub mean_w: Option<f64>,
    pub mean_z: Option<f64>,
}

fn split_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
}

/// Analyse every whitespace, `,` or `;` separated token. Tokens without a
/// result are skipped; at most [`PHRASE_LIMIT`] valid tokens are kept.
pub fn analyze_phrase(text: &str, config: &EncoderConfig) -> PhraseAnalysis {
    let mut words = Vec::new();
    for token in split_tokens(text) {
        if words.len() >= PHRASE_LIMIT {
            break;
        }
        match analyze_word(token, config) {
            Ok(res) => words.push(PhraseItem {
                word: res.normalized,
                phrase_used: res.phrase_used,
                l1: res.l1,
                l2c: res.l2c,
                w: round3(res.metrics.w),
                c: round3(res.metrics.c),
                hm: round3(res.metrics.hm),
                z: round3(res.metrics.z),
            }),
            Err(err) => debug!(token, "token skipped: {err}"),
        }
    }

    let mean = |f: fn(&PhraseItem) -> f64| {
        (!words.is_empty()).then(|| words.iter().map(f).sum::<f64>() / words.len() as f64)
    };
    PhraseAnalysis {
        truncated: words.len() >= PHRASE_LIMIT,
        mean_w: mean(|i| i.w),
        mean_z: mean(|i| i.z),
        words,
    }
}

/// Convenience for callers that only need the error kind.
pub fn is_no_result(err: &EncoderError) -> bool {
    matches!(
        err,
        EncoderError::NoLetters | EncoderError::OutOfRange { .. } | EncoderError::DivisionUndefined
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::MAX_STEPS;

    #[test]
    fn date_input_uses_phrase() {
        let cfg = EncoderConfig::default();
        let res = analyze_word("21.06.1992", &cfg).unwrap();
        assert_ne!(res.phrase_used, "21.06.1992");
        assert!(!res.normalized.is_empty());
        assert_eq!(res.input, "21.06.1992");
    }

    #[test]
    fn word_result_is_complete() {
        let cfg = EncoderConfig::default();
        let res = analyze_word("мир", &cfg).unwrap();
        // М14 И10 Р18
        assert_eq!(res.l1, 42);
        assert_eq!(res.first_letter, Some('М'));
        assert_eq!(res.first_value, Some(14));
        assert_eq!(res.fractal.as_ref().map(|f| f.w_values.len()), Some(MAX_STEPS));
        assert!(!res.is_profile());
        assert!((res.q - (res.metrics.z + res.metrics.c + res.metrics.hm) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_letters_is_an_error_not_a_panic() {
        let cfg = EncoderConfig::default();
        let err = analyze_word("  123 ", &cfg).unwrap_err();
        assert!(matches!(err, EncoderError::NoLetters));
        assert!(is_no_result(&err));
    }

    #[test]
    fn guidance_warns_on_destructive_fii() {
        let cfg = EncoderConfig::default();
        let mut res = analyze_word("мир", &cfg).unwrap();
        res.fii = -7.0;
        assert!(res.guidance().ends_with(DESTABILIZATION_WARNING));
        res.fii = -5.0;
        assert!(!res.guidance().contains(DESTABILIZATION_WARNING));
    }

    #[test]
    fn profile_without_library_synthesises_codes() {
        let cfg = EncoderConfig::default();
        let profile = Profile {
            w: 1.8125,
            c: 0.9,
            hm: 0.8,
            z: 0.7,
            phi: Some(0.5),
        };
        let res = analyze_profile("профиль", profile, None, &cfg);
        assert_eq!(res.l1, PROFILE_FALLBACK_L1);
        assert_eq!(res.l2c, 1812);
        assert!(res.fractal.is_none());
        assert_eq!(res.mode, AnalysisMode::Profile { autopick: None });
        assert_eq!(res.impulse, classify_initial(None));
        assert_eq!(res.cluster, Cluster::E);
    }

    #[test]
    fn phrase_skips_garbage_and_averages() {
        let cfg = EncoderConfig::default();
        let res = analyze_phrase("мир, 123; свет  ,,", &cfg);
        assert_eq!(res.words.len(), 2);
        assert!(!res.truncated);
        let mean_w = (res.words[0].w + res.words[1].w) / 2.0;
        assert_eq!(res.mean_w, Some(mean_w));
        assert!(analyze_phrase(" ;; ", &cfg).mean_z.is_none());
    }
}
