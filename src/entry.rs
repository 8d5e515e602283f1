//! Library records.
//!
//! An [`Entry`]'s derived fields (`l1`, `l2c`, `w`, `C`, `Hm`, `Z`) are a
//! pure function of `word` and the active configuration. They are only ever
//! set as a block by [`Entry::recompute`]; values read from files are
//! untrusted and may be `None` when a cell could not be parsed.

use crate::alphabet::encode;
use crate::config::EncoderConfig;
use crate::metrics::Encoding;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed column contract of the persisted collection.
pub const LIB_COLS: [&str; 13] = [
    "word", "sphere", "tone", "allowed", "field", "role", "notes", "l1", "l2c", "w", "C", "Hm",
    "Z",
];

pub const DEFAULT_SPHERE: &str = "прочее";
pub const DEFAULT_TONE: &str = "neutral";

/// One library row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub word: String,
    /// Semicolon-delimited tag set.
    pub sphere: String,
    pub tone: String,
    pub allowed: bool,
    pub field: String,
    pub role: String,
    /// Pipe-joined notes from merged duplicates.
    pub notes: String,
    pub l1: Option<u32>,
    pub l2c: Option<u32>,
    pub w: Option<f64>,
    #[serde(rename = "C")]
    pub c: Option<f64>,
    #[serde(rename = "Hm")]
    pub hm: Option<f64>,
    #[serde(rename = "Z")]
    pub z: Option<f64>,
}

/// A numeric cell that could not be read; the row contributes nothing on
/// that axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSkip {
    pub row: usize,
    pub column: &'static str,
    pub raw: String,
}

/// Lenient boolean: true only for `true`, `1`, `yes`, `y`, `да`
/// (case-insensitive, trimmed).
pub fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "да"
    )
}

/// Empty for missing values and for the literal `nan` left by spreadsheet
/// exports.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

impl Entry {
    /// New entry with metadata only; derived fields are computed immediately.
    pub fn new(word: &str, sphere: &str, tone: &str, config: &EncoderConfig) -> Self {
        let mut entry = Entry {
            word: word.to_string(),
            sphere: sphere.to_string(),
            tone: tone.to_string(),
            allowed: true,
            field: String::new(),
            role: String::new(),
            notes: String::new(),
            l1: None,
            l2c: None,
            w: None,
            c: None,
            hm: None,
            z: None,
        };
        entry.recompute(config);
        entry
    }

    /// Overwrite every derived field from `word`.
    ///
    /// Words without letters or whose code is out of range end up with all
    /// derived fields `None`.
    pub fn recompute(&mut self, config: &EncoderConfig) {
        self.clear_derived();
        let Ok((_, l1)) = encode(&self.word) else {
            debug!(word = %self.word, "no letters, derived fields cleared");
            return;
        };
        match Encoding::compute(i64::from(l1), config) {
            Ok(enc) => {
                self.l1 = Some(enc.l1);
                self.l2c = Some(enc.l2c());
                self.w = Some(enc.metrics.w);
                self.c = Some(enc.metrics.c);
                self.hm = Some(enc.metrics.hm);
                self.z = Some(enc.metrics.z);
            }
            Err(err) => debug!(word = %self.word, "derived fields cleared: {err}"),
        }
    }

    fn clear_derived(&mut self) {
        self.l1 = None;
        self.l2c = None;
        self.w = None;
        self.c = None;
        self.hm = None;
        self.z = None;
    }

    /// Sphere tags, trimmed, empties dropped.
    pub fn spheres(&self) -> impl Iterator<Item = &str> {
        self.sphere.split(';').map(str::trim).filter(|s| !s.is_empty())
    }

    /// The (w, C, Z) point, if all three are finite.
    pub fn metric_point(&self) -> Option<[f64; 3]> {
        match (self.w, self.c, self.z) {
            (Some(w), Some(c), Some(z)) if w.is_finite() && c.is_finite() && z.is_finite() => {
                Some([w, c, z])
            }
            _ => None,
        }
    }

    /// Build an entry from a header-keyed row. Missing columns read as empty;
    /// unparseable numeric cells become `None` and are reported.
    pub fn from_row<'a, F>(row: usize, get: F) -> (Entry, Vec<ParseSkip>)
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let text = |col: &str| get(col).map(clean_text).unwrap_or_default();
        let mut skips = Vec::new();

        let mut int_cell = |col: &'static str| -> Option<u32> {
            let raw = get(col)?.trim();
            if raw.is_empty() {
                return None;
            }
            // tolerate float-formatted integers such as "123.0"
            let parsed = raw
                .parse::<u32>()
                .ok()
                .or_else(|| {
                    raw.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
                        .map(|v| v as u32)
                });
            if parsed.is_none() {
                skips.push(ParseSkip {
                    row,
                    column: col,
                    raw: raw.to_string(),
                });
            }
            parsed
        };
        let l1 = int_cell("l1");
        let l2c = int_cell("l2c");

        let mut float_cell = |col: &'static str| -> Option<f64> {
            let raw = get(col)?.trim();
            if raw.is_empty() {
                return None;
            }
            let parsed = raw.parse::<f64>().ok().filter(|v| v.is_finite());
            if parsed.is_none() {
                skips.push(ParseSkip {
                    row,
                    column: col,
                    raw: raw.to_string(),
                });
            }
            parsed
        };
        let w = float_cell("w");
        let c = float_cell("C");
        let hm = float_cell("Hm");
        let z = float_cell("Z");

        let allowed = get("allowed").map(parse_bool).unwrap_or(true);

        let entry = Entry {
            word: text("word").to_uppercase(),
            sphere: text("sphere"),
            tone: text("tone"),
            allowed,
            field: text("field"),
            role: text("role"),
            notes: text("notes"),
            l1,
            l2c,
            w,
            c,
            hm,
            z,
        };
        (entry, skips)
    }

    /// Cells in [`LIB_COLS`] order.
    pub fn to_row(&self) -> [String; 13] {
        let int = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();
        let float = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        [
            self.word.clone(),
            self.sphere.clone(),
            self.tone.clone(),
            self.allowed.to_string(),
            self.field.clone(),
            self.role.clone(),
            self.notes.clone(),
            int(self.l1),
            int(self.l2c),
            float(self.w),
            float(self.c),
            float(self.hm),
            float(self.z),
        ]
    }
}
