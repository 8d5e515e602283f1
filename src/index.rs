//! Read-optimized lookup structures over a word collection.
//!
//! A [`LibraryIndex`] is built in one pass by [`LibraryIndex::rebuild`] and
//! is never patched after a bulk change; replace it with a fresh instance
//! instead. [`LibraryIndex::insert`] exists only for appending single words.
//!
//! It serves three kinds of queries:
//! - exact code matches on the L1 or L2C axis
//! - near / contrast words by Euclidean distance in (W, C, Z)
//! - W-neighborhoods, for profile-mode service codes

use crate::entry::Entry;
use crate::report::round3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Upper bound on distance for a near word.
pub const NEAR_MAX: f64 = 0.30;
/// Contrast words lie in (CONTRAST_MIN, CONTRAST_MAX].
pub const CONTRAST_MIN: f64 = 0.20;
pub const CONTRAST_MAX: f64 = 1.00;

/// Neighborhood widths tried by [`LibraryIndex::autopick`], narrowest first.
pub const AUTOPICK_EPS: [f64; 4] = [0.005, 0.01, 0.02, 0.05];
/// Neighborhood width used when none was picked.
pub const DEFAULT_NEIGHBORHOOD_EPS: f64 = 0.02;

/// Which code a lookup is keyed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    L1,
    L2C,
}

/// A word at some distance from a target point. Values rounded to 3 decimals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub word: String,
    #[serde(rename = "D")]
    pub distance: f64,
    #[serde(rename = "W")]
    pub w: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

/// Result of [`LibraryIndex::near_contrast`]. Both lists empty means "no
/// result".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Proximity {
    pub near: Vec<Neighbor>,
    pub contrast: Vec<Neighbor>,
}

impl Proximity {
    pub fn is_empty(&self) -> bool {
        self.near.is_empty() && self.contrast.is_empty()
    }
}

/// Words sharing L1 and words sharing L2C with some target.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeMatches {
    pub by_l1: Vec<String>,
    /// Never repeats a word already in `by_l1`.
    pub by_l2c: Vec<String>,
}

/// Service codes picked from a W-neighborhood.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Autopick {
    pub l1: u32,
    pub l2c: u32,
    pub eps: f64,
    pub hits: usize,
}

#[derive(Clone, Debug)]
struct Row {
    word: String,
    l1: Option<u32>,
    l2c: Option<u32>,
    point: Option<[f64; 3]>,
}

/// Reverse code indices plus the metric points of every row.
#[derive(Clone, Debug, Default)]
pub struct LibraryIndex {
    by_l1: HashMap<u32, Vec<String>>,
    by_l2c: HashMap<u32, Vec<String>>,
    rows: Vec<Row>,
}

fn push_unique(map: &mut HashMap<u32, Vec<String>>, code: u32, word: &str) {
    let words = map.entry(code).or_default();
    if !words.iter().any(|w| w == word) {
        words.push(word.to_string());
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Most frequent value; ties go to the smaller value.
fn mode<I: IntoIterator<Item = u32>>(values: I) -> Option<u32> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(v, _)| v)
}

impl LibraryIndex {
    /// Build a fresh index over `entries`.
    ///
    /// Rows without a code on an axis contribute nothing to that axis; rows
    /// without a full (W, C, Z) point are left out of distance queries.
    pub fn rebuild(entries: &[Entry]) -> Self {
        let mut index = LibraryIndex::default();
        for entry in entries {
            index.insert(entry);
        }
        debug!(
            rows = index.rows.len(),
            l1_codes = index.by_l1.len(),
            l2c_codes = index.by_l2c.len(),
            "library index rebuilt"
        );
        index
    }

    /// Append a single entry.
    pub fn insert(&mut self, entry: &Entry) {
        let word = entry.word.to_uppercase();
        if word.is_empty() {
            return;
        }
        if let Some(l1) = entry.l1 {
            push_unique(&mut self.by_l1, l1, &word);
        }
        if let Some(l2c) = entry.l2c {
            push_unique(&mut self.by_l2c, l2c, &word);
        }
        self.rows.push(Row {
            word,
            l1: entry.l1,
            l2c: entry.l2c,
            point: entry.metric_point(),
        });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Words sharing `code` on `axis`, in first-seen order, excluding
    /// `exclude` (compared uppercased), at most `limit`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kryon_encoder::config::EncoderConfig;
    /// use kryon_encoder::entry::Entry;
    /// use kryon_encoder::index::{Axis, LibraryIndex};
    ///
    /// let cfg = EncoderConfig::default();
    /// let entries = vec![
    ///     Entry::new("МИР", "прочее", "neutral", &cfg),
    ///     Entry::new("РИМ", "прочее", "neutral", &cfg),
    /// ];
    /// let index = LibraryIndex::rebuild(&entries);
    /// let l1 = entries[0].l1.unwrap();
    /// assert_eq!(index.lookup(l1, Axis::L1, "мир", 10), vec!["РИМ".to_string()]);
    /// ```
    pub fn lookup(&self, code: u32, axis: Axis, exclude: &str, limit: usize) -> Vec<String> {
        let map = match axis {
            Axis::L1 => &self.by_l1,
            Axis::L2C => &self.by_l2c,
        };
        let exclude = exclude.to_uppercase();
        map.get(&code)
            .map(|words| {
                words
                    .iter()
                    .filter(|w| **w != exclude)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// L1 and L2C matches for a target, each capped at `limit`.
    pub fn matches_by_code(&self, l1: u32, l2c: u32, current: &str, limit: usize) -> CodeMatches {
        let by_l1 = self.lookup(l1, Axis::L1, current, limit);
        let seen: HashSet<&str> = by_l1.iter().map(String::as_str).collect();
        let by_l2c = self
            .lookup(l2c, Axis::L2C, current, limit)
            .into_iter()
            .filter(|w| !seen.contains(w.as_str()))
            .collect();
        CodeMatches { by_l1, by_l2c }
    }

    /// Near and contrast words around `target` = (W, C, Z).
    ///
    /// Rows are sorted by distance (stable, so equal distances keep
    /// collection order) and deduplicated by word keeping the closest
    /// occurrence. Near: D ≤ 0.30, first `k_near`. Contrast: 0.20 < D ≤ 1.00
    /// and not near, first `k_contrast`.
    pub fn near_contrast(
        &self,
        target: [f64; 3],
        exclude: &str,
        k_near: usize,
        k_contrast: usize,
    ) -> Proximity {
        let exclude = exclude.to_uppercase();
        let mut scored: Vec<(&Row, [f64; 3], f64)> = self
            .rows
            .iter()
            .filter(|r| r.word != exclude)
            .filter_map(|r| r.point.map(|p| (r, p, distance(p, target))))
            .collect();
        if scored.is_empty() {
            return Proximity::default();
        }
        scored.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));

        let mut seen: HashSet<&str> = HashSet::new();
        scored.retain(|scored_row| {
            let row: &Row = scored_row.0;
            seen.insert(row.word.as_str())
        });

        let to_neighbor = |(r, p, d): &(&Row, [f64; 3], f64)| Neighbor {
            word: r.word.clone(),
            distance: round3(*d),
            w: round3(p[0]),
            c: round3(p[1]),
            z: round3(p[2]),
        };

        let near: Vec<Neighbor> = scored
            .iter()
            .filter(|(_, _, d)| *d <= NEAR_MAX)
            .take(k_near)
            .map(to_neighbor)
            .collect();
        let near_words: HashSet<&str> = near.iter().map(|n| n.word.as_str()).collect();
        let contrast = scored
            .iter()
            .filter(|(r, _, d)| {
                *d > CONTRAST_MIN && *d <= CONTRAST_MAX && !near_words.contains(r.word.as_str())
            })
            .take(k_contrast)
            .map(to_neighbor)
            .collect();

        Proximity { near, contrast }
    }

    /// Unique words with |W − w| ≤ eps in collection order, at most `limit`.
    pub fn w_neighborhood(&self, w: f64, eps: f64, exclude: &str, limit: usize) -> Vec<String> {
        let exclude = exclude.to_uppercase();
        let mut out: Vec<String> = Vec::new();
        for row in &self.rows {
            if out.len() >= limit {
                break;
            }
            let inside = row.point.is_some_and(|p| (p[0] - w).abs() <= eps);
            if inside && row.word != exclude && !out.contains(&row.word) {
                out.push(row.word.clone());
            }
        }
        out
    }

    /// Modal L1 and L2C among rows whose W is within the narrowest of
    /// [`AUTOPICK_EPS`] that has any hit.
    pub fn autopick(&self, w_target: f64) -> Option<Autopick> {
        let usable: Vec<(f64, u32, u32)> = self
            .rows
            .iter()
            .filter_map(|r| Some((r.point?[0], r.l1?, r.l2c?)))
            .collect();
        for eps in AUTOPICK_EPS {
            let hits: Vec<&(f64, u32, u32)> = usable
                .iter()
                .filter(|(w, _, _)| (w - w_target).abs() <= eps)
                .collect();
            if hits.is_empty() {
                continue;
            }
            let l1 = mode(hits.iter().map(|h| h.1))?;
            let l2c = mode(hits.iter().map(|h| h.2))?;
            return Some(Autopick {
                l1,
                l2c,
                eps,
                hits: hits.len(),
            });
        }
        None
    }
}
