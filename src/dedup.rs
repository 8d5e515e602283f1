//! Collection canonicalization.
//!
//! Rows are grouped on (normalized word, sphere, tone). Within a group:
//! - `allowed` is the OR over the group
//! - `field` and `role` take the first non-empty value in input order
//! - `notes` are the unique non-empty notes joined with `" | "`, first-seen
//!   order; a row whose notes were already merged is split on `" | "` first,
//!   so merging canonical rows again never nests or repeats a note
//!
//! Derived fields are recomputed from the canonical word; nothing numeric
//! from the input survives. Groups are emitted in ascending key order, so
//! `dedup(dedup(x)) == dedup(x)`.

use crate::alphabet::normalize;
use crate::config::EncoderConfig;
use crate::entry::{clean_text, Entry, DEFAULT_SPHERE, DEFAULT_TONE};
use std::collections::BTreeMap;
use tracing::debug;

pub const NOTES_SEPARATOR: &str = " | ";

/// Grouping key of a row: normalized word, trimmed sphere and tone with
/// their defaults applied.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DedupKey {
    pub word: String,
    pub sphere: String,
    pub tone: String,
}

impl DedupKey {
    /// `None` for rows whose word has no letters.
    pub fn of(entry: &Entry) -> Option<Self> {
        let word = normalize(&entry.word);
        if word.is_empty() {
            return None;
        }
        let or_default = |raw: &str, default: &str| {
            let cleaned = clean_text(raw);
            if cleaned.is_empty() {
                default.to_string()
            } else {
                cleaned
            }
        };
        Some(DedupKey {
            word,
            sphere: or_default(&entry.sphere, DEFAULT_SPHERE),
            tone: or_default(&entry.tone, DEFAULT_TONE),
        })
    }
}

#[derive(Default)]
struct Group {
    allowed: bool,
    field: String,
    role: String,
    notes: Vec<String>,
}

impl Group {
    fn absorb(&mut self, entry: &Entry) {
        self.allowed |= entry.allowed;
        if self.field.is_empty() {
            self.field = clean_text(&entry.field);
        }
        if self.role.is_empty() {
            self.role = clean_text(&entry.role);
        }
        // "x | y" counts as the two notes "x" and "y"
        for note in entry.notes.split(NOTES_SEPARATOR).map(clean_text) {
            if !note.is_empty() && !self.notes.contains(&note) {
                self.notes.push(note);
            }
        }
    }
}

/// Canonicalize `entries`. Rows without letters are dropped.
///
/// # Examples
///
/// ```
/// use kryon_encoder::config::EncoderConfig;
/// use kryon_encoder::dedup::dedup;
/// use kryon_encoder::entry::Entry;
///
/// let cfg = EncoderConfig::default();
/// let mut a = Entry::new("СВЕТ", "природа", "neutral", &cfg);
/// a.notes = "утро".into();
/// let mut b = a.clone();
/// b.notes = "день".into();
/// let out = dedup(vec![a, b], &cfg);
/// assert_eq!(out.len(), 1);
/// assert_eq!(out[0].notes, "утро | день");
/// ```
pub fn dedup(entries: Vec<Entry>, config: &EncoderConfig) -> Vec<Entry> {
    let total = entries.len();
    let mut groups: BTreeMap<DedupKey, Group> = BTreeMap::new();
    let mut dropped = 0usize;
    for entry in &entries {
        match DedupKey::of(entry) {
            Some(key) => groups.entry(key).or_default().absorb(entry),
            None => dropped += 1,
        }
    }

    let out: Vec<Entry> = groups
        .into_iter()
        .map(|(key, group)| {
            let mut entry = Entry {
                word: key.word,
                sphere: key.sphere,
                tone: key.tone,
                allowed: group.allowed,
                field: group.field,
                role: group.role,
                notes: group.notes.join(NOTES_SEPARATOR),
                l1: None,
                l2c: None,
                w: None,
                c: None,
                hm: None,
                z: None,
            };
            entry.recompute(config);
            entry
        })
        .collect();
    debug!(total, kept = out.len(), dropped, "dedup pass");
    out
}

/// Concatenate and canonicalize.
pub fn merge(existing: Vec<Entry>, incoming: Vec<Entry>, config: &EncoderConfig) -> Vec<Entry> {
    let mut all = existing;
    all.extend(incoming);
    dedup(all, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(word: &str, sphere: &str, tone: &str) -> Entry {
        let mut e = Entry::new(word, sphere, tone, &EncoderConfig::default());
        e.allowed = false;
        e
    }

    #[test]
    fn same_word_other_sphere_survives() {
        let cfg = EncoderConfig::default();
        let out = dedup(
            vec![entry("МИР", "а", ""), entry("мир", "б", ""), entry("МИР", "а", "")],
            &cfg,
        );
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.tone == DEFAULT_TONE));
    }

    #[test]
    fn metadata_merge_rules() {
        let cfg = EncoderConfig::default();
        let mut a = entry("МИР", "", "");
        a.notes = "nan".into();
        let mut b = entry("МИР", "", "");
        b.allowed = true;
        b.field = "  поле ".into();
        b.notes = "x".into();
        let mut c = entry("МИР", "", "");
        c.field = "другое".into();
        c.role = "роль".into();
        c.notes = "x | y".into();

        let out = dedup(vec![a, b, c], &cfg);
        assert_eq!(out.len(), 1);
        let row = &out[0];
        assert_eq!(row.sphere, DEFAULT_SPHERE);
        assert!(row.allowed);
        assert_eq!(row.field, "поле");
        assert_eq!(row.role, "роль");
        assert_eq!(row.notes, "x | y");

        let mut d = row.clone();
        d.notes = "y | z".into();
        let again = dedup(vec![row.clone(), d], &cfg);
        assert_eq!(again[0].notes, "x | y | z");
    }

    #[test]
    fn stored_numbers_are_not_trusted() {
        let cfg = EncoderConfig::default();
        let mut forged = entry("МИР", "", "");
        let honest = forged.clone();
        forged.l1 = Some(1);
        forged.z = Some(0.999);
        let out = dedup(vec![forged], &cfg);
        assert_eq!(out[0].l1, honest.l1);
        assert_eq!(out[0].z, honest.z);
    }

    #[test]
    fn letterless_rows_are_dropped() {
        let cfg = EncoderConfig::default();
        assert!(dedup(vec![entry("123", "", "")], &cfg).is_empty());
        assert!(dedup(Vec::new(), &cfg).is_empty());
    }
}
