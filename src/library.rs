//! The shared word library.
//!
//! A [`Library`] owns one immutable [`LibrarySnapshot`] (entries plus the
//! index built from them) behind an `RwLock<Arc<_>>`. Every mutation builds
//! a complete new snapshot off to the side and swaps the pointer, so a reader
//! holding an `Arc` sees either the old or the new collection, never a
//! half-rebuilt index.
//!
//! Writers are serialized by a separate mutex that covers read → merge →
//! persist → swap. Mirroring happens after the mutex is released and never
//! affects the local result.

use crate::alphabet::normalize;
use crate::classify::{diagnostic_cluster, DiagnosticCluster};
use crate::config::EncoderConfig;
use crate::dedup::{dedup, merge};
use crate::entry::{clean_text, parse_bool, Entry, DEFAULT_SPHERE, DEFAULT_TONE};
use crate::error::{EncoderError, Result};
use crate::index::LibraryIndex;
use crate::mirror::{sync_with_retry, RemoteMirror, RetryPolicy, SyncStatus};
use crate::store::{self, LoadReport};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Quality-summary zone around W = 2.
pub const ZONE: (f64, f64) = (1.6, 2.4);
/// W outside (EDGE_LOW, EDGE_HIGH) counts as an edge word.
pub const EDGE_LOW: f64 = 0.7;
pub const EDGE_HIGH: f64 = 4.0;
/// Spheres need this many words to be ranked.
pub const TOP_SPHERE_MIN_WORDS: usize = 30;
pub const TOP_SPHERE_LIMIT: usize = 10;

/// One consistent view of the collection.
#[derive(Debug, Default)]
pub struct LibrarySnapshot {
    /// Incremented on every swap.
    pub version: u64,
    pub entries: Vec<Entry>,
    pub index: LibraryIndex,
}

impl LibrarySnapshot {
    fn build(version: u64, entries: Vec<Entry>) -> Self {
        let index = LibraryIndex::rebuild(&entries);
        LibrarySnapshot {
            version,
            entries,
            index,
        }
    }
}

/// Result of a mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationOutcome {
    /// Rows offered by the caller after their own dedup.
    pub offered: usize,
    /// Collection size after the merge.
    pub total: usize,
    /// Files written locally; empty for an in-memory library.
    pub written: Vec<PathBuf>,
    pub sync: SyncStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LibraryStats {
    pub count: usize,
    pub num_spheres: usize,
    pub w_mean: f64,
    pub z_mean: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SphereScore {
    pub sphere: String,
    pub count: usize,
    pub z_mean: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QualitySummary {
    pub total: usize,
    /// Share of words with W in [1.6, 2.4], percent, one decimal.
    pub zone_percent: f64,
    pub edge: usize,
    pub clusters: BTreeMap<DiagnosticCluster, usize>,
    pub top_spheres: Vec<SphereScore>,
}

/// One row of a filtered view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewRow {
    pub entry: Entry,
    pub cluster: Option<DiagnosticCluster>,
}

/// Filter for [`Library::filter`]. Empty fields match everything.
#[derive(Clone, Debug, Default)]
pub struct ViewFilter {
    /// Case-insensitive substring of the sphere cell.
    pub sphere: String,
    pub cluster: Option<DiagnosticCluster>,
    /// Normalized, then matched as a substring of the word.
    pub search: String,
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Descending with missing values last.
fn cmp_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ascending with missing values last.
fn cmp_asc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sphere cell membership, exact per tag and case-insensitive.
pub fn sphere_matches(cell: &str, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    !query.is_empty() && cell.split(';').any(|part| part.trim().to_lowercase() == query)
}

/// Split pasted text on newlines, `,` and `;`, normalize each piece, drop
/// pieces without letters.
pub fn split_words(raw: &str) -> Vec<String> {
    raw.split(['\n', ',', ';'])
        .map(normalize)
        .filter(|w| !w.is_empty())
        .collect()
}

fn json_text(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => clean_text(s),
        Some(Value::Null) | None => String::new(),
        Some(other) => clean_text(&other.to_string()),
    }
}

fn json_bool(item: &Value, key: &str) -> bool {
    match item.get(key) {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => parse_bool(s),
        Some(_) => false,
    }
}

/// Parse an import document: `{"library": [...]}` or a bare array. Items
/// use `word` or `text`; missing sphere, tone and allowed take their
/// defaults. Numeric fields in the document are ignored.
pub fn parse_import(json: &str, config: &EncoderConfig) -> Result<Vec<Entry>> {
    let doc: Value = serde_json::from_str(json)?;
    let items = match &doc {
        Value::Object(map) => map.get("library").and_then(Value::as_array),
        Value::Array(items) => Some(items),
        _ => None,
    }
    .ok_or_else(|| EncoderError::Format("expected a list or {\"library\": [...]}".into()))?;

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let mut word = json_text(item, "word");
        if word.is_empty() {
            word = json_text(item, "text");
        }
        let word = word.to_uppercase();
        if word.is_empty() {
            continue;
        }
        let or = |s: String, d: &str| if s.is_empty() { d.to_string() } else { s };
        let mut entry = Entry::new(
            &word,
            &or(json_text(item, "sphere"), DEFAULT_SPHERE),
            &or(json_text(item, "tone"), DEFAULT_TONE),
            config,
        );
        entry.allowed = json_bool(item, "allowed");
        entry.notes = json_text(item, "notes");
        entry.field = json_text(item, "field");
        entry.role = json_text(item, "role");
        entries.push(entry);
    }
    Ok(entries)
}

/// Shared, versioned word collection.
pub struct Library {
    state: RwLock<Arc<LibrarySnapshot>>,
    writer: Mutex<()>,
    config: RwLock<EncoderConfig>,
    dir: Option<PathBuf>,
    mirror: Option<Box<dyn RemoteMirror>>,
    retry: RetryPolicy,
}

impl Library {
    /// Empty in-memory library.
    pub fn new(config: EncoderConfig) -> Self {
        Library {
            state: RwLock::new(Arc::new(LibrarySnapshot::default())),
            writer: Mutex::new(()),
            config: RwLock::new(config),
            dir: None,
            mirror: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Library backed by the sphere files in `dir`. Existing files are
    /// loaded and canonicalized; unparseable cells are returned.
    pub fn open<P: AsRef<Path>>(dir: P, config: EncoderConfig) -> Result<(Self, LoadReport)> {
        let dir = dir.as_ref().to_path_buf();
        let mut report = store::load_sphere_dir(&dir)?;
        let entries = dedup(std::mem::take(&mut report.entries), &config);
        info!(dir = %dir.display(), words = entries.len(), skips = report.skips.len(), "library opened");
        let library = Library {
            state: RwLock::new(Arc::new(LibrarySnapshot::build(1, entries))),
            dir: Some(dir),
            ..Library::new(config)
        };
        Ok((library, report))
    }

    pub fn with_mirror(mut self, mirror: Box<dyn RemoteMirror>, retry: RetryPolicy) -> Self {
        self.mirror = Some(mirror);
        self.retry = retry;
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Current consistent view.
    pub fn snapshot(&self) -> Arc<LibrarySnapshot> {
        Arc::clone(&self.state.read())
    }

    pub fn config(&self) -> EncoderConfig {
        self.config.read().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Serialized read → transform → persist → swap, then mirror.
    fn mutate<F>(&self, offered: usize, message: &str, f: F) -> Result<MutationOutcome>
    where
        F: FnOnce(&LibrarySnapshot, &EncoderConfig) -> Vec<Entry>,
    {
        let guard = self.writer.lock();
        let config = self.config();
        let current = self.snapshot();
        let next = f(&current, &config);

        let written = match &self.dir {
            Some(dir) => {
                let written = store::save_sphere_files(dir, &next)?;
                store::prune_sphere_files(dir, &written)?;
                written
            }
            None => Vec::new(),
        };
        let total = next.len();
        *self.state.write() = Arc::new(LibrarySnapshot::build(current.version + 1, next));
        drop(guard);

        let sync = if written.is_empty() {
            SyncStatus::Disabled
        } else {
            sync_with_retry(self.mirror.as_deref(), &written, message, self.retry)
        };
        if let Some(warning) = sync.warning() {
            warn!("{warning}");
        }
        Ok(MutationOutcome {
            offered,
            total,
            written,
            sync,
        })
    }

    /// Replace the whole collection with the canonical form of `entries`.
    pub fn replace(&self, entries: Vec<Entry>) -> Result<MutationOutcome> {
        let offered = entries.len();
        self.mutate(offered, "Replace library", move |_, cfg| dedup(entries, cfg))
    }

    /// Merge `entries` into the collection and canonicalize.
    pub fn merge(&self, entries: Vec<Entry>) -> Result<MutationOutcome> {
        let config = self.config();
        let incoming = dedup(entries, &config);
        let offered = incoming.len();
        self.mutate(offered, "Merge into library", move |current, cfg| {
            merge(current.entries.clone(), incoming, cfg)
        })
    }

    /// Add pasted words under one sphere, tone `neutral`, allowed.
    pub fn add_words(&self, raw: &str, sphere: &str) -> Result<MutationOutcome> {
        let words = split_words(raw);
        if words.is_empty() {
            return Err(EncoderError::NoLetters);
        }
        let sphere = match sphere.trim() {
            "" => DEFAULT_SPHERE,
            s => s,
        };
        let config = self.config();
        let entries = words
            .iter()
            .map(|w| Entry::new(w, sphere, DEFAULT_TONE, &config))
            .collect();
        self.merge(entries)
    }

    /// Merge the entries of a JSON import document.
    pub fn import_json(&self, json: &str) -> Result<MutationOutcome> {
        let entries = parse_import(json, &self.config())?;
        self.merge(entries)
    }

    /// Install a new configuration and recompute every entry under it.
    /// An out-of-domain configuration leaves the library untouched.
    pub fn set_config(&self, config: EncoderConfig) -> Result<MutationOutcome> {
        config.validate()?;
        *self.config.write() = config;
        let offered = self.len();
        self.mutate(offered, "Recompute library", |current, cfg| {
            current
                .entries
                .iter()
                .cloned()
                .map(|mut e| {
                    e.recompute(cfg);
                    e
                })
                .collect()
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn stats(&self) -> LibraryStats {
        let snap = self.snapshot();
        let entries = &snap.entries;
        LibraryStats {
            count: entries.len(),
            num_spheres: entries
                .iter()
                .flat_map(Entry::spheres)
                .collect::<BTreeSet<_>>()
                .len(),
            w_mean: mean(entries.iter().filter_map(|e| e.w)).unwrap_or(0.0),
            z_mean: mean(entries.iter().filter_map(|e| e.z)).unwrap_or(0.0),
        }
    }

    /// Every sphere tag, sorted; `["прочее"]` when there are none.
    pub fn spheres(&self) -> Vec<String> {
        let snap = self.snapshot();
        let set: BTreeSet<&str> = snap.entries.iter().flat_map(Entry::spheres).collect();
        if set.is_empty() {
            return vec![DEFAULT_SPHERE.to_string()];
        }
        set.into_iter().map(str::to_string).collect()
    }

    /// Entries tagged exactly with `sphere`.
    pub fn in_sphere(&self, sphere: &str) -> Vec<Entry> {
        self.snapshot()
            .entries
            .iter()
            .filter(|e| sphere_matches(&e.sphere, sphere))
            .cloned()
            .collect()
    }

    pub fn quality_summary(&self) -> QualitySummary {
        let snap = self.snapshot();
        let entries = &snap.entries;
        let total = entries.len();
        if total == 0 {
            return QualitySummary::default();
        }

        let mut clusters: BTreeMap<DiagnosticCluster, usize> =
            DiagnosticCluster::ALL.iter().map(|&c| (c, 0)).collect();
        let (mut zone, mut edge) = (0usize, 0usize);
        for w in entries.iter().filter_map(|e| e.w) {
            *clusters.entry(diagnostic_cluster(w)).or_default() += 1;
            if (ZONE.0..=ZONE.1).contains(&w) {
                zone += 1;
            }
            if w > EDGE_HIGH || w < EDGE_LOW {
                edge += 1;
            }
        }
        let zone_percent = (zone as f64 / total as f64 * 1000.0).round_ties_even() / 10.0;

        let mut per_sphere: BTreeMap<&str, (usize, Vec<f64>)> = BTreeMap::new();
        for e in entries {
            for sphere in e.spheres() {
                let slot = per_sphere.entry(sphere).or_default();
                slot.0 += 1;
                slot.1.extend(e.z);
            }
        }
        let mut top_spheres: Vec<SphereScore> = per_sphere
            .into_iter()
            .filter(|(_, (count, _))| *count >= TOP_SPHERE_MIN_WORDS)
            .map(|(sphere, (count, zs))| SphereScore {
                sphere: sphere.to_string(),
                count,
                z_mean: mean(zs.into_iter()).unwrap_or(0.0),
            })
            .collect();
        top_spheres.sort_by(|a, b| {
            cmp_desc(Some(a.z_mean), Some(b.z_mean)).then(b.count.cmp(&a.count))
        });
        top_spheres.truncate(TOP_SPHERE_LIMIT);

        QualitySummary {
            total,
            zone_percent,
            edge,
            clusters,
            top_spheres,
        }
    }

    /// Filtered view sorted by Z descending, then W ascending.
    pub fn filter(&self, filter: &ViewFilter) -> Vec<ViewRow> {
        let sphere_q = filter.sphere.trim().to_lowercase();
        let search = normalize(&filter.search);
        let snap = self.snapshot();
        let mut rows: Vec<ViewRow> = snap
            .entries
            .iter()
            .map(|e| ViewRow {
                cluster: e.w.map(diagnostic_cluster),
                entry: e.clone(),
            })
            .filter(|r| sphere_q.is_empty() || r.entry.sphere.to_lowercase().contains(&sphere_q))
            .filter(|r| filter.cluster.is_none() || r.cluster == filter.cluster)
            .filter(|r| search.is_empty() || r.entry.word.contains(&search))
            .collect();
        rows.sort_by(|a, b| cmp_desc(a.entry.z, b.entry.z).then(cmp_asc(a.entry.w, b.entry.w)));
        rows
    }

    /// Digest over the sphere files currently on disk.
    pub fn sources_digest(&self) -> Result<Option<String>> {
        match &self.dir {
            Some(dir) => Ok(Some(store::sources_digest(&store::discover_sphere_files(dir)?))),
            None => Ok(None),
        }
    }
}

/// Portable form of a whole library, for snapshots and exports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryExport {
    pub library: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_words_normalizes() {
        assert_eq!(split_words("мир, свет;\n 42 ;дом"), vec!["МИР", "СВЕТ", "ДОМ"]);
    }

    #[test]
    fn sphere_match_is_exact_per_tag() {
        assert!(sphere_matches("Природа; свет", "свет"));
        assert!(sphere_matches("Природа; свет", " ПРИРОДА "));
        assert!(!sphere_matches("природа", "при"));
        assert!(!sphere_matches("природа", ""));
    }

    #[test]
    fn import_accepts_both_shapes() {
        let cfg = EncoderConfig::default();
        let wrapped = r#"{"library": [{"word": "мир", "l1": 1}, {"text": "свет", "allowed": "нет"}, {"word": ""}]}"#;
        let entries = parse_import(wrapped, &cfg).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sphere, DEFAULT_SPHERE);
        assert_eq!(entries[0].l1, Some(42));
        assert!(entries[0].allowed);
        assert_eq!(entries[1].word, "СВЕТ");
        assert!(!entries[1].allowed);

        let bare = r#"[{"word": "дом", "sphere": "быт", "tone": "warm"}]"#;
        let entries = parse_import(bare, &cfg).unwrap();
        assert_eq!((entries[0].sphere.as_str(), entries[0].tone.as_str()), ("быт", "warm"));

        assert!(parse_import("42", &cfg).is_err());
    }

    #[test]
    fn mutations_bump_version_and_rebuild_index() {
        let lib = Library::new(EncoderConfig::default());
        let v0 = lib.snapshot().version;
        let out = lib.add_words("мир, мир, рим", "").unwrap();
        assert_eq!(out.offered, 2);
        assert_eq!(out.total, 2);
        assert_eq!(out.sync, SyncStatus::Disabled);
        let snap = lib.snapshot();
        assert_eq!(snap.version, v0 + 1);
        assert_eq!(snap.index.len(), 2);
        assert!(matches!(lib.add_words("123", "x"), Err(EncoderError::NoLetters)));
    }

    #[test]
    fn spheres_default_when_empty() {
        let lib = Library::new(EncoderConfig::default());
        assert_eq!(lib.spheres(), vec![DEFAULT_SPHERE]);
        lib.add_words("мир", "б;а").unwrap();
        assert_eq!(lib.spheres(), vec!["а", "б"]);
    }

    #[test]
    fn set_config_recomputes_z() {
        let lib = Library::new(EncoderConfig::default());
        lib.add_words("гармония", "").unwrap();
        let before = lib.snapshot().entries[0].z;
        let wide = EncoderConfig::default().with_values(5.0, 0.75, None).unwrap();
        lib.set_config(wide).unwrap();
        let after = lib.snapshot().entries[0].z;
        assert!(after.unwrap() >= before.unwrap());
    }

    #[test]
    fn filter_sorts_by_z_then_w() {
        let lib = Library::new(EncoderConfig::default());
        lib.add_words("мир, свет, дом, гармония", "быт").unwrap();
        let rows = lib.filter(&ViewFilter::default());
        assert_eq!(rows.len(), 4);
        for pair in rows.windows(2) {
            assert!(pair[0].entry.z >= pair[1].entry.z);
        }
        let only = lib.filter(&ViewFilter {
            search: "ми".into(),
            ..ViewFilter::default()
        });
        assert!(only.iter().all(|r| r.entry.word.contains("МИ")));
        assert!(lib
            .filter(&ViewFilter {
                sphere: "нет такой".into(),
                ..ViewFilter::default()
            })
            .is_empty());
    }

    #[test]
    fn quality_summary_counts() {
        let lib = Library::new(EncoderConfig::default());
        assert_eq!(lib.quality_summary(), QualitySummary::default());
        lib.add_words("мир, свет, дом", "быт").unwrap();
        let q = lib.quality_summary();
        assert_eq!(q.total, 3);
        assert_eq!(q.clusters.values().sum::<usize>(), 3);
        assert!(q.top_spheres.is_empty());
        assert!((0.0..=100.0).contains(&q.zone_percent));
    }
}
