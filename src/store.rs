//! On-disk persistence for the word collection.
//!
//! - CSV collection files with the fixed [`LIB_COLS`] contract
//! - per-sphere files `sphere_<slug>.csv`, multi-sphere rows expanded
//! - atomic replace (temp file in the target directory, then rename)
//! - SHA-256 digest of the source files
//! - bincode snapshots

use crate::entry::{Entry, ParseSkip, DEFAULT_SPHERE, LIB_COLS};
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const SPHERE_PREFIX: &str = "sphere_";
pub const SPHERE_EXT: &str = "csv";

/// Rows read from one or more collection files.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub entries: Vec<Entry>,
    /// Numeric cells that could not be parsed. Rows are kept.
    pub skips: Vec<ParseSkip>,
}

impl LoadReport {
    fn extend(&mut self, other: LoadReport) {
        self.entries.extend(other.entries);
        self.skips.extend(other.skips);
    }
}

// ============================================================================
// Atomic file replace
// ============================================================================

/// Replace `path` with `data`. Readers see either the old or the new
/// contents, never a partial write.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    debug!(path = %path.display(), bytes = data.len(), "atomic write");
    Ok(())
}

// ============================================================================
// CSV
// ============================================================================

/// Read a collection. Columns are matched by header name; missing columns
/// read as empty.
pub fn read_entries<R: Read>(reader: R) -> Result<LoadReport> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    let mut report = LoadReport::default();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // 1-based data rows, header excluded
        let (entry, skips) =
            Entry::from_row(i + 1, |col| headers.get(col).and_then(|&idx| record.get(idx)));
        report.entries.push(entry);
        report.skips.extend(skips);
    }
    if !report.skips.is_empty() {
        debug!(count = report.skips.len(), "unparseable numeric cells");
    }
    Ok(report)
}

pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<LoadReport> {
    read_entries(File::open(path)?)
}

/// Write `entries` with the [`LIB_COLS`] header.
pub fn write_entries<W: Write>(writer: W, entries: &[Entry]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(LIB_COLS)?;
    for entry in entries {
        wtr.write_record(entry.to_row())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Serialize and atomically replace `path`.
pub fn save_csv<P: AsRef<Path>>(path: P, entries: &[Entry]) -> Result<()> {
    let mut buf = Vec::new();
    write_entries(&mut buf, entries)?;
    atomic_write(path.as_ref(), &buf)
}

// ============================================================================
// Sphere files
// ============================================================================

fn transliterate(ch: char) -> Option<&'static str> {
    let upper = ch.to_uppercase().next().unwrap_or(ch);
    Some(match upper {
        'А' => "A",
        'Б' => "B",
        'В' => "V",
        'Г' => "G",
        'Д' => "D",
        'Е' | 'Ё' | 'Э' => "E",
        'Ж' => "Zh",
        'З' => "Z",
        'И' => "I",
        'Й' | 'Ы' => "Y",
        'К' => "K",
        'Л' => "L",
        'М' => "M",
        'Н' => "N",
        'О' => "O",
        'П' => "P",
        'Р' => "R",
        'С' => "S",
        'Т' => "T",
        'У' => "U",
        'Ф' => "F",
        'Х' => "H",
        'Ц' => "C",
        'Ч' => "Ch",
        'Ш' => "Sh",
        'Щ' => "Sch",
        'Ю' => "Yu",
        'Я' => "Ya",
        'Ь' | 'Ъ' => "",
        _ => return None,
    })
}

/// ASCII slug of a sphere name: Cyrillic transliterated, every other run of
/// non-alphanumerics collapsed to `-`, lowercased. Never empty.
///
/// # Examples
///
/// ```
/// use kryon_encoder::store::slugify;
///
/// assert_eq!(slugify("Природа и Свет"), "priroda-i-svet");
/// assert_eq!(slugify("!!!"), "sphere");
/// ```
pub fn slugify(title: &str) -> String {
    let mut latin = String::with_capacity(title.len());
    for ch in title.chars() {
        match transliterate(ch) {
            Some(t) => latin.push_str(t),
            None => latin.push(ch),
        }
    }
    let mut slug = String::with_capacity(latin.len());
    let mut pending_dash = false;
    for ch in latin.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "sphere".to_string()
    } else {
        slug
    }
}

pub fn sphere_file_name(sphere: &str) -> String {
    format!("{SPHERE_PREFIX}{}.{SPHERE_EXT}", slugify(sphere))
}

/// Write one file per sphere tag into `dir`. A row tagged `a;b` lands in
/// both files with its sphere narrowed to the single tag; untagged rows go
/// to the default sphere. Spheres sharing a slug share a file.
pub fn save_sphere_files<P: AsRef<Path>>(dir: P, entries: &[Entry]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut by_file: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
    for entry in entries {
        let mut tags: Vec<&str> = entry.spheres().collect();
        if tags.is_empty() {
            tags.push(DEFAULT_SPHERE);
        }
        for tag in tags {
            let mut row = entry.clone();
            row.sphere = tag.to_string();
            by_file.entry(sphere_file_name(tag)).or_default().push(row);
        }
    }

    let mut written = Vec::with_capacity(by_file.len());
    for (name, rows) in by_file {
        let path = dir.join(name);
        save_csv(&path, &rows)?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "sphere files saved");
    Ok(written)
}

fn is_sphere_file(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(SPHERE_PREFIX));
    name_ok && path.extension().and_then(|e| e.to_str()) == Some(SPHERE_EXT)
}

/// `sphere_*.csv` files directly inside `dir`, sorted by path.
pub fn discover_sphere_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_file() && is_sphere_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Remove sphere files in `dir` that are not in `keep`. Returns the number
/// removed.
pub fn prune_sphere_files<P: AsRef<Path>>(dir: P, keep: &[PathBuf]) -> Result<usize> {
    let mut removed = 0;
    for path in discover_sphere_files(dir)? {
        if !keep.contains(&path) {
            fs::remove_file(&path)?;
            debug!(path = %path.display(), "stale sphere file removed");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Load every sphere file in `dir`. A file that cannot be read is logged
/// and skipped; the others still load.
pub fn load_sphere_dir<P: AsRef<Path>>(dir: P) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    for path in discover_sphere_files(dir)? {
        match load_csv(&path) {
            Ok(part) => report.extend(part),
            Err(err) => warn!(path = %path.display(), "sphere file skipped: {err}"),
        }
    }
    Ok(report)
}

/// Hex SHA-256 over the concatenated contents of `paths` in sorted order.
/// Unreadable files are skipped.
pub fn sources_digest(paths: &[PathBuf]) -> String {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();
    let mut hasher = Sha256::new();
    for path in sorted {
        match fs::read(path) {
            Ok(data) => hasher.update(&data),
            Err(err) => debug!(path = %path.display(), "digest skips file: {err}"),
        }
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Snapshots
// ============================================================================

pub fn save_snapshot<P: AsRef<Path>>(path: P, entries: &[Entry]) -> Result<()> {
    let encoded = bincode::serialize(entries)?;
    atomic_write(path.as_ref(), &encoded)
}

pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<Entry>> {
    let data = fs::read(path)?;
    Ok(bincode::deserialize(&data)?)
}
