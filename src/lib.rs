//! Kryon Encoder - deterministic word metrics over the Kryon-33 alphabet
//!
//! Copyright (c) 2025 Kryon Encoder Contributors
//! Licensed under MIT License
//!
//! # Overview
//!
//! A Russian word (or a date, via its spelled-out phrase) is reduced to an
//! integer code L1 by summing fixed letter weights. L1 is spelled out in
//! words, and those words give a second code L2C. The pair yields:
//! - W = L2C / L1, the primary axis
//! - C, Hm and Z, scores in [0, 1]
//! - Q and FII composites, W clusters, archetype resonance
//! - a fractal "breathing" pattern from iterating L1 → L2C
//!
//! A [`Library`] of scored words supports code matches and nearest-neighbor
//! lookups in (W, C, Z) space, with deduplication and CSV persistence.
//!
//! # Quick Start
//!
//! ```
//! use kryon_encoder::{analyze_word, EncoderConfig, Library};
//!
//! let cfg = EncoderConfig::default();
//! let res = analyze_word("свет", &cfg).unwrap();
//! assert_eq!(res.normalized, "СВЕТ");
//!
//! let lib = Library::new(cfg);
//! lib.add_words("мир, рим", "прочее").unwrap();
//! let snap = lib.snapshot();
//! let matches = snap.index.matches_by_code(42, 0, "мир", 10);
//! assert_eq!(matches.by_l1, vec!["РИМ"]);
//! ```

pub mod alphabet;
pub mod analysis;
pub mod classify;
pub mod cli;
pub mod config;
pub mod date;
pub mod dedup;
pub mod entry;
pub mod error;
pub mod fractal;
pub mod index;
pub mod library;
pub mod metrics;
pub mod mirror;
pub mod report;
pub mod speller;
pub mod store;

// Re-export main types for convenience
pub use alphabet::{encode, normalize};
pub use analysis::{analyze_phrase, analyze_profile, analyze_word, AnalysisResult, Profile};
pub use classify::{Cluster, DiagnosticCluster, FiiCategory};
pub use config::EncoderConfig;
pub use dedup::dedup;
pub use entry::{Entry, ParseSkip};
pub use error::{EncoderError, Result};
pub use fractal::{unfold, FractalPattern};
pub use index::{Axis, LibraryIndex, Proximity};
pub use library::Library;
pub use metrics::{Encoding, Metrics};
pub use mirror::{DirectoryMirror, RemoteMirror, RetryPolicy, SyncStatus};
pub use report::Report;
pub use speller::spell;
