//! CLI interface for the Kryon encoder
//!
//! Provides command-line interface for:
//! - Analysing words, dates, phrases and integral profiles
//! - Fractal unfolding, number spelling and date phrases
//! - Managing the sphere library (add, import, dedup, stats, search)
//! - Showing and changing the encoder configuration

use crate::analysis::{analyze_phrase, analyze_profile, analyze_word, AnalysisResult, Profile};
use crate::classify::{metric_bar, DiagnosticCluster};
use crate::config::{EncoderConfig, CALC_VERSION, ENCODER_VERSION};
use crate::date::parse_date_phrase;
use crate::error::EncoderError;
use crate::fractal::unfold;
use crate::library::{Library, LibraryExport, MutationOutcome, ViewFilter};
use crate::mirror::{DirectoryMirror, RetryPolicy, SyncStatus};
use crate::report::{PhraseReport, RelatedLimits, Report};
use crate::speller::spell;
use crate::store;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kryon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kryon-33 word encoder: codes, harmonic metrics and library lookup")]
#[command(
    long_about = "Kryon-33 - a deterministic encoder for Russian words\n\n\
    Every word is reduced to an integer code L1 over the 33-letter alphabet. L1 is\n\
    spelled out in words, which give a second code L2C. From the pair come W, C, Hm\n\
    and Z, the Q and FII composites, a W cluster and an archetype resonance pair.\n\n\
    Examples:\n\
      kryon analyze ГАРМОНИЯ\n\
      kryon analyze 21.06.1992 --json --full\n\
      kryon phrase \"свет, мир; дом\"\n\
      kryon library add \"мир, свет\" --sphere природа\n\
      kryon library match ГАРМОНИЯ"
)]
#[command(author = "Kryon Encoder Contributors")]
pub struct Cli {
    /// Configuration file (sigma_Z, resonator_threshold, cluster_bounds)
    #[arg(long, global = true, default_value = "config.json", value_name = "FILE")]
    pub config: PathBuf,

    /// Directory holding the sphere_*.csv library files
    #[arg(long, global = true, default_value = "spheres", value_name = "DIR")]
    pub library: PathBuf,

    /// Mirror saved library files into this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub mirror: Option<PathBuf>,

    /// Enable verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a word, phrase or DD.MM.YYYY date
    #[command(
        long_about = "Analyse a word, phrase or date\n\n\
        Dates such as 21.06.1992 are replaced by their spelled-out Russian phrase before\n\
        encoding. Characters outside the alphabet are ignored.\n\n\
        Example:\n\
          kryon analyze ГАРМОНИЯ\n\
          kryon analyze свет --json --full --out report.json"
    )]
    Analyze {
        /// Input text
        #[arg(value_name = "TEXT")]
        text: String,

        /// Print the JSON report instead of the text summary
        #[arg(long)]
        json: bool,

        /// Include related library words in the JSON report
        #[arg(long)]
        full: bool,

        /// Write the JSON report to this file
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Analyse every word of a phrase
    Phrase {
        /// Words separated by spaces, commas or semicolons
        #[arg(value_name = "TEXT")]
        text: String,

        /// Print the JSON document
        #[arg(long)]
        json: bool,
    },

    /// Build a result from an integral profile (W, C, Hm, Z) without unfolding
    Profile {
        #[arg(long)]
        w: f64,
        #[arg(long)]
        c: f64,
        #[arg(long)]
        hm: f64,
        #[arg(long)]
        z: f64,
        /// Optional Φ alignment
        #[arg(long)]
        phi: Option<f64>,
        /// Label shown as the input
        #[arg(long, default_value = "profile")]
        label: String,
        /// Print the full JSON report
        #[arg(long)]
        json: bool,
    },

    /// Show the fractal unfolding of a code
    Unfold {
        #[arg(value_name = "L1")]
        l1: i64,
    },

    /// Spell a number 0..=999999 in Russian words
    Spell {
        #[arg(value_name = "N")]
        n: u32,
    },

    /// Convert a DD.MM.YYYY date to its Russian phrase
    Date {
        #[arg(value_name = "DATE")]
        text: String,
    },

    /// Manage the word library
    #[command(subcommand)]
    Library(LibraryCommand),

    /// Show or change the encoder configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
pub enum LibraryCommand {
    /// Add words separated by newlines, commas or semicolons
    Add {
        #[arg(value_name = "WORDS")]
        words: String,
        /// Sphere tag for the new words
        #[arg(short, long, default_value = "")]
        sphere: String,
    },
    /// Merge a JSON import ({"library": [...]} or a bare list)
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Canonicalize the library and recompute every entry
    Dedup,
    /// Counts, means and the quality summary
    Stats,
    /// List sphere tags
    Spheres,
    /// Filtered view sorted by Z
    Find {
        /// Sphere substring
        #[arg(long, default_value = "")]
        sphere: String,
        /// Diagnostic cluster: phi, e, e-pi, pi, rt2
        #[arg(long)]
        cluster: Option<String>,
        /// Word substring
        #[arg(long, default_value = "")]
        search: String,
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Words sharing codes with, or lying near, an input
    Match {
        #[arg(value_name = "TEXT")]
        text: String,
        #[arg(short, long, default_value_t = 30)]
        limit: usize,
    },
    /// Write the library as JSON or as a bincode snapshot (.bin)
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the active configuration
    Show,
    /// Change tunables and recompute the library
    Set {
        #[arg(long)]
        sigma: Option<f64>,
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Restore defaults and recompute the library
    Reset,
}

#[cfg(feature = "logging")]
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(not(feature = "logging"))]
fn init_logging(_verbose: bool) {}

fn header(verbose: bool, title: &str) {
    if verbose {
        println!("Kryon-33 {ENCODER_VERSION} ({CALC_VERSION}) - {title}");
        println!("{}", "=".repeat(title.len() + 30));
    }
}

fn open_library(cli: &Cli, config: EncoderConfig) -> anyhow::Result<Library> {
    let (library, report) = Library::open(&cli.library, config)
        .with_context(|| format!("loading library from {}", cli.library.display()))?;
    if cli.verbose && !report.skips.is_empty() {
        println!("Skipped {} unparseable numeric cells", report.skips.len());
        for skip in &report.skips {
            println!("  row {} column {}: {:?}", skip.row, skip.column, skip.raw);
        }
    }
    Ok(match &cli.mirror {
        Some(dir) => library.with_mirror(Box::new(DirectoryMirror::new(dir)), RetryPolicy::default()),
        None => library,
    })
}

fn print_outcome(outcome: &MutationOutcome) {
    println!("Offered: {}  |  Library size: {}", outcome.offered, outcome.total);
    for path in &outcome.written {
        println!("  saved {}", path.display());
    }
    match &outcome.sync {
        SyncStatus::Committed => println!("Mirror: committed"),
        SyncStatus::Disabled => {}
        SyncStatus::Failed(warning) => println!("Mirror: {warning}"),
    }
}

fn print_result(res: &AnalysisResult) {
    let m = &res.metrics;
    println!("Input: {}", res.input);
    if res.phrase_used != res.input {
        println!("Phrase: {}", res.phrase_used);
    }
    println!("L1 = {}  |  L2C = {}", res.l1, res.l2c);
    println!("W  {:.3}", m.w);
    println!("C  {:.2}  {}", m.c, metric_bar(m.c));
    println!("Hm {:.2}  {}", m.hm, metric_bar(m.hm));
    println!("Z  {:.2}  {}", m.z, metric_bar(m.z));
    println!("Q  {:.2}  {}", res.q, res.q_bar());
    let cat = res.fii_category();
    println!("FII {:+.1}  {}  {} - {}", res.fii, res.fii_bar(), cat.label(), cat.description());
    println!("Cluster: {} ({})  {}", res.cluster.code(), res.cluster.label(), res.cluster.advice());
    if res.resonance.is_named() {
        println!(
            "Resonance: {} {} / {} ({:.3})",
            res.resonance.code, res.resonance.en, res.resonance.ru, res.resonance.strength
        );
    } else {
        println!("Resonance: below threshold ({:.3})", res.resonance.strength);
    }
    let s = &res.space;
    println!(
        "Space: φ {:.3}  e {:.3}  π {:.3}  √2 {:.3}  max {}",
        s.r_phi,
        s.r_e,
        s.r_pi,
        s.r_rt2,
        s.max.symbol()
    );
    if let Some(f) = &res.fractal {
        println!(
            "Fractal: {}  inhale {} / exhale {}  ({})",
            f.pattern,
            f.inhale,
            f.exhale,
            f.interpretation.describe()
        );
    }
    if let (Some(ch), Some(kind)) = (res.first_letter, res.impulse.type_name) {
        println!(
            "Impulse: {ch} = {}  {kind}, {}, {}",
            res.first_value.unwrap_or_default(),
            res.impulse.action.unwrap_or_default(),
            res.impulse.phase.unwrap_or_default()
        );
    }
    println!("Guidance: {}", res.guidance());
}

fn write_or_print(json: &str, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            store::atomic_write(path, json.as_bytes())?;
            println!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = EncoderConfig::load_or_default(&cli.config);

    match &cli.command {
        Commands::Analyze {
            text,
            json,
            full,
            out,
        } => {
            header(cli.verbose, "Word Analysis");
            let res = match analyze_word(text, &config) {
                Ok(res) => res,
                Err(err) => {
                    println!("{}", err.user_message());
                    return Ok(());
                }
            };
            if *json || out.is_some() {
                let report = if *full {
                    let library = open_library(&cli, config)?;
                    Report::with_related(&res, &library.snapshot().index, RelatedLimits::default())
                } else {
                    Report::new(&res)
                };
                write_or_print(&report.to_json()?, out.as_deref())?;
            } else {
                print_result(&res);
            }
            Ok(())
        }

        Commands::Phrase { text, json } => {
            header(cli.verbose, "Phrase Analysis");
            let analysis = analyze_phrase(text, &config);
            if *json {
                println!("{}", PhraseReport::new(&analysis).to_json()?);
                return Ok(());
            }
            if analysis.words.is_empty() {
                println!("No valid words.");
                return Ok(());
            }
            for item in &analysis.words {
                println!(
                    "{:<20} L1 {:>6}  L2C {:>6}  W {:.3}  C {:.3}  Hm {:.3}  Z {:.3}",
                    item.word, item.l1, item.l2c, item.w, item.c, item.hm, item.z
                );
            }
            let note = if analysis.truncated { " (truncated)" } else { "" };
            println!(
                "Words: {}{note}  |  mean W = {:.2}  |  mean Z = {:.2}",
                analysis.words.len(),
                analysis.mean_w.unwrap_or_default(),
                analysis.mean_z.unwrap_or_default()
            );
            Ok(())
        }

        Commands::Profile {
            w,
            c,
            hm,
            z,
            phi,
            label,
            json,
        } => {
            header(cli.verbose, "Profile Analysis");
            let library = open_library(&cli, config.clone())?;
            let snap = library.snapshot();
            let profile = Profile {
                w: *w,
                c: *c,
                hm: *hm,
                z: *z,
                phi: *phi,
            };
            let res = analyze_profile(label, profile, Some(&snap.index), &config);
            if *json {
                let report = Report::with_related(&res, &snap.index, RelatedLimits::default());
                println!("{}", report.to_json()?);
            } else {
                print_result(&res);
            }
            Ok(())
        }

        Commands::Unfold { l1 } => {
            let f = unfold(*l1, &config);
            if f.is_sentinel() {
                println!("{}", EncoderError::OutOfRange { l1: *l1 }.user_message());
                return Ok(());
            }
            println!("Pattern: {}", f.pattern);
            println!("Inhale: {}  Exhale: {}  R = {:.2}", f.inhale, f.exhale, f.ratio);
            println!("Interpretation: {}", f.interpretation.describe());
            if cli.verbose {
                for (i, w) in f.w_values.iter().enumerate() {
                    println!("  step {:>2}: W = {w:.4}", i + 1);
                }
            }
            Ok(())
        }

        Commands::Spell { n } => {
            match spell(*n) {
                Some(words) => println!("{words}"),
                None => println!("{}", EncoderError::OutOfRange { l1: i64::from(*n) }.user_message()),
            }
            Ok(())
        }

        Commands::Date { text } => {
            match parse_date_phrase(text) {
                Some((phrase, stamp)) => {
                    println!("{phrase}");
                    if cli.verbose {
                        println!("({stamp})");
                    }
                }
                None => println!("Not a valid DD.MM.YYYY date."),
            }
            Ok(())
        }

        Commands::Library(cmd) => run_library(&cli, cmd, config),

        Commands::Config(cmd) => run_config(&cli, cmd, config),
    }
}

fn run_library(cli: &Cli, cmd: &LibraryCommand, config: EncoderConfig) -> anyhow::Result<()> {
    let library = open_library(cli, config.clone())?;
    match cmd {
        LibraryCommand::Add { words, sphere } => {
            header(cli.verbose, "Library Add");
            match library.add_words(words, sphere) {
                Ok(outcome) => print_outcome(&outcome),
                Err(EncoderError::NoLetters) => println!("No valid words (Cyrillic) found."),
                Err(err) => return Err(err.into()),
            }
        }

        LibraryCommand::Import { file } => {
            header(cli.verbose, "Library Import");
            let json = fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            print_outcome(&library.import_json(&json)?);
        }

        LibraryCommand::Dedup => {
            header(cli.verbose, "Library Dedup");
            let entries = library.snapshot().entries.clone();
            print_outcome(&library.replace(entries)?);
        }

        LibraryCommand::Stats => {
            let stats = library.stats();
            println!(
                "Words: {}  |  Spheres: {}  |  mean W = {:.2}  |  mean Z = {:.2}",
                stats.count, stats.num_spheres, stats.w_mean, stats.z_mean
            );
            let q = library.quality_summary();
            println!("Zone 2±0.4: {:.1}%  |  Edge (W<0.7 or W>4.0): {}", q.zone_percent, q.edge);
            for (cluster, count) in &q.clusters {
                println!("  {:<5} {count}", cluster.code());
            }
            if !q.top_spheres.is_empty() {
                println!("Top spheres:");
                for s in &q.top_spheres {
                    println!("  {:<24} {:>5} words  mean Z {:.3}", s.sphere, s.count, s.z_mean);
                }
            }
            if let Some(digest) = library.sources_digest()? {
                println!("Sources sha256: {digest}");
            }
        }

        LibraryCommand::Spheres => {
            for sphere in library.spheres() {
                println!("{sphere}");
            }
        }

        LibraryCommand::Find {
            sphere,
            cluster,
            search,
            limit,
        } => {
            let cluster = match cluster.as_deref() {
                Some(code) => match DiagnosticCluster::from_code(code) {
                    Some(c) => Some(c),
                    None => bail!("unknown cluster {code:?}; expected phi, e, e-pi, pi or rt2"),
                },
                None => None,
            };
            let filter = ViewFilter {
                sphere: sphere.clone(),
                cluster,
                search: search.clone(),
            };
            for row in library.filter(&filter).into_iter().take(*limit) {
                let e = &row.entry;
                println!(
                    "{:<20} {:<20} W {:>7.3}  Z {:.3}  {}",
                    e.word,
                    e.sphere,
                    e.w.unwrap_or(f64::NAN),
                    e.z.unwrap_or(f64::NAN),
                    row.cluster.map(DiagnosticCluster::code).unwrap_or("-")
                );
            }
        }

        LibraryCommand::Match { text, limit } => {
            let res = match analyze_word(text, &config) {
                Ok(res) => res,
                Err(err) => {
                    println!("{}", err.user_message());
                    return Ok(());
                }
            };
            let snap = library.snapshot();
            let matches = snap
                .index
                .matches_by_code(res.l1, res.l2c, &res.normalized, *limit);
            let m = res.metrics;
            let near = snap.index.near_contrast([m.w, m.c, m.z], &res.normalized, 5, 5);
            let join = |words: &[String]| {
                if words.is_empty() {
                    "-".to_string()
                } else {
                    words.join(" · ")
                }
            };
            let fmt = |ns: &[crate::index::Neighbor]| {
                let words: Vec<String> =
                    ns.iter().map(|n| format!("{} ({:.2})", n.word, n.distance)).collect();
                join(&words)
            };
            println!("{} (L1 {}, L2C {})", res.normalized, res.l1, res.l2c);
            println!("Same L1:  {}", join(&matches.by_l1));
            println!("Same L2C: {}", join(&matches.by_l2c));
            println!("Near:     {}", fmt(&near.near));
            println!("Contrast: {}", fmt(&near.contrast));
        }

        LibraryCommand::Export { file } => {
            let entries = library.snapshot().entries.clone();
            if file.extension().and_then(|e| e.to_str()) == Some("bin") {
                store::save_snapshot(file, &entries)?;
            } else {
                let doc = LibraryExport { library: entries };
                store::atomic_write(file, serde_json::to_string_pretty(&doc)?.as_bytes())?;
            }
            println!("Exported to {}", file.display());
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, cmd: &ConfigCommand, config: EncoderConfig) -> anyhow::Result<()> {
    let next = match cmd {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        ConfigCommand::Set { sigma, threshold } => {
            let sigma = sigma.unwrap_or(config.sigma_z);
            let threshold = threshold.unwrap_or(config.resonator_threshold);
            config.with_values(sigma, threshold, None)?
        }
        ConfigCommand::Reset => EncoderConfig::default(),
    };
    next.save(&cli.config)
        .with_context(|| format!("writing {}", cli.config.display()))?;
    println!("Saved {}", cli.config.display());

    let library = open_library(cli, config)?;
    if !library.is_empty() {
        print_outcome(&library.set_config(next)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn library_find_parses_cluster_and_globals() {
        let cli = Cli::try_parse_from([
            "kryon",
            "library",
            "find",
            "--cluster",
            "rt2",
            "--library",
            "/tmp/lib",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.library, PathBuf::from("/tmp/lib"));
        match cli.command {
            Commands::Library(LibraryCommand::Find { cluster, limit, .. }) => {
                assert_eq!(cluster.as_deref(), Some("rt2"));
                assert_eq!(limit, 50);
            }
            _ => panic!("expected library find"),
        }
    }
}
