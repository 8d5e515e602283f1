//! Property tests for the encoder, dedup and the library index

use kryon_encoder::dedup::DedupKey;
use kryon_encoder::fractal::MAX_STEPS;
use kryon_encoder::index::Axis;
use kryon_encoder::{
    analyze_word, dedup, normalize, unfold, EncoderConfig, Encoding, Entry, LibraryIndex,
};
use proptest::prelude::*;
use std::collections::HashSet;

const WORDS: &[&str] = &[
    "мир", "МИР", "рим", "свет", "дом", "гармония", "путь", "Ёж", "42", "",
];
const SPHERES: &[&str] = &["", "природа", " природа ", "дом", "nan"];
const TONES: &[&str] = &["", "neutral", "warm"];
const NOTES: &[&str] = &["", "a", "b", "a | b", "nan"];

fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        prop::sample::select(WORDS),
        prop::sample::select(SPHERES),
        prop::sample::select(TONES),
        prop::sample::select(NOTES),
        any::<bool>(),
    )
        .prop_map(|(word, sphere, tone, notes, allowed)| {
            let mut e = Entry::new(word, sphere, tone, &EncoderConfig::default());
            e.notes = notes.to_string();
            e.allowed = allowed;
            e
        })
}

proptest! {
    #[test]
    fn dedup_is_idempotent(entries in prop::collection::vec(arb_entry(), 0..24)) {
        let cfg = EncoderConfig::default();
        let once = dedup(entries, &cfg);
        let twice = dedup(once.clone(), &cfg);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn dedup_keys_are_unique(entries in prop::collection::vec(arb_entry(), 0..24)) {
        let cfg = EncoderConfig::default();
        let out = dedup(entries.clone(), &cfg);
        let keys: HashSet<DedupKey> = out.iter().filter_map(DedupKey::of).collect();
        prop_assert_eq!(keys.len(), out.len());

        let expected: HashSet<DedupKey> = entries.iter().filter_map(DedupKey::of).collect();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn dedup_allowed_is_or_over_group(entries in prop::collection::vec(arb_entry(), 1..24)) {
        let cfg = EncoderConfig::default();
        let out = dedup(entries.clone(), &cfg);
        for row in &out {
            let key = DedupKey::of(row);
            let any_allowed = entries
                .iter()
                .filter(|e| DedupKey::of(e) == key)
                .any(|e| e.allowed);
            prop_assert_eq!(row.allowed, any_allowed);
        }
    }

    #[test]
    fn index_lists_every_word_under_its_codes(entries in prop::collection::vec(arb_entry(), 0..24)) {
        let cfg = EncoderConfig::default();
        let canon = dedup(entries, &cfg);
        let index = LibraryIndex::rebuild(&canon);
        for e in &canon {
            let (Some(l1), Some(l2c)) = (e.l1, e.l2c) else {
                continue;
            };
            prop_assert!(index.lookup(l1, Axis::L1, "", usize::MAX).contains(&e.word));
            prop_assert!(index.lookup(l2c, Axis::L2C, "", usize::MAX).contains(&e.word));
            prop_assert!(!index.lookup(l1, Axis::L1, &e.word, usize::MAX).contains(&e.word));
        }
    }

    #[test]
    fn near_and_contrast_are_disjoint(
        entries in prop::collection::vec(arb_entry(), 0..24),
        w in 0.5f64..4.0,
        c in 0.0f64..1.0,
        z in 0.0f64..1.0,
    ) {
        let cfg = EncoderConfig::default();
        let index = LibraryIndex::rebuild(&dedup(entries, &cfg));
        let prox = index.near_contrast([w, c, z], "", 50, 50);
        let near: HashSet<&str> = prox.near.iter().map(|n| n.word.as_str()).collect();
        prop_assert_eq!(near.len(), prox.near.len());
        for n in &prox.near {
            prop_assert!(n.distance <= 0.30 + 1e-9);
        }
        for n in &prox.contrast {
            prop_assert!(!near.contains(n.word.as_str()));
            prop_assert!(n.distance >= 0.20 && n.distance <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn normalize_is_idempotent(s in "\\PC{0,24}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once.clone());
    }

    #[test]
    fn metrics_stay_in_range(l1 in 1i64..=999_999, sigma in 0.05f64..2.0) {
        let cfg = EncoderConfig::default().with_values(sigma, 0.75, None).unwrap();
        let enc = Encoding::compute(l1, &cfg).unwrap();
        let m = enc.metrics;
        prop_assert!(m.w > 0.0);
        for score in [m.c, m.hm, m.z] {
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn analysis_is_deterministic(word in "[а-яё]{1,12}") {
        let cfg = EncoderConfig::default();
        let a = analyze_word(&word, &cfg).unwrap();
        let b = analyze_word(&word.to_uppercase(), &cfg).unwrap();
        prop_assert_eq!(a.l1, b.l1);
        prop_assert_eq!(a.l2c, b.l2c);
        prop_assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn unfolding_always_terminates(l1 in 1i64..=999_999) {
        let f = unfold(l1, &EncoderConfig::default());
        prop_assert_eq!(f.w_values.len(), MAX_STEPS);
        prop_assert_eq!(f.inhale + f.exhale, MAX_STEPS - 1);
    }
}
