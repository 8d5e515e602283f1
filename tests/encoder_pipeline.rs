//! End-to-end tests for word, date, phrase and profile analysis

use kryon_encoder::analysis::{AnalysisMode, PhraseAnalysis};
use kryon_encoder::classify::{cluster_by_w, diagnostic_cluster, DiagnosticCluster};
use kryon_encoder::report::{PhraseReport, RelatedLimits};
use kryon_encoder::{
    analyze_phrase, analyze_profile, analyze_word, encode, spell, unfold, Cluster, EncoderConfig,
    EncoderError, Entry, LibraryIndex, Profile, Report,
};

#[test]
fn test_word_pipeline_is_consistent() {
    let cfg = EncoderConfig::default();
    let res = analyze_word("  Гармония! ", &cfg).unwrap();

    let (norm, l1) = encode("ГАРМОНИЯ").unwrap();
    assert_eq!(res.normalized, norm);
    assert_eq!(res.l1, l1);
    assert_eq!(res.phrase_used, "  Гармония! ");

    // L2C is the code of the spelled-out L1
    let words = spell(l1).unwrap();
    assert_eq!(res.l2c, encode(&words).unwrap().1);

    let m = res.metrics;
    assert!((m.w - f64::from(res.l2c) / f64::from(res.l1)).abs() < 1e-12);
    for score in [m.c, m.hm, m.z] {
        assert!((0.0..=1.0).contains(&score));
    }
    assert_eq!(res.cluster, cluster_by_w(m.w));
    assert_eq!(res.first_letter, Some('Г'));
    assert_eq!(res.first_value, Some(4));
}

#[test]
fn test_same_input_same_result() {
    let cfg = EncoderConfig::default();
    let a = analyze_word("свет", &cfg).unwrap();
    let b = analyze_word("СВЕТ", &cfg).unwrap();
    assert_eq!(a.l1, b.l1);
    assert_eq!(a.l2c, b.l2c);
    assert_eq!(a.metrics, b.metrics);
    assert_eq!(a.fractal, b.fractal);
}

#[test]
fn test_date_input_uses_spelled_phrase() {
    let cfg = EncoderConfig::default();
    let res = analyze_word("01.01.2000", &cfg).unwrap();
    assert_eq!(res.input, "01.01.2000");
    assert!(res.phrase_used.chars().all(|c| !c.is_ascii_digit()));
    assert_eq!(res.l1, encode(&res.phrase_used).unwrap().1);
}

#[test]
fn test_invalid_date_falls_back_to_letters() {
    let cfg = EncoderConfig::default();
    // 31 February has no spelled form and no letters either
    let err = analyze_word("31.02.2000", &cfg).unwrap_err();
    assert!(matches!(err, EncoderError::NoLetters));
}

#[test]
fn test_letterless_input_is_no_result() {
    let cfg = EncoderConfig::default();
    assert!(matches!(
        analyze_word("hello, 42", &cfg),
        Err(EncoderError::NoLetters)
    ));
}

#[test]
fn test_unfold_matches_analysis() {
    let cfg = EncoderConfig::default();
    let res = analyze_word("мир", &cfg).unwrap();
    let direct = unfold(i64::from(res.l1), &cfg);
    assert_eq!(res.fractal.as_ref(), Some(&direct));
    assert!(unfold(1_000_000, &cfg).is_sentinel());
}

#[test]
fn test_sigma_changes_only_z() {
    let narrow = EncoderConfig::default().with_values(0.05, 0.6, None).unwrap();
    let wide = EncoderConfig::default().with_values(0.5, 0.6, None).unwrap();
    let a = analyze_word("ГАРМОНИЯ", &narrow).unwrap();
    let b = analyze_word("ГАРМОНИЯ", &wide).unwrap();
    assert_eq!(a.metrics.w, b.metrics.w);
    assert_eq!(a.metrics.c, b.metrics.c);
    assert_eq!(a.metrics.hm, b.metrics.hm);
    assert!(a.metrics.z <= b.metrics.z);
}

#[test]
fn test_phrase_skips_bad_tokens() {
    let cfg = EncoderConfig::default();
    let res: PhraseAnalysis = analyze_phrase("мир, 123; свет   дом", &cfg);
    let words: Vec<&str> = res.words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(words, vec!["МИР", "СВЕТ", "ДОМ"]);
    assert!(!res.truncated);

    let json: serde_json::Value =
        serde_json::from_str(&PhraseReport::new(&res).to_json().unwrap()).unwrap();
    assert_eq!(json["words"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["words"][0]["L1"], 42);
}

#[test]
fn test_profile_without_library() {
    let cfg = EncoderConfig::default();
    let profile = Profile {
        w: 1.5,
        c: 0.4,
        hm: 0.9,
        z: 0.7,
        phi: Some(0.2),
    };
    let res = analyze_profile("ручной", profile, None, &cfg);
    assert_eq!(res.mode, AnalysisMode::Profile { autopick: None });
    assert_eq!(res.metrics.w, 1.5);
    assert_eq!(res.cluster, Cluster::Phi);
    assert_eq!(res.phi_align, Some(0.2));
    assert!(res.fractal.is_none());
    assert!(res.first_letter.is_none());

    let report = Report::new(&res);
    assert!(report.fractal.pattern.is_none());
    assert_eq!(report.metrics.w, 1.5);
}

#[test]
fn test_profile_autopicks_from_library() {
    let cfg = EncoderConfig::default();
    let entries = vec![
        Entry::new("МИР", "прочее", "neutral", &cfg),
        Entry::new("РИМ", "прочее", "neutral", &cfg),
    ];
    let index = LibraryIndex::rebuild(&entries);
    let w = entries[0].w.unwrap();
    let profile = Profile {
        w,
        c: 0.5,
        hm: 0.5,
        z: 0.5,
        phi: None,
    };
    let res = analyze_profile("профиль", profile, Some(&index), &cfg);
    assert_eq!(res.l1, 42);
    assert_eq!(Some(res.l2c), entries[0].l2c);
    match &res.mode {
        AnalysisMode::Profile {
            autopick: Some(pick),
        } => assert_eq!(pick.hits, 2),
        other => panic!("expected autopick, got {other:?}"),
    }

    let report = Report::with_related(&res, &index, RelatedLimits::default());
    let related = report.related.unwrap();
    assert_eq!(related.by_l1, vec!["МИР", "РИМ"]);
}

#[test]
fn test_diagnostic_partition_boundaries() {
    assert_eq!(diagnostic_cluster(0.5), DiagnosticCluster::Phi);
    assert_eq!(diagnostic_cluster(1.1), DiagnosticCluster::Phi);
    // the √2 band overlaps phi and wins
    assert_eq!(diagnostic_cluster(1.5), DiagnosticCluster::Rt2);
    assert_eq!(diagnostic_cluster(3.0), DiagnosticCluster::EPi);
    // below W = 1 the two partitions disagree
    assert_eq!(cluster_by_w(0.5), Cluster::Pi);
}

#[test]
fn test_report_lists_shared_codes_on_both_axes() {
    let cfg = EncoderConfig::default();
    let entries = vec![
        Entry::new("МИР", "прочее", "neutral", &cfg),
        Entry::new("РИМ", "прочее", "neutral", &cfg),
    ];
    let index = LibraryIndex::rebuild(&entries);
    let res = analyze_word("мир", &cfg).unwrap();

    let related = Report::with_related(&res, &index, RelatedLimits::default())
        .related
        .unwrap();
    // РИМ is an anagram, so it matches on L1 and on L2C
    assert_eq!(related.by_l1, vec!["РИМ"]);
    assert_eq!(related.by_l2c, vec!["РИМ"]);
}
