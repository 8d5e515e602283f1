use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kryon_encoder::{analyze_word, dedup, spell, unfold, EncoderConfig, Entry, LibraryIndex};

const SAMPLE: &[&str] = &[
    "ГАРМОНИЯ", "СВЕТ", "МИР", "РИМ", "ДОМ", "ПУТЬ", "ДВИЖЕНИЕ", "ПРОЦЕСС", "ЗЕРКАЛО", "ОТРАЖЕНИЕ",
    "РАВНОВЕСИЕ", "СПОКОЙСТВИЕ", "ВРЕМЯ", "ПРОСТРАНСТВО", "ЗВЕЗДА", "ВОДА",
];

fn library(cfg: &EncoderConfig, copies: usize) -> Vec<Entry> {
    (0..copies)
        .flat_map(|i| {
            SAMPLE
                .iter()
                .map(move |w| Entry::new(w, &format!("сфера-{}", i % 8), "neutral", cfg))
        })
        .collect()
}

fn bench_word_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("word_ops");
    let cfg = EncoderConfig::default();

    group.bench_function("spell_6_digits", |bencher| {
        bencher.iter(|| spell(black_box(987_654)))
    });

    group.bench_function("analyze_word", |bencher| {
        bencher.iter(|| analyze_word(black_box("ГАРМОНИЯ"), &cfg))
    });

    group.bench_function("analyze_date", |bencher| {
        bencher.iter(|| analyze_word(black_box("21.06.1992"), &cfg))
    });

    group.bench_function("unfold", |bencher| {
        bencher.iter(|| unfold(black_box(4_321), &cfg))
    });

    group.finish();
}

fn bench_library_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("library_ops");
    let cfg = EncoderConfig::default();

    for copies in [4usize, 32, 128] {
        let entries = library(&cfg, copies);

        group.bench_with_input(BenchmarkId::new("dedup", entries.len()), &entries, |bencher, e| {
            bencher.iter(|| dedup(black_box(e.clone()), &cfg))
        });

        let canon = dedup(entries.clone(), &cfg);
        let index = LibraryIndex::rebuild(&canon);
        group.bench_with_input(BenchmarkId::new("rebuild_index", canon.len()), &canon, |bencher, e| {
            bencher.iter(|| LibraryIndex::rebuild(black_box(e)))
        });

        group.bench_with_input(BenchmarkId::new("near_contrast", canon.len()), &index, |bencher, idx| {
            bencher.iter(|| idx.near_contrast(black_box([2.0, 0.5, 0.5]), "МИР", 50, 50))
        });

        group.bench_with_input(BenchmarkId::new("autopick", canon.len()), &index, |bencher, idx| {
            bencher.iter(|| idx.autopick(black_box(1.8)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_word_ops, bench_library_ops);
criterion_main!(benches);
