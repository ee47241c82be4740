//! Criterion benchmarks for the per-character hot path.
//!
//! Playback resolves a method, encodes UTF-16 and (for layout replay) builds
//! a key sequence for every character typed; calibration rebuilds the probe
//! set once per run.  These should all stay well below the inter-character
//! delay.
//!
//! Run with:
//! ```bash
//! cargo bench --package vkb-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vkb_core::{CalibrationMap, InjectionMethod, KeyStroke, ProbeSet, Utf16Units};

// ── Representative inputs ─────────────────────────────────────────────────────

/// A short mixed-script sentence typical of what gets pasted for playback.
const BENCH_TEXT: &str = "Año 2024: ¿Está todo bien? ✔ Sí, 100% 📋🚀 [ok] {fin}";

/// Raw `VkKeyScanW` results: plain, Shift, AltGr, and unrepresentable.
const BENCH_SCAN_RESULTS: &[i16] = &[0x0041, 0x0141, 0x0632, -1];

fn calibrated_map() -> CalibrationMap {
    ProbeSet::standard()
        .iter()
        .enumerate()
        .map(|(i, ch)| {
            let method = if i % 4 == 0 {
                InjectionMethod::LayoutReplay
            } else {
                InjectionMethod::Unicode
            };
            (ch, method)
        })
        .collect()
}

// ── Benchmarks: probe set ─────────────────────────────────────────────────────

fn bench_probe_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("probe_set");

    group.bench_function("standard_build", |b| b.iter(ProbeSet::standard));

    group.finish();
}

// ── Benchmarks: method resolution ─────────────────────────────────────────────

fn bench_method_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_resolve");
    let map = calibrated_map();

    for (label, ch) in [("mapped", 'á'), ("unmapped", '中')] {
        group.bench_with_input(BenchmarkId::new("method_for", label), &ch, |b, &ch| {
            b.iter(|| map.method_for(black_box(ch)))
        });
    }

    group.bench_function("method_for_sentence", |b| {
        b.iter(|| {
            BENCH_TEXT
                .chars()
                .map(|ch| map.method_for(black_box(ch)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

// ── Benchmarks: encoding ──────────────────────────────────────────────────────

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");

    group.bench_function("utf16_sentence", |b| {
        b.iter(|| {
            BENCH_TEXT
                .chars()
                .map(|ch| Utf16Units::encode(black_box(ch)).len())
                .sum::<usize>()
        })
    });

    group.bench_function("scan_decode_and_replay", |b| {
        b.iter(|| {
            BENCH_SCAN_RESULTS
                .iter()
                .filter_map(|&raw| KeyStroke::from_scan_result(black_box(raw)))
                .map(|stroke| stroke.replay_sequence().len())
                .sum::<usize>()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_probe_set, bench_method_resolution, bench_encoding);
criterion_main!(benches);
