use criterion::{black_box, criterion_group, criterion_main, Criterion};

use strike_finder::detection::{diff, StrikeDetector};
use strike_finder::video::Frame;

fn bench_score(c: &mut Criterion) {
    let dark = Frame::new_black(1280, 720);
    let bright = Frame::new_filled(1280, 720, [230, 230, 255]);

    c.bench_function("score_720p_identical", |b| {
        b.iter(|| diff::score(black_box(&dark), black_box(&dark)))
    });
    c.bench_function("score_720p_flash", |b| {
        b.iter(|| diff::score(black_box(&dark), black_box(&bright)))
    });
}

fn bench_detector(c: &mut Criterion) {
    let frame = Frame::new_black(64, 64);
    let scores: Vec<u64> = (0..1000).map(|i| if i % 37 < 3 { 50_000 } else { 0 }).collect();

    c.bench_function("detector_1000_frames", |b| {
        b.iter(|| {
            let mut detector = StrikeDetector::new();
            for (i, &score) in scores.iter().enumerate() {
                black_box(detector.process(i as u64, score, 10_000, &frame));
            }
            detector.finish()
        })
    });
}

criterion_group!(benches, bench_score, bench_detector);
criterion_main!(benches);
