//! Benchmark of a single tracker update on synthetic frames

use criterion::{criterion_group, criterion_main, Criterion};
use similarity_tracker::{Frame, Region, SimilarityTracker, TrackerConfig};

const FRAME_SIZE: u32 = 240;

fn square_frame(top_left: (u32, u32)) -> Frame {
    Frame::with_square(FRAME_SIZE, FRAME_SIZE, top_left, 40, [230, 60, 40], [20, 20, 30]).expect("Failed to build frame")
}

fn initialised_tracker(config: TrackerConfig) -> SimilarityTracker {
    let mut tracker = SimilarityTracker::new(config).expect("Failed to create tracker");
    let region = Region::from_values(&[100.0, 100.0, 40.0, 40.0], false).expect("Invalid region");
    tracker
        .init(&square_frame((100, 100)), &region)
        .expect("Failed to initialise tracker");
    tracker
}

fn benchmark_tracker_update(c: &mut Criterion) {
    // Configure criterion with smaller sample size
    let mut group = c.benchmark_group("similarity_tracker_update");
    group.sample_size(10);

    let next = square_frame((104, 102));

    let mut axis_aligned = initialised_tracker(TrackerConfig::default());
    group.bench_function("update_axis_aligned", |b| {
        b.iter(|| {
            let _region = axis_aligned.update(&next).expect("update failed");
        })
    });

    let mut rotating = initialised_tracker(TrackerConfig::rotation());
    group.bench_function("update_rotation_refinement", |b| {
        b.iter(|| {
            let _region = rotating.update(&next).expect("update failed");
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_tracker_update);
criterion_main!(benches);
