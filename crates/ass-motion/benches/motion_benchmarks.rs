//! Benchmarks for motion application
//!
//! Generates synthetic After Effects keyframe data of increasing length and
//! applies it to a single tag-heavy line, in both output modes.

use ass_motion::{ConstantFrameRate, DataHandler, Dialogue, MotionOptions, MotionProcessor, Style};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fmt::Write;

/// Keyframe data for a point circling the frame centre while growing and turning
fn keyframe_data(frames: usize) -> String {
    let mut data = String::from(
        "Adobe After Effects 6.0 Keyframe Data\n\
         \tUnits Per Second\t25\n\
         \tSource Width\t1920\n\
         \tSource Height\t1080\n\n\
         Position\n\tFrame\tX pixels\tY pixels\tZ pixels\n",
    );
    for frame in 0..frames {
        let t = frame as f64 / 25.0;
        let _ = writeln!(
            data,
            "\t{}\t{:.3}\t{:.3}\t0",
            frame + 1,
            960.0 + 300.0 * t.cos(),
            540.0 + 200.0 * t.sin()
        );
    }
    data.push_str("\nScale\n\tFrame\tX percent\tY percent\tZ percent\n");
    for frame in 0..frames {
        let scale = 100.0 + frame as f64 * 0.25;
        let _ = writeln!(data, "\t{}\t{scale:.3}\t{scale:.3}\t100", frame + 1);
    }
    data.push_str("\nRotation\n\tFrame\tDegrees\n");
    for frame in 0..frames {
        let _ = writeln!(data, "\t{}\t{:.3}", frame + 1, frame as f64 * 0.5);
    }
    data.push_str("\nEnd of Keyframe Data\n");
    data
}

fn sign_line(frames: usize) -> Dialogue {
    Dialogue::new(
        0,
        frames as i64 * 40,
        "Default",
        r"{\pos(960,540)\fscx100\fscy100\bord3\shad1\blur0.6\frz5\clip(m 900 500 l 1020 500 1020 580 900 580)\t(0,2000,\frz30)}SIGN{\fscx80}text",
    )
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");
    let fps = ConstantFrameRate::new(25, 1);
    let styles = vec![Style::default()];

    for &frames in &[24usize, 240, 1000] {
        let data = keyframe_data(frames);
        let lines = [sign_line(frames)];
        group.throughput(Throughput::Elements(frames as u64));

        let per_frame = MotionOptions::default()
            .position(true)
            .scale(true)
            .rotation(true)
            .clips(true);
        let processor = MotionProcessor::new(&fps, &styles, 1920.0, 1080.0, per_frame);
        group.bench_with_input(BenchmarkId::new("per_frame", frames), &data, |b, data| {
            b.iter(|| processor.apply(black_box(&lines), black_box(data), None));
        });

        let baked = MotionOptions::default()
            .position(true)
            .scale(true)
            .rotation(true)
            .kill_trans(true);
        let processor = MotionProcessor::new(&fps, &styles, 1920.0, 1080.0, baked);
        group.bench_with_input(BenchmarkId::new("baked", frames), &data, |b, data| {
            b.iter(|| processor.apply(black_box(&lines), black_box(data), None));
        });

        let linear = MotionOptions::default().position(true).scale(true).linear(true);
        let processor = MotionProcessor::new(&fps, &styles, 1920.0, 1080.0, linear);
        group.bench_with_input(BenchmarkId::new("linear", frames), &data, |b, data| {
            b.iter(|| processor.apply(black_box(&lines), black_box(data), None));
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for &frames in &[240usize, 5000] {
        let data = keyframe_data(frames);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("keyframes", frames), &data, |b, data| {
            b.iter(|| DataHandler::parse(black_box(data), 1920.0, 1080.0));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_apply, bench_parse);
criterion_main!(benches);
