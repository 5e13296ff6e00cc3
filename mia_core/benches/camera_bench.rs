//! Criterion benchmarks for scalar camera math.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mia_core::prelude::*;

/// Skeleton-sized point set spread around the body origin.
fn make_skeleton(joints: usize) -> Vec<Point3> {
    (0..joints)
        .map(|i| {
            let t = i as f32 / joints as f32 * std::f32::consts::TAU;
            Point3::new(0.3 * t.cos(), 0.9 * t.sin(), 0.1 * (2.0 * t).cos())
        })
        .collect()
}

fn bench_weak_perspective(c: &mut Criterion) {
    let image = ImageSize::default();
    let bbox = BoundingBox::new(Point2::new(610.0, 1020.0), 380.0);
    let cam = WeakPerspectiveCamera::new(0.97, 0.03, -0.02);

    c.bench_function("weak_perspective_to_translation", |b| {
        b.iter(|| {
            weak_perspective_to_translation(
                black_box(cam),
                black_box(bbox),
                image,
                DEFAULT_FOCAL_LENGTH,
                DEFAULT_CROP_RESOLUTION,
            )
        })
    });
}

fn bench_projection(c: &mut Criterion) {
    let k = CameraIntrinsics::for_image(DEFAULT_FOCAL_LENGTH, ImageSize::default());
    let t = Point3::new(0.05, -0.1, 27.0);

    let mut group = c.benchmark_group("project_points");
    for joints in [25usize, 49, 128] {
        let skeleton = make_skeleton(joints);
        group.throughput(Throughput::Elements(joints as u64));
        group.bench_with_input(BenchmarkId::from_parameter(joints), &skeleton, |b, pts| {
            b.iter(|| project_points(black_box(pts), &Mat3::IDENTITY, t, &k))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_weak_perspective, bench_projection);
criterion_main!(benches);
