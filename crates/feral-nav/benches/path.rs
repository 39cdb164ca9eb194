use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feral_nav::{Aabb, NavQuery, RoomNav, Vec3};

fn arena() -> RoomNav {
    RoomNav::new(40.0, 40.0, 5.0)
        .with_obstacle(Aabb::new(Vec3::new(18.0, 0.0, 10.0), Vec3::new(22.0, 3.0, 30.0)))
        .with_obstacle(Aabb::new(Vec3::new(5.0, 0.0, 18.0), Vec3::new(12.0, 3.0, 22.0)))
}

fn bench_find_path(c: &mut Criterion) {
    let nav = arena();
    let start = Vec3::new(2.0, 0.0, 20.0);
    let goal = Vec3::new(38.0, 0.0, 20.0);

    c.bench_function("feral-nav/find_path(dogleg)", |b| {
        b.iter(|| black_box(nav.find_path(black_box(start), black_box(goal))))
    });
}

fn bench_cast(c: &mut Criterion) {
    let nav = arena();
    let eye = Vec3::new(2.0, 0.5, 20.0);
    let dir = Vec3::new(1.0, 0.0, 0.0);

    c.bench_function("feral-nav/cast(wall)", |b| {
        b.iter(|| black_box(nav.cast(black_box(eye), black_box(dir), 50.0)))
    });
}

criterion_group!(benches, bench_find_path, bench_cast);
criterion_main!(benches);
