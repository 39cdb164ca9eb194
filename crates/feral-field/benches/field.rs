use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feral_field::{NoiseConfig, NoiseField};
use feral_nav::Vec3;

fn bench_register_and_query(c: &mut Criterion) {
    let mut field = NoiseField::new(NoiseConfig::default());
    for i in 0..96 {
        field.register_burst(
            Vec3::new((i % 12) as f32 * 4.0, 0.0, (i / 12) as f32 * 4.0),
            1.0 + (i % 7) as f32,
        );
    }
    let origin = Vec3::new(20.0, 0.0, 16.0);

    c.bench_function("feral-field/query_hottest(records=96)", |b| {
        b.iter(|| black_box(field.query_hottest(black_box(origin), 25.0)))
    });

    c.bench_function("feral-field/advance(records=96)", |b| {
        b.iter(|| {
            let mut f = field.clone();
            f.advance(0.05);
            black_box(f.len())
        })
    });
}

criterion_group!(benches, bench_register_and_query);
criterion_main!(benches);
