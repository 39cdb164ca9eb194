use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feral_nav::{Aabb, LightSource, RoomNav, Vec3};
use feral_planner::{score, DarknessProbe, SpotSurvey, SurveyConfig, WallProbe};

fn arena(points: usize) -> RoomNav {
    let samples: Vec<Vec3> = (0..points)
        .map(|i| Vec3::new(3.0 + (i % 8) as f32 * 5.0, 0.0, 3.0 + (i / 8) as f32 * 5.0))
        .collect();
    RoomNav::new(44.0, 44.0, 4.0)
        .with_obstacle(Aabb::new(Vec3::new(14.0, 0.0, 14.0), Vec3::new(18.0, 3.0, 30.0)))
        .with_obstacle(Aabb::new(Vec3::new(26.0, 0.0, 8.0), Vec3::new(30.0, 3.0, 12.0)))
        .with_lights(vec![LightSource {
            position: Vec3::new(22.0, 3.0, 22.0),
            range: 10.0,
            intensity: 1.2,
        }])
        .with_sample_points(samples)
}

fn ambush_score(nav: &dyn feral_nav::NavQuery, point: Vec3) -> f32 {
    score::wall_closeness(nav, point, WallProbe::default())
        + score::ambient_darkness(nav, point, DarknessProbe::default())
}

fn bench_survey(c: &mut Criterion) {
    let nav = arena(48);
    let anchor = Vec3::new(4.0, 0.0, 4.0);

    c.bench_function("feral-planner/survey_rebuild(points=48)", |b| {
        let mut survey = SpotSurvey::new(SurveyConfig::default());
        b.iter(|| {
            survey.invalidate();
            black_box(survey.select_best(&nav, anchor, 0.0, ambush_score, |_| 0.0))
        })
    });

    c.bench_function("feral-planner/survey_select_cached(points=48)", |b| {
        let mut survey = SpotSurvey::new(SurveyConfig::default().with_cooldown(1e9));
        survey.select_best(&nav, anchor, 0.0, ambush_score, |_| 0.0);
        let threat = Vec3::new(30.0, 0.0, 30.0);
        b.iter(|| {
            black_box(survey.select_best(&nav, anchor, 1.0, ambush_score, |p| {
                -p.distance(black_box(threat)) * 0.05
            }))
        })
    });
}

criterion_group!(benches, bench_survey);
criterion_main!(benches);
