use feral_field::{NoiseConfig, NoiseField};
use feral_nav::Vec3;

#[test]
fn burst_decays_to_nothing_by_max_life() {
    let mut field = NoiseField::new(NoiseConfig {
        max_life: 2.0,
        ..NoiseConfig::default()
    });
    let p = Vec3::new(3.0, 0.0, 3.0);
    field.register_burst(p, 8.0);

    let mut last = f32::INFINITY;
    for _ in 0..19 {
        field.advance(0.1);
        if let Some(hot) = field.query_hottest(p, 1.0) {
            assert!(hot.magnitude < last, "monotone decay");
            last = hot.magnitude;
        }
    }

    field.advance(0.1);
    assert_eq!(field.query_hottest(p, 1.0), None, "expired at max life");
    assert!(field.is_empty(), "spent records are dropped");
}

#[test]
fn query_never_returns_an_expired_burst() {
    let mut field = NoiseField::new(NoiseConfig {
        max_life: 1.0,
        ..NoiseConfig::default()
    });
    field.register_burst(Vec3::ZERO, 4.0);
    field.register_burst(Vec3::new(20.0, 0.0, 0.0), 1.0);

    // First record expires; the far one was registered in the same frame
    // and dies with it.
    field.advance(1.0);
    assert_eq!(field.query_hottest(Vec3::ZERO, 50.0), None);
}

#[test]
fn reinforcement_refreshes_life() {
    let mut field = NoiseField::new(NoiseConfig {
        max_life: 2.0,
        ..NoiseConfig::default()
    });
    let p = Vec3::new(1.0, 0.0, 1.0);
    field.register_burst(p, 4.0);
    field.advance(1.5);

    // Half a second of life left; a fresh burst resets the clock.
    field.register_burst(p, 1.0);
    field.advance(1.5);
    let hot = field.query_hottest(p, 1.0).expect("still live");
    assert!(hot.magnitude > 0.0);
}

#[test]
fn loud_burst_is_immediately_hottest_at_its_point() {
    // A magnitude-8 burst at P: queryable at P right away, gone after
    // enough decay.
    let mut field = NoiseField::default();
    let p = Vec3::new(7.0, 0.0, 2.0);
    field.register_burst(p, 8.0);

    let hot = field.query_hottest(p, 1.0).expect("fresh burst is hot");
    assert_eq!(hot.position, p);
    assert!((hot.magnitude - 8.0).abs() < 1e-5);

    let life = field.config().max_life;
    for _ in 0..((life / 0.25) as u32 + 1) {
        field.advance(0.25);
    }
    assert_eq!(field.query_hottest(p, 1.0), None);
}
