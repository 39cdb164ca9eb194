use feral_nav::{Aabb, NavQuery, PathClass, RoomNav, Vec3};

fn room() -> RoomNav {
    // 20 x 20 room, 4-unit ceiling, one 2x2 pillar in the middle.
    RoomNav::new(20.0, 20.0, 4.0).with_obstacle(Aabb::new(
        Vec3::new(9.0, 0.0, 9.0),
        Vec3::new(11.0, 3.0, 11.0),
    ))
}

#[test]
fn open_route_is_a_complete_straight_path() {
    let nav = room();
    let path = nav
        .find_path(Vec3::new(2.0, 0.0, 2.0), Vec3::new(2.0, 0.0, 12.0))
        .unwrap();
    assert_eq!(path.class, PathClass::Complete);
    assert!((path.length() - 10.0).abs() < 1e-4);
}

#[test]
fn blocked_route_doglegs_around_the_pillar() {
    let nav = room();
    let start = Vec3::new(10.0, 0.0, 2.0);
    let goal = Vec3::new(10.0, 0.0, 18.0);
    let path = nav.find_path(start, goal).unwrap();
    assert_eq!(path.class, PathClass::Complete);
    assert_eq!(path.corners.len(), 3, "one dogleg corner");
    assert!(path.length() > start.distance(goal));
}

#[test]
fn out_of_bounds_goal_clips_to_a_partial_path() {
    let nav = room();
    let path = nav
        .find_path(Vec3::new(2.0, 0.0, 2.0), Vec3::new(60.0, 0.0, 2.0))
        .unwrap();
    assert_eq!(path.class, PathClass::Partial);
    let end = path.end().unwrap();
    assert!(end.x < 20.0);
}

#[test]
fn walled_route_stops_short() {
    // Wall spanning the full width forces a stub path.
    let nav = RoomNav::new(20.0, 20.0, 4.0).with_obstacle(Aabb::new(
        Vec3::new(0.0, 0.0, 9.0),
        Vec3::new(20.0, 3.0, 11.0),
    ));
    let path = nav
        .find_path(Vec3::new(10.0, 0.0, 2.0), Vec3::new(10.0, 0.0, 18.0))
        .unwrap();
    assert_eq!(path.class, PathClass::Partial);
    let end = path.end().unwrap();
    assert!(end.z < 9.0, "stops before the wall, got {:?}", end);
}

#[test]
fn sampling_projects_into_navigable_space() {
    let nav = room();
    // Free point passes through untouched (flattened).
    assert_eq!(
        nav.sample_navigable(Vec3::new(3.0, 1.5, 3.0), 2.0),
        Some(Vec3::new(3.0, 0.0, 3.0))
    );
    // A point inside the pillar is pushed out to its edge.
    let pushed = nav.sample_navigable(Vec3::new(9.4, 0.0, 10.0), 2.0).unwrap();
    assert!(pushed.x < 9.0);
    // Too far outside the search radius fails.
    assert_eq!(nav.sample_navigable(Vec3::new(40.0, 0.0, 3.0), 3.0), None);
    // The sentinel never projects.
    assert_eq!(nav.sample_navigable(Vec3::UNSET, 3.0), None);
}

#[test]
fn rays_hit_shell_and_obstacles() {
    let nav = room();
    let eye = Vec3::new(2.0, 0.5, 2.0);

    let up = nav.cast(eye, Vec3::UP, 10.0).unwrap();
    assert!((up.distance - 3.5).abs() < 1e-4, "ceiling at y=4");
    assert_eq!(up.normal, Vec3::DOWN);

    let west = nav.cast(eye, Vec3::new(-1.0, 0.0, 0.0), 10.0).unwrap();
    assert!((west.distance - 2.0).abs() < 1e-4, "wall at x=0");
    assert_eq!(west.normal, Vec3::new(1.0, 0.0, 0.0));

    // The pillar is nearer than the far wall, and its face looks back
    // along the ray.
    let toward_pillar = nav
        .cast(Vec3::new(5.0, 0.5, 10.0), Vec3::new(1.0, 0.0, 0.0), 20.0)
        .unwrap();
    assert!((toward_pillar.distance - 4.0).abs() < 1e-4);
    assert_eq!(toward_pillar.normal, Vec3::new(-1.0, 0.0, 0.0));

    // Nothing within range.
    assert!(nav.cast(eye, Vec3::new(1.0, 0.0, 0.0), 5.0).is_none());
}

#[test]
fn advance_from_walks_the_polyline() {
    let nav = room();
    let path = nav
        .find_path(Vec3::new(2.0, 0.0, 2.0), Vec3::new(2.0, 0.0, 12.0))
        .unwrap();

    let mut pos = Vec3::new(2.0, 0.0, 2.0);
    for _ in 0..4 {
        pos = path.advance_from(pos, 1.5);
    }
    assert!((pos.z - 8.0).abs() < 1e-3);

    // Overshooting the budget parks at the goal.
    let done = path.advance_from(pos, 100.0);
    assert_eq!(done, Vec3::new(2.0, 0.0, 12.0));
}
