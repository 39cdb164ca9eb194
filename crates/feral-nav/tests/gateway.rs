use std::collections::BTreeMap;

use feral_core::{WorldMut, WorldView};
use feral_nav::{
    request, Aabb, MotionWorld, MoveGoal, MoveRequest, NavQuery, NavWorldView, PathClass, RoomNav,
    Vec3,
};

#[derive(Debug, Clone)]
struct Body {
    position: Vec3,
    facing: Vec3,
    goal: Option<MoveGoal>,
}

struct TestWorld {
    nav: RoomNav,
    bodies: BTreeMap<u64, Body>,
    halts: u32,
}

impl TestWorld {
    fn new(nav: RoomNav) -> Self {
        Self {
            nav,
            bodies: BTreeMap::new(),
            halts: 0,
        }
    }

    fn spawn(&mut self, id: u64, position: Vec3) {
        self.bodies.insert(
            id,
            Body {
                position,
                facing: Vec3::new(0.0, 0.0, 1.0),
                goal: None,
            },
        );
    }

    fn goal_label(&self, id: u64) -> Option<&'static str> {
        self.bodies.get(&id).and_then(|b| b.goal.as_ref()).map(|g| g.label)
    }

    /// Host-side integration: walk each body along its goal path.
    fn step_motion(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if let Some(goal) = &body.goal {
                body.position = goal.path.advance_from(body.position, goal.profile.speed * dt);
            }
        }
    }
}

impl WorldView for TestWorld {
    type Agent = u64;

    fn contains(&self, agent: u64) -> bool {
        self.bodies.contains_key(&agent)
    }
}

impl WorldMut for TestWorld {}

impl NavWorldView for TestWorld {
    fn position(&self, agent: u64) -> Option<Vec3> {
        self.bodies.get(&agent).map(|b| b.position)
    }

    fn facing(&self, agent: u64) -> Option<Vec3> {
        self.bodies.get(&agent).map(|b| b.facing)
    }

    fn nav(&self) -> &dyn NavQuery {
        &self.nav
    }
}

impl MotionWorld for TestWorld {
    fn apply_motion(&mut self, agent: u64, goal: MoveGoal) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.goal = Some(goal);
        }
    }

    fn halt(&mut self, agent: u64) {
        self.halts += 1;
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.goal = None;
        }
    }

    fn face_toward(&mut self, agent: u64, point: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.facing = (point - body.position).normalized_or(body.facing);
        }
    }
}

fn long_hall() -> RoomNav {
    RoomNav::new(50.0, 6.0, 4.0)
}

#[test]
fn sentinel_destination_is_rejected_without_side_effects() {
    let mut world = TestWorld::new(long_hall());
    world.spawn(1, Vec3::new(5.0, 0.0, 3.0));

    let ok = request(&mut world, 1, MoveRequest::to("patrol", Vec3::UNSET));

    assert!(!ok);
    assert_eq!(world.goal_label(1), None);
}

#[test]
fn over_budget_path_is_rejected() {
    let mut world = TestWorld::new(long_hall());
    world.spawn(1, Vec3::new(5.0, 0.0, 3.0));

    // 40 units of straight corridor against a 24-unit budget.
    let ok = request(
        &mut world,
        1,
        MoveRequest::to("charge", Vec3::new(45.0, 0.0, 3.0)).with_budget(24.0),
    );

    assert!(!ok);
    assert_eq!(world.goal_label(1), None);
}

#[test]
fn partial_path_charges_the_unreached_remainder() {
    // Full-width wall 12 units ahead; the stub itself is short, but the
    // goal is 40 units out, so a 24-unit budget still rejects it.
    let nav = RoomNav::new(50.0, 6.0, 4.0).with_obstacle(Aabb::new(
        Vec3::new(17.0, 0.0, 0.0),
        Vec3::new(18.0, 3.0, 6.0),
    ));
    let mut world = TestWorld::new(nav);
    world.spawn(1, Vec3::new(5.0, 0.0, 3.0));

    let ok = request(
        &mut world,
        1,
        MoveRequest::to("flee", Vec3::new(45.0, 0.0, 3.0))
            .with_budget(24.0)
            .partial(),
    );

    assert!(!ok);
    assert_eq!(world.goal_label(1), None);
}

#[test]
fn nearby_partial_path_is_accepted_when_allowed() {
    let nav = RoomNav::new(50.0, 6.0, 4.0).with_obstacle(Aabb::new(
        Vec3::new(17.0, 0.0, 0.0),
        Vec3::new(18.0, 3.0, 6.0),
    ));
    let mut world = TestWorld::new(nav);
    world.spawn(1, Vec3::new(5.0, 0.0, 3.0));
    let goal = Vec3::new(20.0, 0.0, 3.0);

    let strict = request(&mut world, 1, MoveRequest::to("strike", goal).with_budget(24.0));
    assert!(!strict, "complete path required but wall intervenes");

    let loose = request(
        &mut world,
        1,
        MoveRequest::to("flee", goal).with_budget(24.0).partial(),
    );
    assert!(loose);
    let body_goal = world.bodies[&1].goal.as_ref().unwrap();
    assert_eq!(body_goal.label, "flee");
    assert_eq!(body_goal.path.class, PathClass::Partial);
}

#[test]
fn new_request_replaces_the_active_goal() {
    let mut world = TestWorld::new(long_hall());
    world.spawn(1, Vec3::new(5.0, 0.0, 3.0));

    assert!(request(
        &mut world,
        1,
        MoveRequest::to("patrol", Vec3::new(15.0, 0.0, 3.0)).with_profile(2.0, 6.0),
    ));
    assert_eq!(world.goal_label(1), Some("patrol"));

    assert!(request(
        &mut world,
        1,
        MoveRequest::to("charge", Vec3::new(30.0, 0.0, 3.0)).with_profile(9.0, 20.0),
    ));
    let goal = world.bodies[&1].goal.as_ref().unwrap();
    assert_eq!(goal.label, "charge");
    assert!((goal.profile.speed - 9.0).abs() < 1e-6);
    assert_eq!(world.halts, 0, "replacement never required a cancel");
}

#[test]
fn reissuing_the_same_goal_does_not_restart_progress() {
    let mut world = TestWorld::new(long_hall());
    world.spawn(1, Vec3::new(5.0, 0.0, 3.0));
    let goal = Vec3::new(25.0, 0.0, 3.0);

    for _ in 0..10 {
        assert!(request(
            &mut world,
            1,
            MoveRequest::to("approach", goal).with_profile(4.0, 10.0),
        ));
        world.step_motion(0.5);
    }

    // 10 steps at 4 u/s * 0.5 s: 20 units of progress despite re-issuing
    // the goal every tick.
    let pos = world.position(1).unwrap();
    assert!((pos.x - 25.0).abs() < 1e-3, "arrived, got {:?}", pos);
}

#[test]
fn missing_agent_fails_closed() {
    let mut world = TestWorld::new(long_hall());
    let ok = request(&mut world, 9, MoveRequest::to("patrol", Vec3::new(10.0, 0.0, 3.0)));
    assert!(!ok);
}
