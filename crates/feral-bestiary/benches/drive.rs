use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feral_bestiary::{
    drive_all, hound, lurker, mimic, skitter, stalker, statue, BestiaryTuning, BestiaryWorld,
    Creature, HostEffects, QuarrySample, QuarryWorld,
};
use feral_core::{TickContext, WorldMut, WorldView};
use feral_field::NoiseField;
use feral_nav::{MotionWorld, MoveGoal, NavQuery, NavWorldView, RoomNav, Vec3};

struct Body {
    position: Vec3,
    facing: Vec3,
    goal: Option<MoveGoal>,
}

struct BenchWorld {
    nav: RoomNav,
    bodies: BTreeMap<u64, Body>,
    quarry: QuarrySample,
    noise: NoiseField,
}

impl BenchWorld {
    fn step_motion(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if let Some(goal) = &body.goal {
                body.position = goal.path.advance_from(body.position, goal.profile.speed * dt);
            }
        }
    }
}

impl WorldView for BenchWorld {
    type Agent = u64;

    fn contains(&self, agent: u64) -> bool {
        self.bodies.contains_key(&agent)
    }
}

impl WorldMut for BenchWorld {}

impl NavWorldView for BenchWorld {
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

impl MotionWorld for BenchWorld {
    fn apply_motion(&mut self, agent: u64, goal: MoveGoal) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.goal = Some(goal);
        }
    }

    fn halt(&mut self, agent: u64) {
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

impl QuarryWorld for BenchWorld {
    fn quarry(&self, _agent: u64) -> Option<QuarrySample> {
        Some(self.quarry)
    }

    fn trackable(&self, _subject: u64) -> bool {
        true
    }

    fn territory(&self, _agent: u64) -> Vec3 {
        Vec3::new(20.0, 0.0, 20.0)
    }
}

impl HostEffects for BenchWorld {}

impl BestiaryWorld for BenchWorld {
    fn noise(&self) -> &NoiseField {
        &self.noise
    }
}

fn make_world(count: usize) -> BenchWorld {
    let nav = RoomNav::new(40.0, 40.0, 4.0).with_sample_points(vec![
        Vec3::new(6.0, 0.0, 6.0),
        Vec3::new(34.0, 0.0, 6.0),
        Vec3::new(6.0, 0.0, 34.0),
        Vec3::new(34.0, 0.0, 34.0),
        Vec3::new(20.0, 0.0, 12.0),
        Vec3::new(12.0, 0.0, 28.0),
    ]);
    let side = (count as f32).sqrt().ceil() as usize;
    let mut bodies = BTreeMap::new();
    for i in 0..count {
        let x = 2.0 + (i % side) as f32 * 4.5;
        let z = 2.0 + (i / side) as f32 * 4.5;
        bodies.insert(
            i as u64,
            Body {
                position: Vec3::new(x, 0.0, z),
                facing: Vec3::new(0.0, 0.0, 1.0),
                goal: None,
            },
        );
    }
    BenchWorld {
        nav,
        bodies,
        quarry: QuarrySample {
            subject: 999,
            position: Vec3::new(20.0, 0.0, 20.0),
            facing: Vec3::new(1.0, 0.0, 0.0),
            velocity: Vec3::new(1.5, 0.0, 0.0),
            noise: 0.4,
            visible: true,
            isolated: true,
        },
        noise: NoiseField::default(),
    }
}

fn make_roster(count: usize) -> Vec<Creature<BenchWorld>> {
    let tuning = BestiaryTuning::default();
    (0..count)
        .map(|i| {
            let agent = i as u64;
            match i % 6 {
                0 => statue::creature(agent, tuning),
                1 => hound::creature(agent, tuning),
                2 => lurker::creature(agent, tuning),
                3 => skitter::creature(agent, tuning),
                4 => mimic::creature(agent, tuning),
                _ => stalker::creature(agent, tuning),
            }
        })
        .collect()
}

fn bench_drive_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("feral-bestiary/drive_all");

    for &n in &[8usize, 64usize] {
        let mut world = make_world(n);
        let mut creatures = make_roster(n);
        let mut tick: u64 = 0;
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &_n| {
            b.iter(|| {
                if tick % 50 == 0 {
                    world.noise.register_burst(Vec3::new(30.0, 0.0, 10.0), 6.0);
                }
                let ctx = TickContext::new(tick, 0.1, tick as f64 * 0.1, 7);
                drive_all(&ctx, &mut world, &mut creatures);
                world.step_motion(0.1);
                world.noise.advance(0.1);
                black_box(creatures[0].active_action());
                tick = tick.wrapping_add(1);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_drive_all);
criterion_main!(benches);
