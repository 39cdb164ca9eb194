//! The movement gateway.
//!
//! Every movement an action issues goes through [`request`]: destination
//! validated against the sentinel, projected onto navigable space, path
//! checked against a length budget, and only then handed to the host as a
//! replace-in-place goal. `false` always means "no command was issued",
//! so callers can fall through to another branch without cleanup.

use core::f32::consts::TAU;

use feral_core::{rng, AgentId, DeterministicRng, SplitMix64};

use crate::{MotionProfile, MotionWorld, MoveGoal, Vec3};

const SPREAD_STREAM: u64 = 0x5EED_0FF5;

#[derive(Debug, Clone, Copy)]
pub struct MoveRequest {
    pub label: &'static str,
    pub destination: Vec3,
    /// Search radius for projecting the destination onto navigable space.
    pub sample_radius: f32,
    /// Reject paths longer than this, even partial ones.
    pub max_path_len: f32,
    pub speed: f32,
    pub acceleration: f32,
    pub stopping_distance: f32,
    /// Accept a path that stops short of the destination. Used by flee and
    /// approach behaviors where moving the right direction is enough;
    /// precision moves (a strike position) demand a complete path.
    pub allow_partial: bool,
}

impl MoveRequest {
    pub fn to(label: &'static str, destination: Vec3) -> Self {
        Self {
            label,
            destination,
            sample_radius: 3.0,
            max_path_len: f32::INFINITY,
            speed: 3.5,
            acceleration: 8.0,
            stopping_distance: 0.0,
            allow_partial: false,
        }
    }

    pub fn with_profile(mut self, speed: f32, acceleration: f32) -> Self {
        self.speed = speed;
        self.acceleration = acceleration;
        self
    }

    pub fn with_budget(mut self, max_path_len: f32) -> Self {
        self.max_path_len = max_path_len;
        self
    }

    pub fn with_sample_radius(mut self, sample_radius: f32) -> Self {
        self.sample_radius = sample_radius;
        self
    }

    pub fn with_stop(mut self, stopping_distance: f32) -> Self {
        self.stopping_distance = stopping_distance;
        self
    }

    pub fn partial(mut self) -> Self {
        self.allow_partial = true;
        self
    }
}

/// Validates `req` and, when viable, replaces the agent's movement goal.
///
/// Returns `false` without side effects when the destination is unset,
/// cannot be projected onto navigable space, yields no path, needs a
/// complete path but only a partial one exists, or the path exceeds the
/// length budget. Arrival is the caller's job: compare live distance
/// against the request's stop threshold on later ticks.
pub fn request<W>(world: &mut W, agent: W::Agent, req: MoveRequest) -> bool
where
    W: MotionWorld,
{
    if !req.destination.is_set() {
        return false;
    }
    let Some(origin) = world.position(agent) else {
        return false;
    };
    let Some(target) = world.nav().sample_navigable(req.destination, req.sample_radius) else {
        return false;
    };
    let Some(path) = world.nav().find_path(origin, target) else {
        return false;
    };
    if !req.allow_partial && !path.is_complete() {
        return false;
    }
    // Partial paths charge the straight-line remainder to the budget, so a
    // far-off unreachable goal is over budget even when the walkable stub
    // is short.
    let mut cost = path.length();
    if !path.is_complete() {
        if let Some(end) = path.end() {
            cost += end.distance(target);
        }
    }
    if cost > req.max_path_len {
        return false;
    }

    world.apply_motion(
        agent,
        MoveGoal {
            label: req.label,
            destination: target,
            path,
            profile: MotionProfile {
                speed: req.speed,
                acceleration: req.acceleration,
                stopping_distance: req.stopping_distance,
            },
        },
    );
    true
}

/// Deterministic horizontal offset that spreads agents sharing one goal.
///
/// Stable per (seed, agent): the same agent always leans the same way, so
/// replays hold and packs fan out instead of stacking.
pub fn agent_spread<A: AgentId>(seed: u64, agent: A, scale: f32) -> Vec3 {
    let mut rng = SplitMix64::new(rng::derive_seed(seed, agent.stable_id(), SPREAD_STREAM));
    let angle = rng.next_f32_unit() * TAU;
    Vec3::new(angle.cos(), 0.0, angle.sin()) * scale
}
