//! Leaf builders and movement helpers shared by the archetype modules.
//!
//! `act` wraps an action step so that any tick reporting progress also
//! records the action label on the board; that label stream is what the
//! replay trace and the host debug overlay see. Conditions stay pure.

use feral_bt::{Action, BtNode, BtStatus, Condition};
use feral_core::{AgentId, DeterministicRng, SplitMix64, TickContext};
use feral_nav::{gateway, MoveRequest, TimedPoint, Vec3};

use crate::blackboard::Blackboard;
use crate::world::BestiaryWorld;

/// Per-purpose RNG stream ids, one block per archetype.
pub(crate) mod streams {
    pub const STALKER_ROAM: u64 = 0x11;
    pub const STALKER_FLANK: u64 = 0x12;
    pub const STATUE_ROAM: u64 = 0x21;
    pub const LURKER_ROAM: u64 = 0x31;
    pub const SKITTER_SKULK: u64 = 0x41;
    pub const MIMIC_PATROL: u64 = 0x51;
    pub const MIMIC_VOCAL: u64 = 0x52;
    pub const HOUND_ROAM: u64 = 0x61;
}

pub(crate) fn cond<W, F>(label: &'static str, pred: F) -> Box<dyn BtNode<W, Blackboard>>
where
    W: BestiaryWorld + 'static,
    F: Fn(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
{
    Box::new(Condition::new(label, pred))
}

pub(crate) fn act<W, F>(label: &'static str, step: F) -> Box<dyn BtNode<W, Blackboard>>
where
    W: BestiaryWorld + 'static,
    F: Fn(&TickContext, W::Agent, &mut W, &mut Blackboard) -> BtStatus + 'static,
{
    let wrapped = move |ctx: &TickContext, agent: W::Agent, world: &mut W, board: &mut Blackboard| {
        let status = step(ctx, agent, world, board);
        if status != BtStatus::Failure {
            board.note_action(ctx.tick, agent.stable_id(), label);
        }
        status
    };
    Box::new(Action::new(label, wrapped))
}

/// Deterministic point in the square of half-extent `radius` around
/// `anchor`, at the anchor's height.
pub(crate) fn scatter(rng: &mut SplitMix64, anchor: Vec3, radius: f32) -> Vec3 {
    let dx = (rng.next_f32_unit() * 2.0 - 1.0) * radius;
    let dz = (rng.next_f32_unit() * 2.0 - 1.0) * radius;
    Vec3::new(anchor.x + dx, anchor.y, anchor.z + dz)
}

/// Movement shape of an unconditioned wander branch.
pub(crate) struct WanderStyle {
    pub label: &'static str,
    pub radius: f32,
    pub hold_seconds: f32,
    pub arrive: f32,
    pub sample_radius: f32,
    pub max_path_len: f32,
    pub speed: f32,
    pub acceleration: f32,
    pub stop: f32,
    pub spread: f32,
    pub stream: u64,
}

/// Drifts toward a held roam point near the territory anchor, picking a
/// fresh one when the current point is reached or expires. Returns
/// whether a movement command was issued.
pub(crate) fn wander<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    roam: &mut TimedPoint,
    style: &WanderStyle,
) -> bool
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return false;
    };
    let goal = match roam.get() {
        Some(point) if position.distance(point) > style.arrive => point,
        _ => {
            let anchor = world.territory(agent);
            let mut rng = ctx.rng_for_agent(agent, style.stream);
            let point = scatter(&mut rng, anchor, style.radius);
            roam.place(point, style.hold_seconds);
            point
        }
    };
    let goal = if style.spread > 0.0 {
        goal + gateway::agent_spread(ctx.seed, agent, style.spread)
    } else {
        goal
    };
    gateway::request(
        world,
        agent,
        MoveRequest::to(style.label, goal)
            .with_sample_radius(style.sample_radius)
            .with_budget(style.max_path_len)
            .with_profile(style.speed, style.acceleration)
            .with_stop(style.stop)
            .partial(),
    )
}
