//! A stare-down pursuer.
//!
//! Keeps to the quarry's blind side while unobserved, freezes and locks
//! eyes when watched, skulks out of view when the stare drags on, and
//! commits to a full pursuit once its anger meter fills. The stare and
//! anger meters only move inside actions; nothing here decays them
//! passively, so a stalker left alone keeps its grudge.

use serde::{Deserialize, Serialize};

use feral_bt::{BtNode, BtStatus, PrioritySelector, Sequence};
use feral_core::{Meter, TickContext};
use feral_nav::{clamp01, gateway, lerp, MoveRequest, TimedPoint, Vec3};
use feral_planner::{score, CoverConfig, CoverQuery, DarknessProbe};

use crate::blackboard::Blackboard;
use crate::drive::Creature;
use crate::leaf::{act, cond, streams, wander, WanderStyle};
use crate::tuning::{ensure_fraction, ensure_positive, BestiaryTuning, TuningResult};
use crate::world::BestiaryWorld;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalkerTuning {
    /// Seconds of being stared at before the stare meter is full.
    #[serde(default = "default_stare_seconds")]
    pub stare_seconds: f32,
    /// Seconds of accumulated provocation before aggro is primed.
    #[serde(default = "default_anger_seconds")]
    pub anger_seconds: f32,
    /// A watcher closer than this can trip aggro early.
    #[serde(default = "default_close_aggro_distance")]
    pub close_aggro_distance: f32,
    /// Stare ratio required for the close-range aggro trip.
    #[serde(default = "default_close_aggro_stare")]
    pub close_aggro_stare: f32,
    /// No stalking inside this range; the stare branch owns it.
    #[serde(default = "default_stalk_min_distance")]
    pub stalk_min_distance: f32,
    /// Beyond this the stalker hides at the blind spot instead of
    /// creeping it.
    #[serde(default = "default_shadow_far_distance")]
    pub shadow_far_distance: f32,
    /// Quarry speed treated as standing still.
    #[serde(default = "default_quiet_quarry_speed")]
    pub quiet_quarry_speed: f32,
    /// Lifetime of a primed escape point.
    #[serde(default = "default_escape_seconds")]
    pub escape_seconds: f32,
    /// Base pursuit speed; anger scales it up to 1.35x.
    #[serde(default = "default_aggro_speed")]
    pub aggro_speed: f32,
}

fn default_stare_seconds() -> f32 {
    4.0
}

fn default_anger_seconds() -> f32 {
    6.0
}

fn default_close_aggro_distance() -> f32 {
    5.0
}

fn default_close_aggro_stare() -> f32 {
    0.5
}

fn default_stalk_min_distance() -> f32 {
    2.5
}

fn default_shadow_far_distance() -> f32 {
    4.75
}

fn default_quiet_quarry_speed() -> f32 {
    0.35
}

fn default_escape_seconds() -> f32 {
    4.0
}

fn default_aggro_speed() -> f32 {
    8.5
}

impl Default for StalkerTuning {
    fn default() -> Self {
        Self {
            stare_seconds: default_stare_seconds(),
            anger_seconds: default_anger_seconds(),
            close_aggro_distance: default_close_aggro_distance(),
            close_aggro_stare: default_close_aggro_stare(),
            stalk_min_distance: default_stalk_min_distance(),
            shadow_far_distance: default_shadow_far_distance(),
            quiet_quarry_speed: default_quiet_quarry_speed(),
            escape_seconds: default_escape_seconds(),
            aggro_speed: default_aggro_speed(),
        }
    }
}

impl StalkerTuning {
    pub(crate) fn validate(&self) -> TuningResult<()> {
        ensure_positive("stalker.stare_seconds", self.stare_seconds)?;
        ensure_positive("stalker.anger_seconds", self.anger_seconds)?;
        ensure_positive("stalker.close_aggro_distance", self.close_aggro_distance)?;
        ensure_fraction("stalker.close_aggro_stare", self.close_aggro_stare)?;
        ensure_positive("stalker.stalk_min_distance", self.stalk_min_distance)?;
        ensure_positive("stalker.shadow_far_distance", self.shadow_far_distance)?;
        ensure_positive("stalker.quiet_quarry_speed", self.quiet_quarry_speed)?;
        ensure_positive("stalker.escape_seconds", self.escape_seconds)?;
        ensure_positive("stalker.aggro_speed", self.aggro_speed)?;
        Ok(())
    }
}

/// Stare pressure, provocation, and the points the stalk navigates by.
#[derive(Debug, Clone)]
pub struct StalkerMemory {
    pub stare: Meter,
    pub anger: Meter,
    pub escape: TimedPoint,
    /// Sideways approach point around the quarry. Sentinel until the
    /// first `update_vectors`.
    pub flank: Vec3,
    /// Point behind the quarry's back. Sentinel until refreshed.
    pub blind_spot: Vec3,
    pub roam: TimedPoint,
}

impl StalkerMemory {
    pub fn new(tuning: &StalkerTuning) -> Self {
        Self {
            stare: Meter::new(tuning.stare_seconds),
            anger: Meter::new(tuning.anger_seconds),
            escape: TimedPoint::unset(),
            flank: Vec3::UNSET,
            blind_spot: Vec3::UNSET,
            roam: TimedPoint::unset(),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.escape.advance(dt);
        self.roam.advance(dt);
    }
}

impl Default for StalkerMemory {
    fn default() -> Self {
        Self::new(&StalkerTuning::default())
    }
}

/// Folds the quarry sample; the stalker works entirely off the shared
/// track.
pub fn sense<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &W,
    board: &mut Blackboard,
    tuning: &BestiaryTuning,
) where
    W: BestiaryWorld,
{
    let sample = world.quarry(agent);
    let position = world.position(agent).unwrap_or(Vec3::UNSET);
    board
        .quarry
        .observe(position, sample.as_ref(), ctx.dt_seconds, &tuning.quarry);
}

pub fn should_aggro(board: &Blackboard, tuning: &StalkerTuning) -> bool {
    if !board.quarry.has_track() {
        return false;
    }
    let primed = board.stalker.anger.is_full() && board.stalker.stare.is_full();
    let pressed = board.quarry.watched()
        && board.quarry.distance() <= tuning.close_aggro_distance
        && board.stalker.stare.ratio() >= tuning.close_aggro_stare;
    primed || pressed
}

pub fn being_watched(board: &Blackboard) -> bool {
    board.quarry.watched()
}

pub fn can_stalk(board: &Blackboard, tuning: &StalkerTuning) -> bool {
    board.quarry.has_track() && board.quarry.distance() > tuning.stalk_min_distance
}

/// Recomputes the flank and blind-spot points from the freshest quarry
/// facts. Runs at the head of both the aggro and stalk sequences.
pub fn update_vectors<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &StalkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let Some(quarry) = board.quarry.last_known() else {
        return BtStatus::Failure;
    };
    let facing = board.quarry.facing();
    let distance = board.quarry.distance();

    let back = if facing.is_set() {
        facing * -1.0
    } else {
        (quarry - position).normalized_or(Vec3::ZERO)
    };
    let back = back.flattened().normalized_or(Vec3::new(0.0, 0.0, 1.0));
    let reach = (distance * 0.6).clamp(3.0, 8.0);
    board.stalker.blind_spot = quarry + back * reach;

    // Each stalker sticks to one flank side for its whole life.
    let side = if ctx.agent_seed(agent, streams::STALKER_FLANK) & 1 == 0 {
        1.0
    } else {
        -1.0
    };
    let lateral = Vec3::new(-back.z, 0.0, back.x);
    let swing = lerp(2.5, 6.0, clamp01(distance / 14.0));
    board.stalker.flank = quarry + lateral * (side * swing);
    BtStatus::Success
}

/// Halts, locks eyes, and builds stare pressure. Anger rises once the
/// stare meter is full and cools a little otherwise; a quarry that
/// starts turning primes an escape point for the break-off.
pub fn stare_down<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &StalkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    if world.position(agent).is_none() {
        return BtStatus::Failure;
    }
    let Some(target) = board.quarry.last_known() else {
        return BtStatus::Failure;
    };
    world.halt(agent);
    world.face_toward(agent, target);

    let dt = ctx.dt_seconds;
    let distance = board.quarry.distance();
    let turning = board.quarry.turning();
    board.stalker.stare.rise(dt);

    let close_boost = clamp01((8.0 - distance) / 8.0);
    if board.stalker.stare.is_full() {
        let rate = lerp(0.65, 1.25, board.stalker.stare.ratio()) + close_boost;
        board.stalker.anger.rise(dt * rate);
    } else {
        board.stalker.anger.cool(0.2 * dt);
    }

    if turning && !board.stalker.escape.is_live() {
        prime_escape(agent, world, board, tuning);
    }
    BtStatus::Success
}

/// Skulks to the primed escape point to get out of the watcher's view.
/// `Running` while fleeing; arrival cools both meters.
pub fn break_line_of_sight<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &StalkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let dt = ctx.dt_seconds;
    let watched = board.quarry.watched();
    let turning = board.quarry.turning();
    if !watched && !turning {
        board.stalker.stare.cool(1.1 * dt);
        return BtStatus::Success;
    }
    if !board.stalker.escape.is_live() {
        prime_escape(agent, world, board, tuning);
    }
    let Some(escape) = board.stalker.escape.get() else {
        board.stalker.stare.cool(dt);
        return BtStatus::Failure;
    };
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    if position.distance(escape) < 0.8 {
        board.stalker.anger.cool(0.2 * dt);
        board.stalker.stare.cool(0.75 * dt);
        return BtStatus::Success;
    }

    let (speed, acceleration) = if turning { (7.5, 14.0) } else { (5.5, 10.5) };
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("stalker.break_los", escape)
            .with_budget(24.0)
            .with_profile(speed, acceleration)
            .with_stop(0.4)
            .partial(),
    );
    if issued {
        board.stalker.anger.rise(0.5 * dt);
        BtStatus::Running
    } else {
        board.stalker.escape.clear();
        prime_escape(agent, world, board, tuning);
        BtStatus::Failure
    }
}

/// The stalk proper: hide at the blind spot while far and unobserved,
/// creep it when close, otherwise swing around the flank.
pub fn sweep_shadow<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &StalkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    if update_vectors(ctx, agent, world, board, tuning) == BtStatus::Failure {
        return BtStatus::Failure;
    }
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let dt = ctx.dt_seconds;
    let distance = board.quarry.distance();
    let turning = board.quarry.turning();
    let quiet = board.quarry.speed() <= tuning.quiet_quarry_speed;

    if distance > tuning.shadow_far_distance && (turning || quiet) {
        let goal = board.stalker.blind_spot + gateway::agent_spread(ctx.seed, agent, 1.35);
        let issued = gateway::request(
            world,
            agent,
            MoveRequest::to("stalker.hide", goal)
                .with_budget(30.0)
                .with_profile(3.1, 5.5)
                .with_stop(0.4)
                .partial(),
        );
        if issued {
            board.stalker.stare.cool(1.4 * dt);
            board.stalker.anger.cool(0.35 * dt);
            return BtStatus::Running;
        }
    }

    if board.stalker.blind_spot.is_set() && distance > 1.25 {
        let blind_distance = position.distance(board.stalker.blind_spot);
        let speed = lerp(1.6, 3.0, clamp01(blind_distance / 6.0));
        let issued = gateway::request(
            world,
            agent,
            MoveRequest::to("stalker.sneak", board.stalker.blind_spot)
                .with_budget(30.0)
                .with_profile(speed, 4.5)
                .with_stop(0.35)
                .partial(),
        );
        if issued {
            return BtStatus::Running;
        }
    }

    if !board.stalker.flank.is_set() {
        return BtStatus::Failure;
    }
    let speed = if distance > 12.0 { 4.5 } else { 3.75 };
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("stalker.flank", board.stalker.flank)
            .with_sample_radius(4.0)
            .with_budget(60.0)
            .with_profile(speed, 7.0)
            .with_stop(0.6)
            .partial(),
    );
    if issued {
        board.stalker.stare.cool(0.5 * dt);
        board.stalker.anger.rise(0.2 * dt);
        BtStatus::Running
    } else {
        BtStatus::Failure
    }
}

/// Full pursuit of the last-known position. Complete paths only; a
/// strike inside 1.8 resets the anger meter and yields.
pub fn execute_aggro<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &StalkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let Some(target) = board.quarry.last_known() else {
        return BtStatus::Failure;
    };
    if position.distance(target) <= 1.8 {
        board.stalker.anger.reset();
        return BtStatus::Success;
    }
    let pace = tuning.aggro_speed * lerp(0.85, 1.35, board.stalker.anger.ratio());
    let budget = world.territory_radius(agent) * 4.0 + 30.0;
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("stalker.aggro", target)
            .with_sample_radius(4.0)
            .with_budget(budget)
            .with_profile(pace, 16.0)
            .with_stop(0.25),
    );
    if issued {
        BtStatus::Running
    } else {
        BtStatus::Failure
    }
}

pub fn idle_haunt<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &StalkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let dt = ctx.dt_seconds;
    let style = WanderStyle {
        label: "stalker.haunt",
        radius: 3.0,
        hold_seconds: 6.0,
        arrive: 0.9,
        sample_radius: 3.0,
        max_path_len: 20.0,
        speed: 2.2,
        acceleration: 4.0,
        stop: 0.35,
        spread: 0.0,
        stream: streams::STALKER_ROAM,
    };
    if wander(ctx, agent, world, &mut board.stalker.roam, &style) {
        board.stalker.anger.cool(0.4 * dt);
        BtStatus::Running
    } else {
        board.stalker.anger.cool(0.5 * dt);
        BtStatus::Failure
    }
}

/// Picks a point that breaks the watcher's line of sight: covered and
/// dark wins, straight away from the quarry as the fallback.
fn prime_escape<W>(agent: W::Agent, world: &mut W, board: &mut Blackboard, tuning: &StalkerTuning)
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return;
    };
    let threat = board.quarry.position_or_unset();
    if !threat.is_set() {
        return;
    }
    let cover = CoverQuery::new(CoverConfig {
        min_distance: 2.0,
        max_distance: 16.0,
        min_score: 0.05,
        sample_radius: 1.5,
    });
    let pick = cover.find(world.nav(), position, |nav, point| {
        score::cover_between(nav, point, threat) * 1.5
            + score::ambient_darkness(nav, point, DarknessProbe::default()) * 0.5
    });
    let point = match pick {
        Some(pick) => pick.point,
        None => {
            let away = (position - threat).flattened().normalized_or(Vec3::ZERO);
            if away == Vec3::ZERO {
                return;
            }
            position + away * 6.0
        }
    };
    board.stalker.escape.place(point, tuning.escape_seconds);
}

/// PrioritySelector(aggro, stare, stalk, haunt).
pub fn tree<W>(tuning: BestiaryTuning) -> Box<dyn BtNode<W, Blackboard>>
where
    W: BestiaryWorld + 'static,
{
    let t = tuning;
    Box::new(PrioritySelector::new(
        "stalker",
        vec![
            Box::new(Sequence::new(
                "stalker.aggro_seq",
                vec![
                    cond("stalker.should_aggro", move |_, _, _: &W, board: &Blackboard| {
                        should_aggro(board, &t.stalker)
                    }),
                    act("stalker.update_vectors", move |ctx, agent, world: &mut W, board: &mut Blackboard| {
                        update_vectors(ctx, agent, world, board, &t.stalker)
                    }),
                    act("stalker.aggro", move |ctx, agent, world, board| {
                        execute_aggro(ctx, agent, world, board, &t.stalker)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "stalker.stare_seq",
                vec![
                    cond("stalker.watched", move |_, _, _: &W, board: &Blackboard| {
                        being_watched(board)
                    }),
                    act("stalker.stare_down", move |ctx, agent, world, board| {
                        stare_down(ctx, agent, world, board, &t.stalker)
                    }),
                    act("stalker.break_los", move |ctx, agent, world, board| {
                        break_line_of_sight(ctx, agent, world, board, &t.stalker)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "stalker.stalk_seq",
                vec![
                    cond("stalker.can_stalk", move |_, _, _: &W, board: &Blackboard| {
                        can_stalk(board, &t.stalker)
                    }),
                    act("stalker.sweep_shadow", move |ctx, agent, world, board| {
                        sweep_shadow(ctx, agent, world, board, &t.stalker)
                    }),
                ],
            )),
            act("stalker.haunt", move |ctx, agent, world, board| {
                idle_haunt(ctx, agent, world, board, &t.stalker)
            }),
        ],
    ))
}

/// A fully wired stalker: watch-pressure sense plus the stare tree.
pub fn creature<W>(agent: W::Agent, tuning: BestiaryTuning) -> Creature<W>
where
    W: BestiaryWorld + 'static,
{
    Creature::new(agent, tuning, sense::<W>, tree::<W>(tuning))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primed_board() -> Blackboard {
        let tuning = BestiaryTuning::default();
        let mut board = Blackboard::tuned(&tuning);
        board.quarry.observe(
            Vec3::ZERO,
            Some(&crate::world::QuarrySample {
                subject: 1,
                position: Vec3::new(3.0, 0.0, 0.0),
                facing: Vec3::new(-1.0, 0.0, 0.0),
                velocity: Vec3::ZERO,
                noise: 0.1,
                visible: true,
                isolated: true,
            }),
            0.1,
            &tuning.quarry,
        );
        board
    }

    #[test]
    fn aggro_needs_both_meters_or_close_pressure() {
        let tuning = StalkerTuning::default();
        let mut board = primed_board();
        assert!(board.quarry.watched());

        // Watched and close, but no stare accumulated yet.
        assert!(!should_aggro(&board, &tuning));

        board.stalker.stare.rise(tuning.stare_seconds * 0.6);
        assert!(should_aggro(&board, &tuning));

        // Meter path: both full without the watch pressure.
        let mut board = primed_board();
        board.quarry.observe(Vec3::ZERO, None, 0.1, &BestiaryTuning::default().quarry);
        board.stalker.stare.rise(tuning.stare_seconds);
        board.stalker.anger.rise(tuning.anger_seconds);
        assert!(should_aggro(&board, &tuning));
    }

    #[test]
    fn stalk_gate_respects_minimum_distance() {
        let tuning = StalkerTuning::default();
        let mut board = primed_board();
        assert!(can_stalk(&board, &tuning));

        board.quarry.observe(
            Vec3::ZERO,
            Some(&crate::world::QuarrySample {
                subject: 1,
                position: Vec3::new(1.0, 0.0, 0.0),
                facing: Vec3::new(-1.0, 0.0, 0.0),
                velocity: Vec3::ZERO,
                noise: 0.1,
                visible: true,
                isolated: true,
            }),
            0.1,
            &BestiaryTuning::default().quarry,
        );
        assert!(!can_stalk(&board, &tuning));
    }

    #[test]
    fn no_track_admits_no_guard() {
        let tuning = StalkerTuning::default();
        let board = Blackboard::new();
        assert!(!should_aggro(&board, &tuning));
        assert!(!being_watched(&board));
        assert!(!can_stalk(&board, &tuning));
    }
}
