//! A hunter that moves only while unobserved.
//!
//! Any tick the quarry has the statue in its watch cone freezes it on
//! the spot, with a short buffer so a blink does not release it. Off
//! the cone it hunts hard: the freshest tracked target first, then the
//! most committed of its remembered sightings. Doors are a host-marked
//! pause, not a navigation concept.

use serde::{Deserialize, Serialize};

use feral_bt::{BtNode, BtStatus, PrioritySelector, Sequence};
use feral_core::{DecayTimer, TickContext};
use feral_nav::{gateway, MoveRequest, TimedPoint, Vec3};

use crate::blackboard::Blackboard;
use crate::drive::Creature;
use crate::leaf::{act, cond, streams, wander, WanderStyle};
use crate::tuning::{ensure_positive, BestiaryTuning, TuningResult};
use crate::world::BestiaryWorld;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatueTuning {
    /// Lifetime of a remembered sighting.
    #[serde(default = "default_sighting_seconds")]
    pub sighting_seconds: f32,
    /// Aggro window refreshed on every confirmed look at the quarry.
    #[serde(default = "default_aggro_seconds")]
    pub aggro_seconds: f32,
    /// Grace window after the watcher blinks.
    #[serde(default = "default_freeze_buffer_seconds")]
    pub freeze_buffer_seconds: f32,
    #[serde(default = "default_hunt_speed")]
    pub hunt_speed: f32,
    #[serde(default = "default_hunt_accel")]
    pub hunt_accel: f32,
}

fn default_sighting_seconds() -> f32 {
    14.0
}

fn default_aggro_seconds() -> f32 {
    14.0
}

fn default_freeze_buffer_seconds() -> f32 {
    0.35
}

fn default_hunt_speed() -> f32 {
    12.0
}

fn default_hunt_accel() -> f32 {
    22.0
}

impl Default for StatueTuning {
    fn default() -> Self {
        Self {
            sighting_seconds: default_sighting_seconds(),
            aggro_seconds: default_aggro_seconds(),
            freeze_buffer_seconds: default_freeze_buffer_seconds(),
            hunt_speed: default_hunt_speed(),
            hunt_accel: default_hunt_accel(),
        }
    }
}

impl StatueTuning {
    pub(crate) fn validate(&self) -> TuningResult<()> {
        ensure_positive("statue.sighting_seconds", self.sighting_seconds)?;
        ensure_positive("statue.aggro_seconds", self.aggro_seconds)?;
        ensure_positive("statue.freeze_buffer_seconds", self.freeze_buffer_seconds)?;
        ensure_positive("statue.hunt_speed", self.hunt_speed)?;
        ensure_positive("statue.hunt_accel", self.hunt_accel)?;
        Ok(())
    }
}

/// Freeze state, the aggro window, and the host-marked door pause.
#[derive(Debug, Clone)]
pub struct StatueMemory {
    target: Vec3,
    memory: DecayTimer,
    locked: bool,
    observed: bool,
    freeze_buffer: DecayTimer,
    door_point: Vec3,
    door_hold: DecayTimer,
    pub roam: TimedPoint,
}

impl StatueMemory {
    pub fn new() -> Self {
        Self {
            target: Vec3::UNSET,
            memory: DecayTimer::spent(),
            locked: false,
            observed: false,
            freeze_buffer: DecayTimer::spent(),
            door_point: Vec3::UNSET,
            door_hold: DecayTimer::spent(),
            roam: TimedPoint::unset(),
        }
    }

    /// The observation flag lives for exactly one tick; the buffer is
    /// what carries the freeze across blinks.
    pub fn advance(&mut self, dt: f32) {
        self.observed = false;
        self.freeze_buffer.advance(dt);
        self.memory.advance(dt);
        if !self.memory.is_active() && !self.locked {
            self.target = Vec3::UNSET;
        }
        self.door_hold.advance(dt);
        if !self.door_hold.is_active() {
            self.door_point = Vec3::UNSET;
        }
        self.roam.advance(dt);
    }

    /// Confirms the tracked target. Extends the aggro window, never
    /// shortens it; `lock` pins the target past the window.
    pub fn set_target(&mut self, position: Vec3, seconds: f32, lock: bool) {
        self.target = position;
        self.memory.set_at_least(seconds);
        if lock {
            self.locked = true;
        }
    }

    pub fn clear_lock(&mut self) {
        self.locked = false;
    }

    pub fn mark_observed(&mut self, buffer_seconds: f32) {
        self.observed = true;
        self.freeze_buffer.set_at_least(buffer_seconds);
    }

    /// Host marks a closed door in the statue's way; the statue waits
    /// out the hold instead of pathing around.
    pub fn pause_at_door(&mut self, position: Vec3, seconds: f32) {
        self.door_point = position;
        self.door_hold.set_at_least(seconds);
    }

    pub fn is_frozen(&self) -> bool {
        self.observed || self.freeze_buffer.is_active()
    }

    pub fn has_aggro(&self) -> bool {
        self.locked || (self.memory.is_active() && self.target.is_set())
    }

    pub fn door_blocked(&self) -> bool {
        self.door_hold.is_active() && self.door_point.is_set()
    }

    pub fn target(&self) -> Option<Vec3> {
        if self.has_aggro() && self.target.is_set() {
            Some(self.target)
        } else {
            None
        }
    }
}

impl Default for StatueMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds this tick's sample: every confirmed look refreshes both the
/// tracked target and the per-subject sighting record, and being inside
/// the quarry's watch cone marks the freeze.
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
    board.quarry.purge_untrackable(|subject| world.trackable(subject));

    if let Some(s) = sample {
        if s.visible {
            board
                .quarry
                .record_sighting(s.subject, s.position, tuning.statue.sighting_seconds);
            board
                .statue
                .set_target(s.position, tuning.statue.aggro_seconds, false);
        }
    }
    if board.quarry.watched() {
        board.statue.mark_observed(tuning.statue.freeze_buffer_seconds);
    }
}

pub fn has_hunt_target(board: &Blackboard) -> bool {
    board.statue.has_aggro() || !board.quarry.sightings().is_empty()
}

/// Dead stop while observed.
pub fn hold_still<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &StatueTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    world.halt(agent);
    if board.statue.is_frozen() {
        BtStatus::Running
    } else {
        BtStatus::Success
    }
}

pub fn wait_door<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &StatueTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    world.halt(agent);
    if board.statue.door_blocked() {
        BtStatus::Running
    } else {
        BtStatus::Success
    }
}

/// Full-speed pursuit of the tracked target, falling back to the most
/// committed remembered sighting. Complete paths only.
pub fn pursue<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &StatueTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let target = board
        .statue
        .target()
        .or_else(|| board.quarry.persistent_target(position));
    let Some(target) = target else {
        return BtStatus::Failure;
    };
    if position.distance(target) <= 1.1 {
        return BtStatus::Success;
    }
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("statue.pursue", target)
            .with_sample_radius(4.0)
            .with_budget(world.territory_radius(agent) * 4.0 + 30.0)
            .with_profile(tuning.hunt_speed, tuning.hunt_accel)
            .with_stop(0.3),
    );
    if issued {
        BtStatus::Running
    } else {
        BtStatus::Failure
    }
}

pub fn patrol<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &StatueTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let style = WanderStyle {
        label: "statue.patrol",
        radius: 3.0,
        hold_seconds: 7.0,
        arrive: 1.0,
        sample_radius: 3.0,
        max_path_len: 26.0,
        speed: 3.0,
        acceleration: 6.0,
        stop: 0.4,
        spread: 0.0,
        stream: streams::STATUE_ROAM,
    };
    if wander(ctx, agent, world, &mut board.statue.roam, &style) {
        BtStatus::Running
    } else {
        BtStatus::Failure
    }
}

/// PrioritySelector(freeze, door, hunt, patrol).
pub fn tree<W>(tuning: BestiaryTuning) -> Box<dyn BtNode<W, Blackboard>>
where
    W: BestiaryWorld + 'static,
{
    let t = tuning;
    Box::new(PrioritySelector::new(
        "statue",
        vec![
            Box::new(Sequence::new(
                "statue.freeze_seq",
                vec![
                    cond("statue.is_frozen", move |_, _, _: &W, board: &Blackboard| {
                        board.statue.is_frozen()
                    }),
                    act("statue.hold_still", move |ctx, agent, world: &mut W, board: &mut Blackboard| {
                        hold_still(ctx, agent, world, board, &t.statue)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "statue.door_seq",
                vec![
                    cond("statue.door_blocked", move |_, _, _: &W, board: &Blackboard| {
                        board.statue.door_blocked()
                    }),
                    act("statue.wait_door", move |ctx, agent, world, board| {
                        wait_door(ctx, agent, world, board, &t.statue)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "statue.hunt_seq",
                vec![
                    cond("statue.has_hunt_target", move |_, _, _: &W, board: &Blackboard| {
                        has_hunt_target(board)
                    }),
                    act("statue.pursue", move |ctx, agent, world, board| {
                        pursue(ctx, agent, world, board, &t.statue)
                    }),
                ],
            )),
            act("statue.patrol", move |ctx, agent, world, board| {
                patrol(ctx, agent, world, board, &t.statue)
            }),
        ],
    ))
}

/// A fully wired statue: watch-cone sense plus the freeze-hunt tree.
pub fn creature<W>(agent: W::Agent, tuning: BestiaryTuning) -> Creature<W>
where
    W: BestiaryWorld + 'static,
{
    Creature::new(agent, tuning, sense::<W>, tree::<W>(tuning))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_covers_blink_with_buffer() {
        let mut memory = StatueMemory::new();
        memory.mark_observed(0.35);
        assert!(memory.is_frozen());

        // One advance clears the flag but the buffer still holds.
        memory.advance(0.1);
        assert!(memory.is_frozen());

        for _ in 0..4 {
            memory.advance(0.1);
        }
        assert!(!memory.is_frozen());
    }

    #[test]
    fn target_expires_unless_locked() {
        let mut memory = StatueMemory::new();
        memory.set_target(Vec3::new(5.0, 0.0, 0.0), 1.0, false);
        assert!(memory.has_aggro());

        for _ in 0..11 {
            memory.advance(0.1);
        }
        assert!(!memory.has_aggro());
        assert_eq!(memory.target(), None);

        memory.set_target(Vec3::new(5.0, 0.0, 0.0), 1.0, true);
        for _ in 0..11 {
            memory.advance(0.1);
        }
        assert!(memory.has_aggro());
        assert_eq!(memory.target(), Some(Vec3::new(5.0, 0.0, 0.0)));

        memory.clear_lock();
        memory.advance(0.1);
        assert!(!memory.has_aggro());
    }

    #[test]
    fn set_target_never_shortens_the_window() {
        let mut memory = StatueMemory::new();
        memory.set_target(Vec3::new(1.0, 0.0, 0.0), 10.0, false);
        memory.set_target(Vec3::new(2.0, 0.0, 0.0), 1.0, false);

        for _ in 0..50 {
            memory.advance(0.1);
        }
        // 5 seconds in: a 1-second rewrite would have lapsed already.
        assert!(memory.has_aggro());
        assert_eq!(memory.target(), Some(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn door_pause_expires_back_to_sentinel() {
        let mut memory = StatueMemory::new();
        memory.pause_at_door(Vec3::new(3.0, 0.0, 1.0), 0.75);
        assert!(memory.door_blocked());

        for _ in 0..8 {
            memory.advance(0.1);
        }
        assert!(!memory.door_blocked());
    }
}
