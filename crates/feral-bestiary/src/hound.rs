//! A blind charger.
//!
//! Sees nothing, hears everything. Loud noise above the charge
//! threshold earns a full-speed lunge at the source; quiet noise earns
//! a trot over to sniff at it. A stimulus that jumps to a fresh place
//! arms a one-shot interrupt so the reaction is instant even during
//! the post-lunge recovery.

use serde::{Deserialize, Serialize};

use feral_bt::{BtNode, BtStatus, PrioritySelector, Sequence};
use feral_core::{DecayTimer, TickContext};
use feral_nav::{clamp01, gateway, inv_lerp, lerp, MoveRequest, TimedPoint, Vec3};

use crate::blackboard::Blackboard;
use crate::drive::Creature;
use crate::leaf::{act, cond, streams, wander, WanderStyle};
use crate::tuning::{ensure_positive, BestiaryTuning, TuningResult};
use crate::world::BestiaryWorld;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoundTuning {
    #[serde(default = "default_hearing_radius")]
    pub hearing_radius: f32,
    /// Heat at or above this registers as a charge stimulus.
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f32,
    #[serde(default = "default_high_seconds")]
    pub high_seconds: f32,
    #[serde(default = "default_low_seconds")]
    pub low_seconds: f32,
    /// Heat below this is ignored outright.
    #[serde(default = "default_min_heat")]
    pub min_heat: f32,
    /// A stimulus moving farther than this re-arms its interrupt.
    #[serde(default = "default_rearm_distance")]
    pub rearm_distance: f32,
}

fn default_hearing_radius() -> f32 {
    30.0
}

fn default_high_threshold() -> f32 {
    4.0
}

fn default_high_seconds() -> f32 {
    6.0
}

fn default_low_seconds() -> f32 {
    12.0
}

fn default_min_heat() -> f32 {
    0.5
}

fn default_rearm_distance() -> f32 {
    2.0
}

impl Default for HoundTuning {
    fn default() -> Self {
        Self {
            hearing_radius: default_hearing_radius(),
            high_threshold: default_high_threshold(),
            high_seconds: default_high_seconds(),
            low_seconds: default_low_seconds(),
            min_heat: default_min_heat(),
            rearm_distance: default_rearm_distance(),
        }
    }
}

impl HoundTuning {
    pub(crate) fn validate(&self) -> TuningResult<()> {
        ensure_positive("hound.hearing_radius", self.hearing_radius)?;
        ensure_positive("hound.high_threshold", self.high_threshold)?;
        ensure_positive("hound.high_seconds", self.high_seconds)?;
        ensure_positive("hound.low_seconds", self.low_seconds)?;
        ensure_positive("hound.min_heat", self.min_heat)?;
        ensure_positive("hound.rearm_distance", self.rearm_distance)?;
        Ok(())
    }
}

/// One auditory stimulus slot: the heard point, how loud it was, and a
/// one-shot interrupt that arms only when the slot was dead or the
/// point jumped.
#[derive(Debug, Clone, Default)]
struct Stimulus {
    point: TimedPoint,
    intensity: f32,
    interrupt: bool,
}

impl Stimulus {
    fn register(&mut self, position: Vec3, intensity: f32, seconds: f32, rearm_distance: f32) {
        let fresh = match self.point.get() {
            Some(held) => held.distance(position) > rearm_distance,
            None => true,
        };
        if fresh {
            self.interrupt = true;
        }
        self.point.place(position, seconds);
        self.intensity = intensity;
    }

    fn advance(&mut self, dt: f32) {
        self.point.advance(dt);
        if !self.point.is_live() {
            self.intensity = 0.0;
            self.interrupt = false;
        }
    }

    fn clear(&mut self) {
        self.point.clear();
        self.intensity = 0.0;
        self.interrupt = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct HoundMemory {
    high: Stimulus,
    low: Stimulus,
    charge_cooldown: DecayTimer,
    pub roam: TimedPoint,
}

impl HoundMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f32) {
        self.high.advance(dt);
        self.low.advance(dt);
        self.charge_cooldown.advance(dt);
        self.roam.advance(dt);
    }

    pub fn set_high(&mut self, position: Vec3, intensity: f32, seconds: f32, rearm_distance: f32) {
        self.high.register(position, intensity, seconds, rearm_distance);
    }

    pub fn set_low(&mut self, position: Vec3, intensity: f32, seconds: f32, rearm_distance: f32) {
        self.low.register(position, intensity, seconds, rearm_distance);
    }

    pub fn has_high(&self) -> bool {
        self.high.point.is_live()
    }

    pub fn has_low(&self) -> bool {
        self.low.point.is_live()
    }

    pub fn high_point(&self) -> Option<Vec3> {
        self.high.point.get()
    }

    pub fn low_point(&self) -> Option<Vec3> {
        self.low.point.get()
    }

    pub fn high_intensity(&self) -> f32 {
        self.high.intensity
    }

    pub fn low_intensity(&self) -> f32 {
        self.low.intensity
    }

    pub fn high_interrupt_pending(&self) -> bool {
        self.high.interrupt
    }

    /// Returns whether the low interrupt was armed, disarming it.
    pub fn consume_low_interrupt(&mut self) -> bool {
        let was = self.low.interrupt;
        self.low.interrupt = false;
        was
    }

    pub fn clear_high(&mut self) {
        self.high.clear();
    }

    pub fn clear_low(&mut self) {
        self.low.clear();
    }

    pub fn charge_ready(&self) -> bool {
        !self.charge_cooldown.is_active()
    }

    pub fn begin_charge_cooldown(&mut self, seconds: f32) {
        self.charge_cooldown.set(seconds);
    }
}

/// Pure hearing. Occlusion between the agent and the source halves the
/// heat; what remains sorts into the charge or the investigate slot.
pub fn sense<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &W,
    board: &mut Blackboard,
    tuning: &BestiaryTuning,
) where
    W: BestiaryWorld,
{
    let t = &tuning.hound;
    let Some(position) = world.position(agent) else {
        return;
    };
    let Some(hot) = world.noise().query_hottest(position, t.hearing_radius) else {
        return;
    };

    let origin = position + Vec3::UP * 0.5;
    let target = hot.position + Vec3::UP * 0.5;
    let span = origin.distance(target);
    let mut heard = hot.magnitude;
    if span > f32::EPSILON {
        let dir = (target - origin).normalized_or(Vec3::ZERO);
        if dir.is_set() && world.nav().cast(origin, dir, span).is_some() {
            heard *= 0.5;
        }
    }
    if heard < t.min_heat {
        return;
    }

    let intensity = clamp01(inv_lerp(1.0, 8.0, heard));
    if heard >= t.high_threshold {
        board
            .hound
            .set_high(hot.position, intensity, t.high_seconds, t.rearm_distance);
    } else {
        board.hound.set_low(
            hot.position,
            intensity.max(0.2),
            t.low_seconds,
            t.rearm_distance,
        );
    }
}

/// Full-speed lunge at the loud point. Arrival starts the recovery
/// cooldown, scaled by how loud the stimulus was.
pub fn charge<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &HoundTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let Some(point) = board.hound.high_point() else {
        return BtStatus::Failure;
    };
    let intensity = board.hound.high_intensity();
    if position.distance(point) <= 0.75 {
        board.hound.clear_high();
        board
            .hound
            .begin_charge_cooldown(lerp(0.35, 0.85, intensity));
        return BtStatus::Success;
    }
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("hound.charge", point)
            .with_sample_radius(3.5)
            .with_budget(60.0)
            .with_profile(lerp(8.0, 12.5, intensity), lerp(18.0, 30.0, intensity))
            .with_stop(0.1)
            .partial(),
    );
    if issued {
        BtStatus::Running
    } else {
        board.hound.clear_high();
        BtStatus::Failure
    }
}

/// Trot over to the quiet noise and sniff at it. A fresh interrupt
/// snaps the head toward the new spot before moving.
pub fn investigate<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &HoundTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let Some(point) = board.hound.low_point() else {
        return BtStatus::Failure;
    };
    if board.hound.consume_low_interrupt() {
        world.face_toward(agent, point);
    }
    if position.distance(point) <= 0.9 {
        board.hound.clear_low();
        return BtStatus::Success;
    }
    let intensity = board.hound.low_intensity().max(0.2);
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("hound.investigate", point)
            .with_sample_radius(3.0)
            .with_budget(50.0)
            .with_profile(lerp(4.25, 7.25, intensity), lerp(9.0, 18.0, intensity))
            .with_stop(0.35)
            .partial(),
    );
    if issued {
        BtStatus::Running
    } else {
        board.hound.clear_low();
        BtStatus::Failure
    }
}

pub fn prowl<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &HoundTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let style = WanderStyle {
        label: "hound.prowl",
        radius: 3.0,
        hold_seconds: 6.0,
        arrive: 1.0,
        sample_radius: 4.0,
        max_path_len: 30.0,
        speed: 4.25,
        acceleration: 8.5,
        stop: 0.6,
        spread: 0.65,
        stream: streams::HOUND_ROAM,
    };
    if wander(ctx, agent, world, &mut board.hound.roam, &style) {
        BtStatus::Running
    } else {
        BtStatus::Failure
    }
}

/// PrioritySelector(charge, investigate, prowl). A pending interrupt
/// lets a fresh loud stimulus cut through the recovery cooldown.
pub fn tree<W>(tuning: BestiaryTuning) -> Box<dyn BtNode<W, Blackboard>>
where
    W: BestiaryWorld + 'static,
{
    let t = tuning;
    Box::new(PrioritySelector::new(
        "hound",
        vec![
            Box::new(Sequence::new(
                "hound.charge_seq",
                vec![
                    cond("hound.heard_loud", move |_, _, _: &W, board: &Blackboard| {
                        board.hound.has_high()
                            && (board.hound.charge_ready() || board.hound.high_interrupt_pending())
                    }),
                    act("hound.charge", move |ctx, agent, world: &mut W, board: &mut Blackboard| {
                        charge(ctx, agent, world, board, &t.hound)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "hound.investigate_seq",
                vec![
                    cond("hound.heard_soft", move |_, _, _: &W, board: &Blackboard| {
                        board.hound.has_low()
                    }),
                    act("hound.investigate", move |ctx, agent, world, board| {
                        investigate(ctx, agent, world, board, &t.hound)
                    }),
                ],
            )),
            act("hound.prowl", move |ctx, agent, world, board| {
                prowl(ctx, agent, world, board, &t.hound)
            }),
        ],
    ))
}

/// A fully wired hound: hearing-only sense plus the charge tree.
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
    fn interrupt_arms_on_fresh_stimulus_only() {
        let mut memory = HoundMemory::new();
        memory.set_high(Vec3::new(10.0, 0.0, 10.0), 0.8, 6.0, 2.0);
        assert!(memory.high_interrupt_pending());

        memory.clear_high();
        memory.set_high(Vec3::new(10.0, 0.0, 10.0), 0.8, 6.0, 2.0);
        assert!(memory.high_interrupt_pending(), "dead slot counts as fresh");
    }

    #[test]
    fn nearby_refresh_keeps_interrupt_consumed() {
        let mut memory = HoundMemory::new();
        memory.set_low(Vec3::new(10.0, 0.0, 10.0), 0.4, 12.0, 2.0);
        assert!(memory.consume_low_interrupt());

        // Same source shuffling in place: no re-arm.
        memory.set_low(Vec3::new(10.5, 0.0, 10.0), 0.4, 12.0, 2.0);
        assert!(!memory.consume_low_interrupt());

        // A jump beyond the re-arm distance is a new stimulus.
        memory.set_low(Vec3::new(14.0, 0.0, 10.0), 0.4, 12.0, 2.0);
        assert!(memory.consume_low_interrupt());
    }

    #[test]
    fn expiry_zeroes_the_slot() {
        let mut memory = HoundMemory::new();
        memory.set_high(Vec3::new(4.0, 0.0, 4.0), 0.9, 0.5, 2.0);
        for _ in 0..6 {
            memory.advance(0.1);
        }
        assert!(!memory.has_high());
        assert_eq!(memory.high_intensity(), 0.0);
        assert!(!memory.high_interrupt_pending());
    }

    #[test]
    fn recovery_cooldown_gates_and_lapses() {
        let mut memory = HoundMemory::new();
        assert!(memory.charge_ready());
        memory.begin_charge_cooldown(0.6);
        assert!(!memory.charge_ready());
        for _ in 0..7 {
            memory.advance(0.1);
        }
        assert!(memory.charge_ready());
    }
}
