//! A ceiling ambusher.
//!
//! Plans a tight, dark spot with a usable ceiling, travels there,
//! latches overhead and waits. The wait is bounded three ways: a quiet
//! spot with no foot traffic goes stale, a quarry caught studying the
//! spot blows it, and a drop that wins no prey panics the lurker into
//! relocating. All three roll up into one relocate flag with a cooldown
//! so the planner is not thrashed.

use serde::{Deserialize, Serialize};

use feral_bt::{BtNode, BtStatus, PrioritySelector, Sequence};
use feral_core::{DecayTimer, TickContext};
use feral_nav::{gateway, inv_lerp, lerp, MoveRequest, NavQuery, TimedPoint, Vec3};
use feral_planner::{score, DarknessProbe, SpotSurvey, SurveyConfig, WallProbe};

use crate::blackboard::Blackboard;
use crate::drive::Creature;
use crate::leaf::{act, cond, streams, wander, WanderStyle};
use crate::tuning::{ensure_band, ensure_dot, ensure_positive, BestiaryTuning, TuningResult};
use crate::world::BestiaryWorld;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LurkerTuning {
    /// Seconds without foot traffic before an ambush spot goes stale.
    #[serde(default = "default_quiet_seconds")]
    pub quiet_seconds: f32,
    /// Horizontal radius around the anchor that counts as traffic.
    #[serde(default = "default_traffic_radius")]
    pub traffic_radius: f32,
    /// How long a blown spot stays blown.
    #[serde(default = "default_blown_seconds")]
    pub blown_seconds: f32,
    /// A quarry farther than this cannot blow the spot.
    #[serde(default = "default_blown_distance")]
    pub blown_distance: f32,
    /// Facing dot for "the quarry is studying the spot".
    #[serde(default = "default_blown_dot")]
    pub blown_dot: f32,
    #[serde(default = "default_relocate_cooldown")]
    pub relocate_cooldown: f32,
    /// Relocate cooldown applied when panic forces the flag.
    #[serde(default = "default_panic_cooldown")]
    pub panic_cooldown: f32,
    #[serde(default = "default_drop_cooldown")]
    pub drop_cooldown: f32,
    /// A drop unresolved after this long triggers panic.
    #[serde(default = "default_drop_pending_seconds")]
    pub drop_pending_seconds: f32,
    /// Horizontal reach of the drop zone under the anchor.
    #[serde(default = "default_drop_horizontal")]
    pub drop_horizontal: f32,
    #[serde(default = "default_drop_min_fall")]
    pub drop_min_fall: f32,
    #[serde(default = "default_drop_max_fall")]
    pub drop_max_fall: f32,
    /// Descent alignment: the quarry must be essentially below.
    #[serde(default = "default_drop_dot")]
    pub drop_dot: f32,
    #[serde(default = "default_survey_cooldown")]
    pub survey_cooldown: f32,
    /// Spots scoring below this never enter the candidate list.
    #[serde(default = "default_min_spot_score")]
    pub min_spot_score: f32,
}

fn default_quiet_seconds() -> f32 {
    14.0
}

fn default_traffic_radius() -> f32 {
    2.25
}

fn default_blown_seconds() -> f32 {
    1.25
}

fn default_blown_distance() -> f32 {
    12.0
}

fn default_blown_dot() -> f32 {
    0.7
}

fn default_relocate_cooldown() -> f32 {
    4.0
}

fn default_panic_cooldown() -> f32 {
    5.0
}

fn default_drop_cooldown() -> f32 {
    5.0
}

fn default_drop_pending_seconds() -> f32 {
    3.0
}

fn default_drop_horizontal() -> f32 {
    1.85
}

fn default_drop_min_fall() -> f32 {
    0.7
}

fn default_drop_max_fall() -> f32 {
    6.5
}

fn default_drop_dot() -> f32 {
    0.65
}

fn default_survey_cooldown() -> f32 {
    8.0
}

fn default_min_spot_score() -> f32 {
    0.75
}

impl Default for LurkerTuning {
    fn default() -> Self {
        Self {
            quiet_seconds: default_quiet_seconds(),
            traffic_radius: default_traffic_radius(),
            blown_seconds: default_blown_seconds(),
            blown_distance: default_blown_distance(),
            blown_dot: default_blown_dot(),
            relocate_cooldown: default_relocate_cooldown(),
            panic_cooldown: default_panic_cooldown(),
            drop_cooldown: default_drop_cooldown(),
            drop_pending_seconds: default_drop_pending_seconds(),
            drop_horizontal: default_drop_horizontal(),
            drop_min_fall: default_drop_min_fall(),
            drop_max_fall: default_drop_max_fall(),
            drop_dot: default_drop_dot(),
            survey_cooldown: default_survey_cooldown(),
            min_spot_score: default_min_spot_score(),
        }
    }
}

impl LurkerTuning {
    pub(crate) fn validate(&self) -> TuningResult<()> {
        ensure_positive("lurker.quiet_seconds", self.quiet_seconds)?;
        ensure_positive("lurker.traffic_radius", self.traffic_radius)?;
        ensure_positive("lurker.blown_seconds", self.blown_seconds)?;
        ensure_positive("lurker.blown_distance", self.blown_distance)?;
        ensure_dot("lurker.blown_dot", self.blown_dot)?;
        ensure_positive("lurker.relocate_cooldown", self.relocate_cooldown)?;
        ensure_positive("lurker.panic_cooldown", self.panic_cooldown)?;
        ensure_positive("lurker.drop_cooldown", self.drop_cooldown)?;
        ensure_positive("lurker.drop_pending_seconds", self.drop_pending_seconds)?;
        ensure_positive("lurker.drop_horizontal", self.drop_horizontal)?;
        ensure_band("lurker.drop_fall", self.drop_min_fall, self.drop_max_fall)?;
        ensure_dot("lurker.drop_dot", self.drop_dot)?;
        ensure_positive("lurker.survey_cooldown", self.survey_cooldown)?;
        if !self.min_spot_score.is_finite() {
            return Err(crate::tuning::TuningError::OutOfRange {
                field: "lurker.min_spot_score",
                value: self.min_spot_score,
                expected: "finite",
            });
        }
        Ok(())
    }
}

/// Ambush bookkeeping. The clinging state itself is host physics and
/// is read back through `HostEffects::is_latched`, never mirrored here.
#[derive(Debug, Clone)]
pub struct LurkerMemory {
    anchor: Vec3,
    ceiling: Vec3,
    relocate: bool,
    relocate_cooldown: DecayTimer,
    relocate_seconds: f32,
    quiet: DecayTimer,
    spot_blown: DecayTimer,
    drop_cooldown: DecayTimer,
    drop_pending: DecayTimer,
    pending: bool,
    panic: bool,
    pub survey: SpotSurvey,
    pub roam: TimedPoint,
}

impl LurkerMemory {
    pub fn new(tuning: &LurkerTuning) -> Self {
        Self {
            anchor: Vec3::UNSET,
            ceiling: Vec3::UNSET,
            relocate: false,
            relocate_cooldown: DecayTimer::spent(),
            relocate_seconds: tuning.relocate_cooldown,
            quiet: DecayTimer::spent(),
            spot_blown: DecayTimer::spent(),
            drop_cooldown: DecayTimer::spent(),
            drop_pending: DecayTimer::spent(),
            pending: false,
            panic: false,
            survey: SpotSurvey::new(
                SurveyConfig::default()
                    .with_cooldown(tuning.survey_cooldown)
                    .with_min_score(tuning.min_spot_score),
            ),
            roam: TimedPoint::unset(),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.relocate_cooldown.advance(dt);
        self.spot_blown.advance(dt);
        self.drop_cooldown.advance(dt);

        let drop_was_pending = self.drop_pending.is_active();
        self.drop_pending.advance(dt);
        if self.pending && drop_was_pending && !self.drop_pending.is_active() {
            // The drop never resolved into a latch.
            self.pending = false;
            self.panic = true;
        }

        self.quiet.advance(dt);
        if self.anchor.is_set() && !self.quiet.is_active() {
            self.flag_relocate(self.relocate_seconds);
        }

        self.roam.advance(dt);
    }

    /// Commits a fresh spot: full quiet window, blown state cleared,
    /// relocate consumed.
    pub fn set_ambush(&mut self, anchor: Vec3, ceiling: Vec3, quiet_seconds: f32) {
        self.anchor = anchor;
        self.ceiling = ceiling;
        self.quiet.set(quiet_seconds);
        self.spot_blown.clear();
        self.relocate = false;
        self.pending = false;
    }

    /// Abandons the spot outright. Sets the relocate flag directly,
    /// bypassing the cooldown.
    pub fn clear_ambush(&mut self) {
        self.anchor = Vec3::UNSET;
        self.ceiling = Vec3::UNSET;
        self.relocate = true;
    }

    /// Requests a relocate; no-op while the cooldown is running.
    pub fn flag_relocate(&mut self, cooldown_seconds: f32) {
        if self.relocate_cooldown.is_active() {
            return;
        }
        self.relocate = true;
        self.relocate_cooldown.set(cooldown_seconds);
    }

    /// Panic forces the flag through the cooldown.
    pub fn enter_panic(&mut self, cooldown_seconds: f32) {
        self.panic = true;
        self.relocate = true;
        self.relocate_cooldown.set(cooldown_seconds);
    }

    pub fn resolve_panic(&mut self) {
        self.panic = false;
    }

    /// Foot traffic near the anchor keeps the spot interesting.
    pub fn note_traffic(&mut self, quiet_seconds: f32) {
        self.quiet.set(quiet_seconds);
    }

    pub fn mark_spot_blown(&mut self, seconds: f32) {
        self.spot_blown.set_at_least(seconds);
    }

    pub fn register_drop(&mut self, pending_seconds: f32, cooldown_seconds: f32, quiet_seconds: f32) {
        self.pending = true;
        self.drop_pending.set(pending_seconds);
        self.drop_cooldown.set(cooldown_seconds);
        self.quiet.set(quiet_seconds);
    }

    /// The drop resolved: prey latched, nothing to panic about.
    pub fn complete_latch(&mut self) {
        self.pending = false;
        self.panic = false;
    }

    pub fn has_ambush(&self) -> bool {
        self.anchor.is_set()
    }

    pub fn anchor(&self) -> Option<Vec3> {
        if self.anchor.is_set() {
            Some(self.anchor)
        } else {
            None
        }
    }

    pub fn ceiling(&self) -> Option<Vec3> {
        if self.ceiling.is_set() {
            Some(self.ceiling)
        } else {
            None
        }
    }

    pub fn needs_ambush(&self) -> bool {
        !self.has_ambush() || self.relocate
    }

    pub fn relocate_flagged(&self) -> bool {
        self.relocate
    }

    pub fn spot_blown_active(&self) -> bool {
        self.spot_blown.is_active()
    }

    pub fn drop_ready(&self) -> bool {
        !self.drop_cooldown.is_active() && !self.pending && self.has_ambush()
    }

    pub fn in_panic(&self) -> bool {
        self.panic
    }
}

impl Default for LurkerMemory {
    fn default() -> Self {
        Self::new(&LurkerTuning::default())
    }
}

/// Static spot score: tight walls, a usable ceiling hang that cannot
/// be seen from far away, and darkness. No ceiling disqualifies.
pub fn ambush_score(nav: &dyn NavQuery, point: Vec3) -> f32 {
    let Some((hang, _clearance)) = score::ceiling_hang(nav, point) else {
        return f32::NEG_INFINITY;
    };
    score::wall_closeness(nav, point, WallProbe::default())
        + score::hang_seclusion(nav, hang)
        + score::ambient_darkness(
            nav,
            point,
            DarknessProbe {
                lit_floor: 0.0,
                dark_ceiling: 1.5,
                ..DarknessProbe::default()
            },
        )
}

/// Folds the sample and maintains the spot health laws: traffic near
/// the anchor refills the quiet window, a quarry studying the spot
/// blows it, and being seen while blown forces a relocate.
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

    let t = &tuning.lurker;
    let Some(anchor) = board.lurker.anchor() else {
        return;
    };
    let Some(s) = sample else {
        return;
    };
    if anchor.horizontal_distance(s.position) <= t.traffic_radius {
        board.lurker.note_traffic(t.quiet_seconds);
    }
    if s.visible && s.position.distance(anchor) <= t.blown_distance {
        let toward_spot = (anchor - s.position).normalized_or(Vec3::ZERO);
        if s.facing.dot(toward_spot) > t.blown_dot {
            board.lurker.mark_spot_blown(t.blown_seconds);
        }
    }
    if board.lurker.spot_blown_active() && s.visible {
        board.lurker.flag_relocate(t.relocate_cooldown);
    }
}

pub fn quarry_in_drop_zone<W>(
    world: &W,
    agent: W::Agent,
    board: &Blackboard,
    tuning: &LurkerTuning,
) -> bool
where
    W: BestiaryWorld,
{
    if !world.is_latched(agent) || !board.lurker.drop_ready() {
        return false;
    }
    let (Some(anchor), Some(ceiling)) = (board.lurker.anchor(), board.lurker.ceiling()) else {
        return false;
    };
    if !board.quarry.visible() {
        return false;
    }
    let Some(quarry) = board.quarry.last_known() else {
        return false;
    };
    if anchor.horizontal_distance(quarry) > tuning.drop_horizontal {
        return false;
    }
    let fall = ceiling.y - quarry.y;
    if !(tuning.drop_min_fall..=tuning.drop_max_fall).contains(&fall) {
        return false;
    }
    let descent = (quarry - ceiling).normalized_or(Vec3::ZERO);
    descent.dot(Vec3::DOWN) > tuning.drop_dot
}

/// Surveys for a spot, biased toward the quarry when one is known and
/// gently toward home territory otherwise. The winning point's ceiling
/// hang is recomputed so anchor and ceiling stay paired.
pub fn plan_ambush<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &LurkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let territory = world.territory(agent);
    let quarry = board.quarry.position_or_unset();
    let now = ctx.elapsed_seconds;
    let quiet_seconds = tuning.quiet_seconds;

    let nav = world.nav();
    let pick = board.lurker.survey.select_best(nav, position, now, ambush_score, |point| {
        if quarry.is_set() {
            lerp(1.75, -0.5, inv_lerp(3.0, 24.0, point.distance(quarry)))
        } else {
            lerp(0.8, 0.1, inv_lerp(4.0, 25.0, point.distance(territory)))
        }
    });
    let Some(anchor) = pick else {
        board.lurker.clear_ambush();
        return BtStatus::Failure;
    };
    let Some((hang, _)) = score::ceiling_hang(nav, anchor) else {
        board.lurker.clear_ambush();
        return BtStatus::Failure;
    };
    board.lurker.set_ambush(anchor, hang, quiet_seconds);
    BtStatus::Success
}

pub fn travel_to_ambush<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &LurkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(anchor) = board.lurker.anchor() else {
        return BtStatus::Failure;
    };
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    if position.distance(anchor) <= 0.9 {
        board.lurker.resolve_panic();
        return BtStatus::Success;
    }
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("lurker.travel", anchor)
            .with_sample_radius(2.5)
            .with_budget(32.0)
            .with_profile(4.75, 9.5)
            .with_stop(0.4)
            .partial(),
    );
    if issued {
        BtStatus::Running
    } else {
        board.lurker.flag_relocate(tuning.relocate_cooldown);
        BtStatus::Failure
    }
}

/// Starts the host latch once within reach of the anchor; `Running`
/// until the host reports the agent clinging.
pub fn latch_ceiling<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &LurkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    if world.is_latched(agent) {
        return BtStatus::Success;
    }
    let Some(ceiling) = board.lurker.ceiling() else {
        return BtStatus::Failure;
    };
    let Some(anchor) = board.lurker.anchor() else {
        return BtStatus::Failure;
    };
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    if position.distance(anchor) > 1.5 {
        return BtStatus::Failure;
    }
    world.halt(agent);
    world.latch_ceiling(agent, ceiling);
    BtStatus::Running
}

/// The wait itself. Losing the latch mid-hold flags a relocate; a
/// host-reported prey latch resolves any pending drop.
pub fn hold_ambush<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &LurkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    if !world.is_latched(agent) {
        board.lurker.flag_relocate(tuning.relocate_cooldown);
        return BtStatus::Failure;
    }
    if world.has_latched_prey(agent) {
        board.lurker.complete_latch();
    }
    BtStatus::Running
}

pub fn execute_drop<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &LurkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    if !world.is_latched(agent) {
        return BtStatus::Failure;
    }
    world.drop_attack(agent);
    board.lurker.register_drop(
        tuning.drop_pending_seconds,
        tuning.drop_cooldown,
        tuning.quiet_seconds,
    );
    BtStatus::Success
}

/// Flees to the survey candidate farthest from the threat, releasing
/// any latch first. Reaching the escape point resolves the panic.
pub fn navigate_panic<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &LurkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    board.lurker.flag_relocate(tuning.relocate_cooldown);
    if world.is_latched(agent) {
        world.release_ceiling(agent);
    }
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let threat = board.quarry.position_or_unset();
    let now = ctx.elapsed_seconds;

    let nav = world.nav();
    let escape = board
        .lurker
        .survey
        .select_escape(nav, position, now, ambush_score, threat);
    let goal = match escape {
        Some(point) => point,
        None => {
            let away = if threat.is_set() {
                (position - threat).flattened().normalized_or(Vec3::new(1.0, 0.0, 0.0))
            } else if ctx.agent_seed(agent, streams::LURKER_ROAM) & 1 == 0 {
                Vec3::new(1.0, 0.0, 0.0)
            } else {
                Vec3::new(-1.0, 0.0, 0.0)
            };
            position + away * 4.0
        }
    };
    if position.distance(goal) <= 1.2 {
        board.lurker.resolve_panic();
        return BtStatus::Success;
    }
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("lurker.panic", goal)
            .with_sample_radius(3.5)
            .with_budget(28.0)
            .with_profile(8.5, 16.0)
            .with_stop(0.35)
            .partial(),
    );
    if issued {
        BtStatus::Running
    } else {
        board.lurker.resolve_panic();
        BtStatus::Failure
    }
}

pub fn roam<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &LurkerTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let style = WanderStyle {
        label: "lurker.roam",
        radius: 3.0,
        hold_seconds: 6.0,
        arrive: 1.0,
        sample_radius: 3.0,
        max_path_len: 18.0,
        speed: 3.25,
        acceleration: 6.0,
        stop: 0.4,
        spread: 0.0,
        stream: streams::LURKER_ROAM,
    };
    if wander(ctx, agent, world, &mut board.lurker.roam, &style) {
        BtStatus::Running
    } else {
        BtStatus::Failure
    }
}

/// PrioritySelector(panic, drop, plan, approach, hold, roam).
pub fn tree<W>(tuning: BestiaryTuning) -> Box<dyn BtNode<W, Blackboard>>
where
    W: BestiaryWorld + 'static,
{
    let t = tuning;
    Box::new(PrioritySelector::new(
        "lurker",
        vec![
            Box::new(Sequence::new(
                "lurker.panic_seq",
                vec![
                    cond("lurker.in_panic", move |_, _, _: &W, board: &Blackboard| {
                        board.lurker.in_panic()
                    }),
                    act("lurker.panic", move |ctx, agent, world: &mut W, board: &mut Blackboard| {
                        navigate_panic(ctx, agent, world, board, &t.lurker)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "lurker.drop_seq",
                vec![
                    cond("lurker.drop_zone", move |_, agent, world: &W, board: &Blackboard| {
                        quarry_in_drop_zone(world, agent, board, &t.lurker)
                    }),
                    act("lurker.drop", move |ctx, agent, world, board| {
                        execute_drop(ctx, agent, world, board, &t.lurker)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "lurker.plan_seq",
                vec![
                    cond("lurker.needs_ambush", move |_, _, _: &W, board: &Blackboard| {
                        board.lurker.needs_ambush()
                    }),
                    act("lurker.plan", move |ctx, agent, world, board| {
                        plan_ambush(ctx, agent, world, board, &t.lurker)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "lurker.approach_seq",
                vec![
                    cond("lurker.approaching", move |_, agent, world: &W, board: &Blackboard| {
                        board.lurker.has_ambush() && !world.is_latched(agent)
                    }),
                    act("lurker.travel", move |ctx, agent, world, board| {
                        travel_to_ambush(ctx, agent, world, board, &t.lurker)
                    }),
                    act("lurker.latch", move |ctx, agent, world, board| {
                        latch_ceiling(ctx, agent, world, board, &t.lurker)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "lurker.hold_seq",
                vec![
                    cond("lurker.holding", move |_, agent, world: &W, board: &Blackboard| {
                        board.lurker.has_ambush() && world.is_latched(agent)
                    }),
                    act("lurker.hold", move |ctx, agent, world, board| {
                        hold_ambush(ctx, agent, world, board, &t.lurker)
                    }),
                ],
            )),
            act("lurker.roam", move |ctx, agent, world, board| {
                roam(ctx, agent, world, board, &t.lurker)
            }),
        ],
    ))
}

/// A fully wired lurker: spot-health sense plus the ambush tree.
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
    fn quiet_lapse_flags_relocate_once_per_cooldown() {
        let tuning = LurkerTuning::default();
        let mut memory = LurkerMemory::new(&tuning);
        memory.set_ambush(Vec3::new(5.0, 0.0, 5.0), Vec3::new(5.0, 3.0, 5.0), 1.0);
        assert!(!memory.needs_ambush());

        for _ in 0..11 {
            memory.advance(0.1);
        }
        assert!(memory.relocate_flagged());
        assert!(memory.needs_ambush());
    }

    #[test]
    fn relocate_flag_respects_cooldown_but_panic_forces_it() {
        let tuning = LurkerTuning::default();
        let mut memory = LurkerMemory::new(&tuning);
        memory.flag_relocate(4.0);
        assert!(memory.relocate_flagged());

        memory.set_ambush(Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 3.0, 1.0), 14.0);
        assert!(!memory.relocate_flagged());

        // Cooldown still running: a second flag is ignored.
        memory.flag_relocate(4.0);
        assert!(!memory.relocate_flagged());

        memory.enter_panic(5.0);
        assert!(memory.relocate_flagged());
        assert!(memory.in_panic());
    }

    #[test]
    fn unresolved_drop_panics() {
        let tuning = LurkerTuning::default();
        let mut memory = LurkerMemory::new(&tuning);
        memory.set_ambush(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0), 14.0);
        memory.register_drop(0.5, 5.0, 14.0);
        assert!(!memory.drop_ready());
        assert!(!memory.in_panic());

        for _ in 0..6 {
            memory.advance(0.1);
        }
        assert!(memory.in_panic());

        memory.resolve_panic();
        assert!(!memory.in_panic());
    }

    #[test]
    fn latch_completion_clears_pending_drop() {
        let tuning = LurkerTuning::default();
        let mut memory = LurkerMemory::new(&tuning);
        memory.set_ambush(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0), 14.0);
        memory.register_drop(3.0, 5.0, 14.0);
        memory.complete_latch();

        for _ in 0..40 {
            memory.advance(0.1);
        }
        assert!(!memory.in_panic());
        // Cooldown spent and no drop pending: ready again.
        assert!(memory.drop_ready());
    }

    #[test]
    fn drop_zone_wants_the_quarry_below() {
        let tuning = LurkerTuning::default();
        let anchor = Vec3::new(5.0, 0.0, 5.0);
        let ceiling = Vec3::new(5.0, 3.5, 5.0);

        let below = Vec3::new(5.2, 0.0, 5.1);
        let fall = ceiling.y - below.y;
        assert!((tuning.drop_min_fall..=tuning.drop_max_fall).contains(&fall));
        let descent = (below - ceiling).normalized_or(Vec3::ZERO);
        assert!(descent.dot(Vec3::DOWN) > tuning.drop_dot);
        assert!(anchor.horizontal_distance(below) <= tuning.drop_horizontal);

        // Off to the side: alignment with straight down fails first.
        let aside = Vec3::new(9.0, 0.0, 5.0);
        let descent = (aside - ceiling).normalized_or(Vec3::ZERO);
        assert!(descent.dot(Vec3::DOWN) <= tuning.drop_dot);
    }
}
