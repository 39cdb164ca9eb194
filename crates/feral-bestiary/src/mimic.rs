//! A face-stealing impostor.
//!
//! Runs down an isolated quarry to convert it, lures witnesses toward
//! the place it was last seen with voice playback, shadows a known
//! quarry from its blind side, and otherwise drifts between posed
//! patrol stops. Freezing is its tell: every branch other than the
//! drift yields while the freeze window runs.

use serde::{Deserialize, Serialize};

use feral_bt::{BtNode, BtStatus, PrioritySelector, Sequence};
use feral_core::{DecayTimer, DeterministicRng, TickContext};
use feral_nav::{clamp01, gateway, inv_lerp, lerp, MoveRequest, NavQuery, TimedPoint, Vec3};
use feral_planner::{score, ChokeProbe, RingProbe, SpotSurvey, SurveyConfig};

use crate::blackboard::Blackboard;
use crate::drive::Creature;
use crate::leaf::{act, cond, streams};
use crate::tuning::{ensure_band, ensure_positive, BestiaryTuning, TuningError, TuningResult};
use crate::world::{BestiaryWorld, HostCue};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MimicTuning {
    /// Lifetime of the conversion intercept point. Kept alive only by
    /// continuous sight of an isolated quarry.
    #[serde(default = "default_intercept_seconds")]
    pub intercept_seconds: f32,
    /// Lifetime of a lure post planted where sight was lost.
    #[serde(default = "default_lure_seconds")]
    pub lure_seconds: f32,
    /// How far ahead of the quarry's motion the intercept aims.
    #[serde(default = "default_lead_seconds")]
    pub lead_seconds: f32,
    #[serde(default = "default_patrol_min_seconds")]
    pub patrol_min_seconds: f32,
    #[serde(default = "default_patrol_max_seconds")]
    pub patrol_max_seconds: f32,
    #[serde(default = "default_survey_cooldown")]
    pub survey_cooldown: f32,
    #[serde(default = "default_survey_cap")]
    pub survey_cap: usize,
    #[serde(default = "default_min_spot_score")]
    pub min_spot_score: f32,
    #[serde(default = "default_spot_band_min")]
    pub spot_band_min: f32,
    #[serde(default = "default_spot_band_max")]
    pub spot_band_max: f32,
}

fn default_intercept_seconds() -> f32 {
    1.5
}

fn default_lure_seconds() -> f32 {
    6.0
}

fn default_lead_seconds() -> f32 {
    0.6
}

fn default_patrol_min_seconds() -> f32 {
    7.0
}

fn default_patrol_max_seconds() -> f32 {
    11.0
}

fn default_survey_cooldown() -> f32 {
    6.0
}

fn default_survey_cap() -> usize {
    18
}

fn default_min_spot_score() -> f32 {
    1.15
}

fn default_spot_band_min() -> f32 {
    5.0
}

fn default_spot_band_max() -> f32 {
    42.0
}

impl Default for MimicTuning {
    fn default() -> Self {
        Self {
            intercept_seconds: default_intercept_seconds(),
            lure_seconds: default_lure_seconds(),
            lead_seconds: default_lead_seconds(),
            patrol_min_seconds: default_patrol_min_seconds(),
            patrol_max_seconds: default_patrol_max_seconds(),
            survey_cooldown: default_survey_cooldown(),
            survey_cap: default_survey_cap(),
            min_spot_score: default_min_spot_score(),
            spot_band_min: default_spot_band_min(),
            spot_band_max: default_spot_band_max(),
        }
    }
}

impl MimicTuning {
    pub(crate) fn validate(&self) -> TuningResult<()> {
        ensure_positive("mimic.intercept_seconds", self.intercept_seconds)?;
        ensure_positive("mimic.lure_seconds", self.lure_seconds)?;
        ensure_positive("mimic.lead_seconds", self.lead_seconds)?;
        ensure_band(
            "mimic.patrol_hold",
            self.patrol_min_seconds,
            self.patrol_max_seconds,
        )?;
        ensure_positive("mimic.survey_cooldown", self.survey_cooldown)?;
        if self.survey_cap == 0 {
            return Err(TuningError::OutOfRange {
                field: "mimic.survey_cap",
                value: 0.0,
                expected: "at least 1",
            });
        }
        if !self.min_spot_score.is_finite() {
            return Err(TuningError::OutOfRange {
                field: "mimic.min_spot_score",
                value: self.min_spot_score,
                expected: "finite",
            });
        }
        ensure_band("mimic.spot_band", self.spot_band_min, self.spot_band_max)?;
        Ok(())
    }
}

/// Impostor state: the intercept and lure points, the vocal cooldown,
/// the freeze window, and the posed patrol stop.
#[derive(Debug, Clone)]
pub struct MimicMemory {
    isolated: bool,
    intercept: TimedPoint,
    post: TimedPoint,
    vocal: DecayTimer,
    freeze: DecayTimer,
    patrol_anchor: Vec3,
    patrol_facing: Vec3,
    patrol_hold: DecayTimer,
    pub survey: SpotSurvey,
}

impl MimicMemory {
    pub fn new(tuning: &MimicTuning) -> Self {
        Self {
            isolated: false,
            intercept: TimedPoint::unset(),
            post: TimedPoint::unset(),
            vocal: DecayTimer::spent(),
            freeze: DecayTimer::spent(),
            patrol_anchor: Vec3::UNSET,
            patrol_facing: Vec3::UNSET,
            patrol_hold: DecayTimer::spent(),
            survey: SpotSurvey::new(
                SurveyConfig::default()
                    .with_cooldown(tuning.survey_cooldown)
                    .with_band(tuning.spot_band_min, tuning.spot_band_max)
                    .with_min_score(tuning.min_spot_score)
                    .with_cap(tuning.survey_cap),
            ),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.intercept.advance(dt);
        self.post.advance(dt);
        self.vocal.advance(dt);
        self.freeze.advance(dt);

        let held = self.patrol_hold.is_active();
        self.patrol_hold.advance(dt);
        if held && !self.patrol_hold.is_active() {
            self.patrol_anchor = Vec3::UNSET;
            self.patrol_facing = Vec3::UNSET;
        }
    }

    pub fn set_isolated(&mut self, isolated: bool) {
        self.isolated = isolated;
    }

    pub fn isolated(&self) -> bool {
        self.isolated
    }

    pub fn plant_intercept(&mut self, point: Vec3, seconds: f32) {
        self.intercept.place(point, seconds);
    }

    pub fn intercept_point(&self) -> Option<Vec3> {
        self.intercept.get()
    }

    pub fn clear_intercept(&mut self) {
        self.intercept.clear();
    }

    pub fn plant_post(&mut self, point: Vec3, seconds: f32) {
        self.post.place(point, seconds);
    }

    pub fn post_point(&self) -> Option<Vec3> {
        self.post.get()
    }

    pub fn clear_post(&mut self) {
        self.post.clear();
    }

    /// Extends the post's life without ever shortening it.
    pub fn reinforce_post(&mut self, seconds: f32) {
        if let Some(point) = self.post.get() {
            self.post.reinforce(point, seconds);
        }
    }

    pub fn vocal_ready(&self) -> bool {
        !self.vocal.is_active()
    }

    pub fn note_vocal(&mut self, cooldown_seconds: f32) {
        self.vocal.set_at_least(cooldown_seconds);
    }

    pub fn frozen(&self) -> bool {
        self.freeze.is_active()
    }

    /// Max-extend; overlapping freezes never cut each other short.
    pub fn trigger_freeze(&mut self, seconds: f32) {
        self.freeze.set_at_least(seconds);
    }

    pub fn set_patrol(&mut self, anchor: Vec3, facing: Vec3, hold_seconds: f32) {
        self.patrol_anchor = anchor;
        self.patrol_facing = facing;
        self.patrol_hold.set(hold_seconds);
    }

    pub fn clear_patrol(&mut self) {
        self.patrol_anchor = Vec3::UNSET;
        self.patrol_facing = Vec3::UNSET;
        self.patrol_hold.clear();
    }

    pub fn has_patrol(&self) -> bool {
        self.patrol_anchor.is_set() && self.patrol_hold.is_active()
    }

    pub fn patrol_anchor(&self) -> Option<Vec3> {
        if self.has_patrol() {
            Some(self.patrol_anchor)
        } else {
            None
        }
    }

    pub fn patrol_facing(&self) -> Option<Vec3> {
        if self.patrol_facing.is_set() {
            Some(self.patrol_facing)
        } else {
            None
        }
    }

    pub fn conversion_window(&self) -> bool {
        self.isolated && self.intercept.is_live() && !self.frozen()
    }

    pub fn lure_window(&self) -> bool {
        self.post.is_live() && !self.frozen()
    }
}

impl Default for MimicMemory {
    fn default() -> Self {
        Self::new(&MimicTuning::default())
    }
}

/// Folds the sample, keeps the intercept alive while an isolated quarry
/// stays in sight, and plants a lure post the moment sight is lost.
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

    let t = &tuning.mimic;
    if let Some(s) = sample {
        board.mimic.set_isolated(s.isolated);
        if s.visible && s.isolated {
            let aim = s.position + s.velocity * t.lead_seconds;
            board.mimic.plant_intercept(aim, t.intercept_seconds);
        }
    }
    if board.quarry.lost_sight() {
        if let Some(last) = board.quarry.last_known() {
            board.mimic.plant_post(last, t.lure_seconds);
        }
    }
}

/// Vocal cue bookkeeping shared by the lure and shadow branches. The
/// cooldown tightens when the quarry is isolated, loosens out of sight,
/// and never drops under 1.5 s. Playback extends a live lure post.
fn perform_vocal<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    min_seconds: f32,
    max_seconds: f32,
    freeze_seconds: f32,
    lure_seconds: f32,
) where
    W: BestiaryWorld,
{
    let mut rng = ctx.rng_for_agent(agent, streams::MIMIC_VOCAL);
    let mut cooldown = lerp(min_seconds, max_seconds, rng.next_f32_unit());
    if board.mimic.isolated() {
        cooldown *= 0.85;
    }
    if !board.quarry.visible() {
        cooldown += 0.4;
    }
    board.mimic.note_vocal(cooldown.max(1.5));
    board.mimic.trigger_freeze(freeze_seconds);
    board.mimic.reinforce_post(lure_seconds);
    world.emit_cue(agent, HostCue::Vocal);
}

/// Sprints to the lead point on an isolated quarry. Contact, or even a
/// near miss on the aim point, ends in a face-steal freeze.
pub fn execute_conversion<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &MimicTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let Some(aim) = board.mimic.intercept_point() else {
        return BtStatus::Failure;
    };
    let quarry = board.quarry.position_or_unset();
    let separation = if quarry.is_set() {
        position.distance(quarry)
    } else {
        f32::INFINITY
    };
    if separation <= 1.4 || position.distance(aim) <= 2.0 {
        board.mimic.trigger_freeze(1.1);
        board.mimic.clear_intercept();
        return BtStatus::Success;
    }

    let speed = lerp(6.25, 9.75, clamp01(board.quarry.speed() / 7.0));
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("mimic.convert", aim)
            .with_sample_radius(4.0)
            .with_budget(48.0)
            .with_profile(speed, 18.0)
            .with_stop(0.3),
    );
    if issued {
        BtStatus::Running
    } else {
        board.mimic.clear_intercept();
        BtStatus::Failure
    }
}

/// Walks to the lure post, then stands there calling toward whoever the
/// lure is for.
pub fn hold_lure<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &MimicTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let Some(post) = board.mimic.post_point() else {
        return BtStatus::Failure;
    };
    if position.distance(post) > 1.1 {
        let issued = gateway::request(
            world,
            agent,
            MoveRequest::to("mimic.lure", post)
                .with_sample_radius(3.0)
                .with_budget(32.0)
                .with_profile(3.1, 6.5)
                .with_stop(0.35)
                .partial(),
        );
        if issued {
            return BtStatus::Running;
        }
        board.mimic.clear_post();
        return BtStatus::Failure;
    }

    world.halt(agent);
    let focal = if board.mimic.isolated() && board.quarry.has_track() {
        board.quarry.last_known()
    } else {
        board.mimic.patrol_facing()
    };
    if let Some(point) = focal {
        world.face_toward(agent, point);
    }
    if board.mimic.vocal_ready() {
        perform_vocal(ctx, agent, world, board, 2.4, 3.8, 0.85, tuning.lure_seconds);
    }
    BtStatus::Running
}

/// Trails a known quarry from its blind side, drifting closer the
/// nearer it already is, with occasional voice playback at close range.
pub fn shadow_quarry<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &MimicTuning,
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
    let visible = board.quarry.visible();
    let distance = position.distance(target);

    let offset_dir = if visible {
        (-board.quarry.facing()).normalized_or(Vec3::new(1.0, 0.0, 0.0))
    } else {
        (position - target)
            .flattened()
            .normalized_or(Vec3::new(1.0, 0.0, 0.0))
    };
    let leash = lerp(2.25, 5.5, clamp01(distance / 14.0));
    let dest = target + offset_dir * leash + gateway::agent_spread(ctx.seed, agent, 1.35);

    let speed = if visible { 4.6 } else { 3.35 };
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("mimic.shadow", dest)
            .with_sample_radius(4.0)
            .with_budget(60.0)
            .with_profile(speed, 8.5)
            .with_stop(0.45)
            .partial(),
    );
    if !issued {
        return BtStatus::Failure;
    }
    if distance <= 3.0 && board.mimic.vocal_ready() {
        let freeze = if visible { 0.35 } else { 0.2 };
        perform_vocal(ctx, agent, world, board, 5.5, 8.5, freeze, tuning.lure_seconds);
    }
    BtStatus::Running
}

/// Static patrol-stop score: prefers chokepoints with all-round cover,
/// shifted toward wherever a lure would land best at rebuild time.
fn patrol_score(
    nav: &dyn NavQuery,
    point: Vec3,
    quarry: Vec3,
    territory: Vec3,
    isolated: bool,
) -> f32 {
    let mut lure_bias = 0.25;
    if quarry.is_set() {
        lure_bias += inv_lerp(18.0, 6.0, point.distance(quarry));
    }
    if isolated {
        lure_bias += 0.15;
    }
    lure_bias += inv_lerp(28.0, 8.0, point.distance(territory)) * 0.35;

    score::choke_rating(nav, point, ChokeProbe::default()) * 1.25
        + score::ring_cover(nav, point, RingProbe::default())
        + lure_bias * 0.75
}

/// The drift: rotates through surveyed patrol stops, orbiting the
/// current anchor and posing at it. A close, watching quarry collapses
/// the orbit onto the quarry itself.
pub fn drift_patrol<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &MimicTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    if board.mimic.frozen() {
        world.halt(agent);
        return BtStatus::Running;
    }
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let territory = world.territory(agent);
    let quarry = board.quarry.position_or_unset();
    let visible = board.quarry.visible();
    let isolated = board.mimic.isolated();
    let quarry_close = visible && quarry.is_set() && position.distance(quarry) < 8.0;

    if quarry_close {
        board.mimic.clear_patrol();
    } else if !board.mimic.has_patrol() {
        let now = ctx.elapsed_seconds;
        let nav = world.nav();
        let pick = board.mimic.survey.next_candidate(nav, territory, now, |nav, point| {
            patrol_score(nav, point, quarry, territory, isolated)
        });
        if let Some(anchor) = pick {
            let facing = score::open_facing(nav, anchor);
            let mut rng = ctx.rng_for_agent(agent, streams::MIMIC_PATROL);
            let hold = lerp(
                tuning.patrol_min_seconds,
                tuning.patrol_max_seconds,
                rng.next_f32_unit(),
            );
            board.mimic.set_patrol(anchor, facing, hold);
        }
    }

    let anchor = board
        .mimic
        .patrol_anchor()
        .or_else(|| board.quarry.last_known())
        .unwrap_or_else(|| if territory.is_set() { territory } else { position });

    let radius = if visible { 2.4 } else { 4.6 };
    let swing = ctx.elapsed_seconds as f32 * 0.7;
    let orbit = Vec3::new(swing.cos() * radius, 0.0, swing.sin() * radius);
    let dest =
        (anchor + orbit + gateway::agent_spread(ctx.seed, agent, 0.6)).with_y(anchor.y);

    let (speed, accel) = if board.mimic.has_patrol() {
        (3.35, 6.75)
    } else {
        (2.8, 5.5)
    };
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("mimic.drift", dest)
            .with_sample_radius(4.0)
            .with_budget(48.0)
            .with_profile(speed, accel)
            .with_stop(0.35)
            .partial(),
    );
    if !issued {
        return BtStatus::Failure;
    }

    if position.distance(anchor) <= 1.2 {
        if let Some(facing) = board.mimic.patrol_facing() {
            world.face_toward(agent, facing);
        }
        let mut rng = ctx.rng_for_agent(agent, streams::MIMIC_PATROL);
        if rng.next_f32_unit() < 0.35 {
            board
                .mimic
                .trigger_freeze(lerp(0.35, 0.6, rng.next_f32_unit()));
        }
    }
    BtStatus::Running
}

/// PrioritySelector(conversion, lure, shadow, drift).
pub fn tree<W>(tuning: BestiaryTuning) -> Box<dyn BtNode<W, Blackboard>>
where
    W: BestiaryWorld + 'static,
{
    let t = tuning;
    Box::new(PrioritySelector::new(
        "mimic",
        vec![
            Box::new(Sequence::new(
                "mimic.convert_seq",
                vec![
                    cond("mimic.conversion_window", move |_, _, _: &W, board: &Blackboard| {
                        board.mimic.conversion_window()
                    }),
                    act("mimic.convert", move |ctx, agent, world: &mut W, board: &mut Blackboard| {
                        execute_conversion(ctx, agent, world, board, &t.mimic)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "mimic.lure_seq",
                vec![
                    cond("mimic.lure_window", move |_, _, _: &W, board: &Blackboard| {
                        board.mimic.lure_window()
                    }),
                    act("mimic.lure", move |ctx, agent, world, board| {
                        hold_lure(ctx, agent, world, board, &t.mimic)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "mimic.shadow_seq",
                vec![
                    cond("mimic.can_shadow", move |_, _, _: &W, board: &Blackboard| {
                        board.quarry.has_track() && !board.mimic.frozen()
                    }),
                    act("mimic.shadow", move |ctx, agent, world, board| {
                        shadow_quarry(ctx, agent, world, board, &t.mimic)
                    }),
                ],
            )),
            act("mimic.drift", move |ctx, agent, world, board| {
                drift_patrol(ctx, agent, world, board, &t.mimic)
            }),
        ],
    ))
}

/// A fully wired mimic: intercept-and-lure sense plus the impostor tree.
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
    fn conversion_window_needs_isolation_sight_and_thaw() {
        let mut memory = MimicMemory::default();
        memory.plant_intercept(Vec3::new(4.0, 0.0, 4.0), 1.5);
        assert!(!memory.conversion_window(), "not isolated yet");

        memory.set_isolated(true);
        assert!(memory.conversion_window());

        memory.trigger_freeze(0.5);
        assert!(!memory.conversion_window(), "frozen");

        for _ in 0..6 {
            memory.advance(0.1);
        }
        assert!(memory.conversion_window(), "thawed with intercept alive");

        for _ in 0..10 {
            memory.advance(0.1);
        }
        assert!(!memory.conversion_window(), "intercept expired");
    }

    #[test]
    fn freeze_only_extends() {
        let mut memory = MimicMemory::default();
        memory.trigger_freeze(1.0);
        memory.trigger_freeze(0.2);
        for _ in 0..5 {
            memory.advance(0.1);
        }
        assert!(memory.frozen(), "shorter trigger must not cut the window");
        for _ in 0..6 {
            memory.advance(0.1);
        }
        assert!(!memory.frozen());
    }

    #[test]
    fn patrol_expires_with_its_hold() {
        let mut memory = MimicMemory::default();
        memory.set_patrol(Vec3::new(9.0, 0.0, 2.0), Vec3::new(9.0, 0.0, 8.0), 1.0);
        assert!(memory.has_patrol());
        assert_eq!(memory.patrol_anchor(), Some(Vec3::new(9.0, 0.0, 2.0)));

        for _ in 0..11 {
            memory.advance(0.1);
        }
        assert!(!memory.has_patrol());
        assert_eq!(memory.patrol_anchor(), None);
        assert_eq!(memory.patrol_facing(), None);
    }

    #[test]
    fn reinforcing_the_post_never_shortens_it() {
        let mut memory = MimicMemory::default();
        memory.plant_post(Vec3::new(2.0, 0.0, 2.0), 6.0);
        memory.reinforce_post(1.0);
        for _ in 0..30 {
            memory.advance(0.1);
        }
        assert!(memory.lure_window(), "post must survive the shorter reinforce");
    }
}
