//! A skittish defender.
//!
//! Approaches noise out of curiosity, stands its ground with a warning
//! display when stared at, slips behind occlusion when it has been seen,
//! and only fights when trapped at close range with nowhere to hide.

use serde::{Deserialize, Serialize};

use feral_bt::{BtNode, BtStatus, PrioritySelector, Sequence};
use feral_core::{AgentId, DecayTimer, DeterministicRng, TickContext};
use feral_nav::{clamp01, gateway, inv_lerp, lerp, MoveRequest, NavQuery, TimedPoint, Vec3};
use feral_planner::{score, CoverConfig, CoverQuery, DarknessProbe, WallProbe};

use crate::blackboard::Blackboard;
use crate::drive::Creature;
use crate::leaf::{act, cond, streams};
use crate::tuning::{ensure_band, ensure_dot, ensure_positive, BestiaryTuning, TuningResult};
use crate::world::{BestiaryWorld, HostCue};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkitterTuning {
    /// Seconds of agitation after a threat contact. The window is never
    /// extended by further contact; it must lapse before it re-arms.
    #[serde(default = "default_calm_seconds")]
    pub calm_seconds: f32,
    /// Seconds the agent counts as having been seen after eye contact.
    #[serde(default = "default_exposure_seconds")]
    pub exposure_seconds: f32,
    #[serde(default = "default_warn_cooldown")]
    pub warn_cooldown: f32,
    /// Threat closer than this with no usable cover means a fight.
    #[serde(default = "default_corner_distance")]
    pub corner_distance: f32,
    #[serde(default = "default_intimidate_distance")]
    pub intimidate_distance: f32,
    /// Facing dot for "the quarry is staring at me".
    #[serde(default = "default_intimidate_dot")]
    pub intimidate_dot: f32,
    /// Lifetime of an assigned occlusion point.
    #[serde(default = "default_occlusion_seconds")]
    pub occlusion_seconds: f32,
    /// Sight range for registering a threat contact.
    #[serde(default = "default_detect_distance")]
    pub detect_distance: f32,
    /// Contact range that registers even without line of sight.
    #[serde(default = "default_bump_distance")]
    pub bump_distance: f32,
}

fn default_calm_seconds() -> f32 {
    6.0
}

fn default_exposure_seconds() -> f32 {
    4.0
}

fn default_warn_cooldown() -> f32 {
    2.5
}

fn default_corner_distance() -> f32 {
    4.5
}

fn default_intimidate_distance() -> f32 {
    12.0
}

fn default_intimidate_dot() -> f32 {
    0.45
}

fn default_occlusion_seconds() -> f32 {
    8.0
}

fn default_detect_distance() -> f32 {
    16.0
}

fn default_bump_distance() -> f32 {
    2.5
}

impl Default for SkitterTuning {
    fn default() -> Self {
        Self {
            calm_seconds: default_calm_seconds(),
            exposure_seconds: default_exposure_seconds(),
            warn_cooldown: default_warn_cooldown(),
            corner_distance: default_corner_distance(),
            intimidate_distance: default_intimidate_distance(),
            intimidate_dot: default_intimidate_dot(),
            occlusion_seconds: default_occlusion_seconds(),
            detect_distance: default_detect_distance(),
            bump_distance: default_bump_distance(),
        }
    }
}

impl SkitterTuning {
    pub(crate) fn validate(&self) -> TuningResult<()> {
        ensure_positive("skitter.calm_seconds", self.calm_seconds)?;
        ensure_positive("skitter.exposure_seconds", self.exposure_seconds)?;
        ensure_positive("skitter.warn_cooldown", self.warn_cooldown)?;
        ensure_positive("skitter.corner_distance", self.corner_distance)?;
        ensure_positive("skitter.intimidate_distance", self.intimidate_distance)?;
        ensure_dot("skitter.intimidate_dot", self.intimidate_dot)?;
        ensure_positive("skitter.occlusion_seconds", self.occlusion_seconds)?;
        ensure_band("skitter.sense_band", self.bump_distance, self.detect_distance)?;
        Ok(())
    }
}

/// Threat and cover state. `threat` is the last contact position and is
/// never decayed; every derived gate goes through the agitation or
/// exposure windows instead.
#[derive(Debug, Clone)]
pub struct SkitterMemory {
    threat: Vec3,
    exposure: DecayTimer,
    unsettled: DecayTimer,
    warn: DecayTimer,
    occlusion: TimedPoint,
    occlusion_blocked: bool,
    footsteps: Vec3,
}

impl SkitterMemory {
    pub fn new() -> Self {
        Self {
            threat: Vec3::UNSET,
            exposure: DecayTimer::spent(),
            unsettled: DecayTimer::spent(),
            warn: DecayTimer::spent(),
            occlusion: TimedPoint::unset(),
            occlusion_blocked: false,
            footsteps: Vec3::UNSET,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.exposure.advance(dt);
        self.unsettled.advance(dt);
        self.warn.advance(dt);
        self.occlusion.advance(dt);
    }

    /// Registers a threat contact. Eye contact arms the exposure window;
    /// the agitation window arms only if it has fully lapsed.
    pub fn touch_threat(&mut self, position: Vec3, eye_contact: bool, exposure_seconds: f32, calm_seconds: f32) {
        self.threat = position;
        if eye_contact {
            self.exposure.set(exposure_seconds);
        }
        if !self.unsettled.is_active() {
            self.unsettled.set(calm_seconds);
        }
    }

    pub fn exposed(&self) -> bool {
        self.exposure.is_active()
    }

    pub fn unsettled(&self) -> bool {
        self.unsettled.is_active()
    }

    pub fn threat_or_unset(&self) -> Vec3 {
        self.threat
    }

    pub fn warn_ready(&self) -> bool {
        !self.warn.is_active()
    }

    pub fn trigger_warning(&mut self, cooldown_seconds: f32) {
        self.warn.set(cooldown_seconds);
    }

    pub fn has_occlusion(&self) -> bool {
        self.occlusion.is_live()
    }

    pub fn occlusion_point(&self) -> Option<Vec3> {
        self.occlusion.get()
    }

    pub fn assign_occlusion(&mut self, point: Vec3, seconds: f32) {
        self.occlusion.place(point, seconds);
        self.occlusion_blocked = false;
    }

    /// Max-extend while holding the reached point.
    pub fn reinforce_occlusion(&mut self, point: Vec3, seconds: f32) {
        self.occlusion.reinforce(point, seconds);
    }

    pub fn clear_occlusion(&mut self) {
        self.occlusion.clear();
        self.occlusion_blocked = false;
    }

    pub fn flag_occlusion_blocked(&mut self) {
        self.occlusion_blocked = true;
    }

    pub fn occlusion_blocked(&self) -> bool {
        self.occlusion_blocked
    }

    /// Exposed, or agitated with nowhere assigned to hide.
    pub fn needs_occlusion(&self) -> bool {
        self.exposed() || (self.unsettled() && !self.has_occlusion())
    }

    pub fn set_footsteps(&mut self, direction: Vec3) {
        self.footsteps = direction;
    }

    pub fn footsteps(&self) -> Option<Vec3> {
        if self.footsteps.is_set() {
            Some(self.footsteps)
        } else {
            None
        }
    }
}

impl Default for SkitterMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds the sample into threat contacts and pulls the loudest nearby
/// noise into a skulk direction.
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

    let t = &tuning.skitter;
    if let Some(s) = sample {
        if position.is_set() {
            let distance = position.distance(s.position);
            if s.visible && distance <= t.detect_distance {
                board
                    .skitter
                    .touch_threat(s.position, true, t.exposure_seconds, t.calm_seconds);
            } else if distance <= t.bump_distance {
                board
                    .skitter
                    .touch_threat(s.position, false, t.exposure_seconds, t.calm_seconds);
            }
        }
    }

    let heard = if position.is_set() {
        world
            .noise()
            .query_hottest(position, t.detect_distance)
            .map(|hot| (hot.position - position).flattened().normalized_or(Vec3::UNSET))
            .unwrap_or(Vec3::UNSET)
    } else {
        Vec3::UNSET
    };
    board.skitter.set_footsteps(heard);
}

/// Side-to-side weave factor, flipping on a per-agent phase so a pack
/// does not dodge in unison.
fn weave_sign(agent_id: u64, elapsed: f32) -> f32 {
    let phase = (agent_id % 16) as f32 * 0.3;
    if (elapsed * 0.85 + phase).sin() >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

pub fn is_cornered<W>(world: &W, agent: W::Agent, board: &Blackboard, tuning: &SkitterTuning) -> bool
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return false;
    };
    let threat = board.skitter.threat_or_unset();
    if !threat.is_set() || !board.skitter.unsettled() {
        return false;
    }
    if position.distance(threat) > tuning.corner_distance {
        return false;
    }
    let has_escape = board.skitter.has_occlusion() && !board.skitter.occlusion_blocked();
    !has_escape
}

pub fn should_intimidate<W>(
    world: &W,
    agent: W::Agent,
    board: &Blackboard,
    tuning: &SkitterTuning,
) -> bool
where
    W: BestiaryWorld,
{
    if !board.quarry.visible() || !board.skitter.warn_ready() {
        return false;
    }
    let Some(position) = world.position(agent) else {
        return false;
    };
    let Some(quarry) = board.quarry.last_known() else {
        return false;
    };
    if position.distance(quarry) > tuning.intimidate_distance {
        return false;
    }
    let delta = position - quarry;
    if delta.dot(delta) < 0.5 {
        return false;
    }
    let toward_agent = delta.normalized_or(Vec3::ZERO);
    board.quarry.facing().dot(toward_agent) > tuning.intimidate_dot
}

/// Trapped: face the threat, burst, and bolt sideways-and-away. The
/// held occlusion point is abandoned, forcing a fresh pick afterwards.
pub fn cornered_burst<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &SkitterTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let threat = board.skitter.threat_or_unset();
    if !threat.is_set() {
        return BtStatus::Failure;
    }
    world.face_toward(agent, threat);
    if board.skitter.warn_ready() {
        world.emit_cue(agent, HostCue::SporeBurst);
        if position.distance(threat) <= tuning.bump_distance {
            world.emit_cue(agent, HostCue::Bite);
        }
        board.skitter.trigger_warning(tuning.warn_cooldown);
    }

    let away = (position - threat)
        .flattened()
        .normalized_or(Vec3::new(1.0, 0.0, 0.0));
    let side = Vec3::new(-away.z, 0.0, away.x);
    let weave = weave_sign(agent.stable_id(), ctx.elapsed_seconds as f32);
    let goal = position + (away + side * (0.55 * weave)) * 8.0;

    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("skitter.burst", goal)
            .with_sample_radius(2.5)
            .with_budget(22.0)
            .with_profile(8.25, 16.0)
            .with_stop(0.25)
            .partial(),
    );
    if issued {
        board.skitter.clear_occlusion();
        BtStatus::Running
    } else {
        BtStatus::Failure
    }
}

/// Stared-at: hold the stare back, warn on cooldown, and back away at
/// a walk. A refused retreat move still succeeds; standing ground is
/// the point.
pub fn intimidate<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &SkitterTuning,
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
    world.face_toward(agent, quarry);
    if board.skitter.warn_ready() {
        world.emit_cue(agent, HostCue::Warn);
        board.skitter.trigger_warning(tuning.warn_cooldown);
    }

    let away = (position - quarry)
        .flattened()
        .normalized_or(Vec3::new(1.0, 0.0, 0.0));
    let side = Vec3::new(-away.z, 0.0, away.x);
    let weave = weave_sign(agent.stable_id(), ctx.elapsed_seconds as f32);
    let goal = position + (away + side * (0.3 * weave)) * 4.0;

    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("skitter.retreat", goal)
            .with_sample_radius(1.5)
            .with_budget(14.0)
            .with_profile(3.4, 8.0)
            .with_stop(0.3)
            .partial(),
    );
    if issued {
        BtStatus::Running
    } else {
        BtStatus::Success
    }
}

/// Occlusion score relative to the current threat: sightline blockage
/// dominates, tight corners and darkness sweeten, reachability is
/// mandatory and long approaches are discounted.
fn occlusion_score(nav: &dyn NavQuery, origin: Vec3, point: Vec3, threat: Vec3) -> f32 {
    let cover = score::cover_between(nav, point, threat) * 1.7;
    if cover <= 0.0 {
        return f32::NEG_INFINITY;
    }
    let Some(path_len) = score::complete_path_length(nav, origin, point) else {
        return f32::NEG_INFINITY;
    };
    let corner = WallProbe::default()
        .with_range(1.4)
        .with_base(0.5)
        .with_gain(0.2);
    cover
        + score::wall_closeness(nav, point, corner) * 0.6
        + score::ambient_darkness(nav, point, DarknessProbe::default()) * 0.5
        + clamp01(1.0 - inv_lerp(4.0, 32.0, path_len))
        - inv_lerp(4.0, 34.0, origin.distance(point))
}

/// Picks (or re-picks) a hiding spot and travels to it. Arrival keeps
/// the spot alive a little longer so the agent settles instead of
/// instantly re-planning.
pub fn seek_occlusion<W>(
    _ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    tuning: &SkitterTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let threat = board.skitter.threat_or_unset();

    if !board.skitter.has_occlusion() || board.skitter.occlusion_blocked() {
        let nav = world.nav();
        let query = CoverQuery::new(CoverConfig::default());
        let pick = query.find(nav, position, |nav, point| {
            occlusion_score(nav, position, point, threat)
        });
        match pick {
            Some(found) => board.skitter.assign_occlusion(found.point, tuning.occlusion_seconds),
            None => {
                board.skitter.flag_occlusion_blocked();
                return BtStatus::Failure;
            }
        }
    }

    let Some(spot) = board.skitter.occlusion_point() else {
        return BtStatus::Failure;
    };
    if position.distance(spot) <= 1.15 {
        board
            .skitter
            .reinforce_occlusion(spot, tuning.occlusion_seconds * 0.35);
        return BtStatus::Success;
    }
    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("skitter.hide", spot)
            .with_sample_radius(2.35)
            .with_budget(38.0)
            .with_profile(5.5, 11.0)
            .with_stop(0.35)
            .partial(),
    );
    if issued {
        BtStatus::Running
    } else {
        board.skitter.flag_occlusion_blocked();
        BtStatus::Failure
    }
}

/// Default drift: toward heard footsteps, else toward the last contact,
/// else wherever the nose points, with a sideways wobble. Louder quarry
/// pulls longer strides.
pub fn skulk<W>(
    ctx: &TickContext,
    agent: W::Agent,
    world: &mut W,
    board: &mut Blackboard,
    _tuning: &SkitterTuning,
) -> BtStatus
where
    W: BestiaryWorld,
{
    let Some(position) = world.position(agent) else {
        return BtStatus::Failure;
    };
    let mut rng = ctx.rng_for_agent(agent, streams::SKITTER_SKULK);
    let random_dir = {
        let yaw = rng.next_f32_unit() * std::f32::consts::TAU;
        Vec3::new(yaw.cos(), 0.0, yaw.sin())
    };
    let dir = board
        .skitter
        .footsteps()
        .or_else(|| {
            let threat = board.skitter.threat_or_unset();
            if threat.is_set() {
                Some((threat - position).flattened().normalized_or(random_dir))
            } else {
                None
            }
        })
        .or_else(|| world.facing(agent).map(|f| f.flattened().normalized_or(random_dir)))
        .unwrap_or(random_dir);

    let side = Vec3::new(-dir.z, 0.0, dir.x);
    let blend = (rng.next_f32_unit() * 2.0 - 1.0) * 0.55;
    let dir = (dir + side * blend).normalized_or(dir);

    let loudness = board.quarry.noise() + if board.quarry.visible() { 0.25 } else { 0.0 };
    let stride = lerp(4.0, 7.5, clamp01(loudness));
    let goal = position + dir * stride + gateway::agent_spread(ctx.seed, agent, 1.25);

    let issued = gateway::request(
        world,
        agent,
        MoveRequest::to("skitter.skulk", goal)
            .with_sample_radius(1.85)
            .with_budget(20.0)
            .with_profile(4.25, 8.5)
            .with_stop(0.35)
            .partial(),
    );
    if issued {
        BtStatus::Running
    } else {
        BtStatus::Failure
    }
}

/// PrioritySelector(cornered, intimidate, hide, skulk).
pub fn tree<W>(tuning: BestiaryTuning) -> Box<dyn BtNode<W, Blackboard>>
where
    W: BestiaryWorld + 'static,
{
    let t = tuning;
    Box::new(PrioritySelector::new(
        "skitter",
        vec![
            Box::new(Sequence::new(
                "skitter.corner_seq",
                vec![
                    cond("skitter.cornered", move |_, agent, world: &W, board: &Blackboard| {
                        is_cornered(world, agent, board, &t.skitter)
                    }),
                    act("skitter.burst", move |ctx, agent, world: &mut W, board: &mut Blackboard| {
                        cornered_burst(ctx, agent, world, board, &t.skitter)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "skitter.warn_seq",
                vec![
                    cond("skitter.stared_at", move |_, agent, world: &W, board: &Blackboard| {
                        should_intimidate(world, agent, board, &t.skitter)
                    }),
                    act("skitter.intimidate", move |ctx, agent, world, board| {
                        intimidate(ctx, agent, world, board, &t.skitter)
                    }),
                ],
            )),
            Box::new(Sequence::new(
                "skitter.hide_seq",
                vec![
                    cond("skitter.needs_occlusion", move |_, _, _: &W, board: &Blackboard| {
                        board.skitter.needs_occlusion()
                    }),
                    act("skitter.hide", move |ctx, agent, world, board| {
                        seek_occlusion(ctx, agent, world, board, &t.skitter)
                    }),
                ],
            )),
            act("skitter.skulk", move |ctx, agent, world, board| {
                skulk(ctx, agent, world, board, &t.skitter)
            }),
        ],
    ))
}

/// A fully wired skitter: contact-and-noise sense plus the flight tree.
pub fn creature<W>(agent: W::Agent, tuning: BestiaryTuning) -> Creature<W>
where
    W: BestiaryWorld + 'static,
{
    Creature::new(agent, tuning, sense::<W>, tree::<W>(tuning))
}
