//! Geometric probe heuristics for candidate scoring.
//!
//! Every function reads the environment through [`NavQuery`] raycasts
//! from a point lifted slightly off the floor, and returns a bounded
//! additive term. Archetypes weight and sum these into their own spot
//! scores; nothing here knows what the score is for.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use core::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_6, TAU};

use feral_nav::{clamp01, lerp, NavQuery, Vec3};

const CARDINALS: [Vec3; 4] = [
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
];

/// Four horizontal axes at 45-degree spacing; each is probed both ways.
const CHOKE_AXES: [Vec3; 4] = [
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
    Vec3::new(-FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
];

/// Down-slanted probe directions fanned out from a ceiling hang point.
const DOWN_SLANTS: [Vec3; 4] = [
    Vec3::new(0.0, -FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec3::new(0.0, -FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    Vec3::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0),
    Vec3::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0),
];

const CEILING_SCAN_RANGE: f32 = 10.0;
const MIN_CEILING_CLEARANCE: f32 = 1.75;
const HANG_DROP: f32 = 0.6;
const HANG_PROBE_RANGE: f32 = 8.0;
const FACING_SCAN_RANGE: f32 = 10.0;

/// Short-range wall probes along the four cardinal axes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WallProbe {
    /// Probe origin height above the anchor.
    pub lift: f32,
    pub range: f32,
    /// Flat contribution per blocked axis.
    pub base: f32,
    /// Additional contribution scaled by closeness to the wall.
    pub closeness_gain: f32,
    pub cap: f32,
}

impl Default for WallProbe {
    fn default() -> Self {
        Self {
            lift: 0.45,
            range: 2.25,
            base: 0.0,
            closeness_gain: 0.6,
            cap: 2.0,
        }
    }
}

impl WallProbe {
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    pub fn with_base(mut self, base: f32) -> Self {
        self.base = base;
        self
    }

    pub fn with_gain(mut self, closeness_gain: f32) -> Self {
        self.closeness_gain = closeness_gain;
        self
    }

    pub fn with_lift(mut self, lift: f32) -> Self {
        self.lift = lift;
        self
    }
}

/// How tightly walls hug `anchor`, summed over the cardinal axes and
/// clamped to the probe cap. Corridors and corners score high, open
/// floor scores zero.
pub fn wall_closeness(nav: &dyn NavQuery, anchor: Vec3, probe: WallProbe) -> f32 {
    let origin = anchor + Vec3::UP * probe.lift;
    let mut score = 0.0;
    for dir in CARDINALS {
        if let Some(hit) = nav.cast(origin, dir, probe.range) {
            let closeness = 1.0 - clamp01(hit.distance / probe.range);
            score += probe.base + closeness * probe.closeness_gain;
        }
    }
    score.clamp(0.0, probe.cap)
}

/// Paired probes that rate how pinched the passage through `anchor` is.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChokeProbe {
    pub lift: f32,
    pub range: f32,
    pub cap: f32,
}

impl Default for ChokeProbe {
    fn default() -> Self {
        Self {
            lift: 0.45,
            range: 2.4,
            cap: 4.0,
        }
    }
}

/// Corridor pinch rating over [`CHOKE_AXES`], each axis probed both
/// ways. Two facing walls score by how narrow the gap between them is;
/// a lone wall contributes a weaker closeness term.
pub fn choke_rating(nav: &dyn NavQuery, anchor: Vec3, probe: ChokeProbe) -> f32 {
    let origin = anchor + Vec3::UP * probe.lift;
    let mut score = 0.0;
    for axis in CHOKE_AXES {
        let forward = nav.cast(origin, axis, probe.range);
        let backward = nav.cast(origin, -axis, probe.range);
        match (forward, backward) {
            (Some(near), Some(far)) => {
                let width = near.distance + far.distance;
                score += clamp01(1.25 - width * 0.35);
            }
            (Some(hit), None) | (None, Some(hit)) => {
                score += clamp01(0.6 - hit.distance * 0.2);
            }
            (None, None) => {}
        }
    }
    score.clamp(0.0, probe.cap)
}

/// Evenly spaced horizontal ray ring rating nearby cover.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RingProbe {
    pub lift: f32,
    pub directions: u32,
    pub range: f32,
    pub closeness_gain: f32,
    pub cap: f32,
}

impl Default for RingProbe {
    fn default() -> Self {
        Self {
            lift: 0.35,
            directions: 8,
            range: 3.2,
            closeness_gain: 0.5,
            cap: 2.0,
        }
    }
}

/// Cover summed over a full ray ring around `anchor`; each blocked ray
/// contributes by closeness.
pub fn ring_cover(nav: &dyn NavQuery, anchor: Vec3, probe: RingProbe) -> f32 {
    if probe.directions == 0 {
        return 0.0;
    }
    let origin = anchor + Vec3::UP * probe.lift;
    let step = TAU / probe.directions as f32;
    let mut cover = 0.0;
    for i in 0..probe.directions {
        let yaw = step * i as f32;
        let dir = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        if let Some(hit) = nav.cast(origin, dir, probe.range) {
            cover += (1.0 - clamp01(hit.distance / probe.range)) * probe.closeness_gain;
        }
    }
    cover.clamp(0.0, probe.cap)
}

/// Hang point under the first ceiling above `anchor`, with its clearance.
///
/// `None` when nothing overhangs within scan range or the headroom is
/// too low to tuck under.
pub fn ceiling_hang(nav: &dyn NavQuery, anchor: Vec3) -> Option<(Vec3, f32)> {
    let origin = anchor + Vec3::UP * 0.5;
    let hit = nav.cast(origin, Vec3::UP, CEILING_SCAN_RANGE)?;
    if hit.distance < MIN_CEILING_CLEARANCE {
        return None;
    }
    Some((hit.point + Vec3::DOWN * HANG_DROP, hit.distance))
}

/// How tucked-away a ceiling hang point is.
///
/// Averages four down-slanted probe reaches; cramped hangs score toward
/// 2, hangs over open galleries toward 0.
pub fn hang_seclusion(nav: &dyn NavQuery, hang: Vec3) -> f32 {
    let mut total = 0.0;
    for dir in DOWN_SLANTS {
        total += nav
            .cast(hang, dir, HANG_PROBE_RANGE)
            .map(|hit| hit.distance)
            .unwrap_or(HANG_PROBE_RANGE);
    }
    let avg = total / DOWN_SLANTS.len() as f32;
    clamp01((6.0 - avg) / 6.0) * 2.0
}

/// Light filtering and score endpoints for [`ambient_darkness`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DarknessProbe {
    /// Lights dimmer than this are ignored outright.
    pub min_intensity: f32,
    /// Floor applied to a light's falloff range before normalizing.
    pub min_range: f32,
    /// Score when fully lit.
    pub lit_floor: f32,
    /// Score in total darkness.
    pub dark_ceiling: f32,
}

impl Default for DarknessProbe {
    fn default() -> Self {
        Self {
            min_intensity: 0.05,
            min_range: 3.0,
            lit_floor: 0.25,
            dark_ceiling: 0.75,
        }
    }
}

/// Ambient darkness at `point`; strictly higher the darker it is.
///
/// Exposure is the strongest intensity-weighted distance falloff over
/// the host's lights; the score lerps from `dark_ceiling` down to
/// `lit_floor` as exposure saturates.
pub fn ambient_darkness(nav: &dyn NavQuery, point: Vec3, probe: DarknessProbe) -> f32 {
    let mut exposure = 0.0_f32;
    for light in nav.lights() {
        if light.intensity <= probe.min_intensity {
            continue;
        }
        let range = light.range.max(probe.min_range);
        let distance = point.distance(light.position);
        if distance > range {
            continue;
        }
        let falloff = 1.0 - clamp01(distance / range);
        exposure = exposure.max(falloff * light.intensity);
    }
    lerp(probe.lit_floor, probe.dark_ceiling, 1.0 - clamp01(exposure))
}

/// Line-of-sight cover from `point` toward a remembered `threat`.
///
/// Blocked sightlines score best, with a bonus for steep blockers
/// (walls over ramps); a clean sightline scores worst. An unset threat
/// lands in between so cover seeking still ranks interior spots.
pub fn cover_between(nav: &dyn NavQuery, point: Vec3, threat: Vec3) -> f32 {
    if !threat.is_set() {
        return 0.45;
    }
    let origin = point + Vec3::UP * 0.4;
    let target = threat + Vec3::UP * 0.8;
    let to_target = target - origin;
    let length = to_target.length();
    if length < 0.25 {
        return 0.2;
    }
    match nav.cast(origin, to_target / length, length) {
        Some(hit) => {
            let steepness = 1.0 - hit.normal.dot(Vec3::UP).abs();
            1.25 + steepness
        }
        None => 0.1,
    }
}

/// Length of a complete route, or `None` when the goal cannot be fully
/// reached.
pub fn complete_path_length(nav: &dyn NavQuery, from: Vec3, to: Vec3) -> Option<f32> {
    let path = nav.find_path(from, to)?;
    if !path.is_complete() || path.corners.len() < 2 {
        return None;
    }
    Some(path.length())
}

/// Look-at point down the longest open sightline around `anchor`.
///
/// Sweeps twelve rays at 30-degree spacing and projects at least three
/// units along the most open one, so an agent parked at `anchor` watches
/// the approach rather than a wall.
pub fn open_facing(nav: &dyn NavQuery, anchor: Vec3) -> Vec3 {
    let origin = anchor + Vec3::UP * 0.35;
    let mut best_dir = Vec3::new(0.0, 0.0, 1.0);
    let mut best_reach = 0.5;
    for i in 0..12 {
        let yaw = FRAC_PI_6 * i as f32;
        let dir = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        let reach = nav
            .cast(origin, dir, FACING_SCAN_RANGE)
            .map(|hit| hit.distance)
            .unwrap_or(FACING_SCAN_RANGE);
        if reach > best_reach {
            best_reach = reach;
            best_dir = dir;
        }
    }
    anchor + best_dir * (best_reach * 0.6).max(3.0)
}
