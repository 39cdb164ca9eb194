//! Shared quarry perception folded into every agent's memory.
//!
//! The track is what the agent is allowed to remember about its hunted
//! target: a timed last-known position, the last seen facing and
//! velocity, and per-subject sighting records for archetypes that hold
//! grudges. Ground-truth samples come in through the sense step each
//! tick; everything here decays or is purged rather than trusted
//! forever.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use feral_nav::{TimedPoint, Vec3};

use crate::world::QuarrySample;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryTuning {
    /// Seconds a sighting stays live without reconfirmation.
    #[serde(default = "default_memory_seconds")]
    pub memory_seconds: f32,
    /// Angular rate (radians per second) above which the quarry counts
    /// as turning away.
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f32,
    /// Facing dot threshold for "the quarry is watching me".
    #[serde(default = "default_watch_dot")]
    pub watch_dot: f32,
}

fn default_memory_seconds() -> f32 {
    14.0
}

fn default_turn_rate() -> f32 {
    1.6
}

fn default_watch_dot() -> f32 {
    0.65
}

impl Default for QuarryTuning {
    fn default() -> Self {
        Self {
            memory_seconds: default_memory_seconds(),
            turn_rate: default_turn_rate(),
            watch_dot: default_watch_dot(),
        }
    }
}

/// One remembered subject: where it was last confirmed and how long the
/// record stays valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub position: Vec3,
    pub remaining: f32,
}

/// Decaying view of the hunted target.
#[derive(Debug, Clone)]
pub struct QuarryTrack {
    last_known: TimedPoint,
    facing: Vec3,
    velocity: Vec3,
    noise: f32,
    distance: f32,
    visible: bool,
    was_visible: bool,
    isolated: bool,
    turning: bool,
    watched: bool,
    subject: u64,
    sightings: BTreeMap<u64, Sighting>,
}

impl QuarryTrack {
    pub fn new() -> Self {
        Self {
            last_known: TimedPoint::unset(),
            facing: Vec3::UNSET,
            velocity: Vec3::ZERO,
            noise: 0.0,
            distance: f32::INFINITY,
            visible: false,
            was_visible: false,
            isolated: false,
            turning: false,
            watched: false,
            subject: 0,
            sightings: BTreeMap::new(),
        }
    }

    /// Decays the track and every sighting record. Runs before the
    /// sense fold, so a tick with no reconfirmation ends with whatever
    /// survived decay.
    pub fn advance(&mut self, dt: f32) {
        self.last_known.advance(dt);
        if !self.last_known.is_live() {
            self.facing = Vec3::UNSET;
            self.velocity = Vec3::ZERO;
            self.noise = 0.0;
            self.distance = f32::INFINITY;
            self.turning = false;
            self.watched = false;
        }
        if dt > 0.0 {
            self.sightings.retain(|_, sighting| {
                sighting.remaining -= dt;
                sighting.remaining > 0.0
            });
        }
    }

    /// Folds the host's sample for this tick. Only a visible sample
    /// refreshes the track; an invisible or absent quarry leaves the
    /// last-known fact to decay on its own.
    pub fn observe(&mut self, agent_pos: Vec3, sample: Option<&QuarrySample>, dt: f32, tuning: &QuarryTuning) {
        let was = self.visible;
        match sample {
            Some(s) if s.visible => {
                self.turning = if was && self.facing.is_set() && dt > 0.0 {
                    let swing = self.facing.dot(s.facing).clamp(-1.0, 1.0).acos();
                    swing / dt > tuning.turn_rate
                } else {
                    false
                };
                self.last_known.place(s.position, tuning.memory_seconds);
                self.facing = s.facing;
                self.velocity = s.velocity;
                self.noise = s.noise;
                self.isolated = s.isolated;
                self.subject = s.subject;
                self.visible = true;
                self.distance = agent_pos.distance(s.position);
                let toward_agent = (agent_pos - s.position).normalized_or(Vec3::ZERO);
                self.watched = s.facing.dot(toward_agent) > tuning.watch_dot;
            }
            _ => {
                self.visible = false;
                self.turning = false;
                self.watched = false;
                self.distance = match self.last_known.get() {
                    Some(p) => agent_pos.distance(p),
                    None => f32::INFINITY,
                };
            }
        }
        self.was_visible = was;
    }

    pub fn has_track(&self) -> bool {
        self.last_known.is_live()
    }

    pub fn last_known(&self) -> Option<Vec3> {
        self.last_known.get()
    }

    /// Last-known position, or the sentinel when the track is dead.
    /// Safe to hand straight to the movement gateway.
    pub fn position_or_unset(&self) -> Vec3 {
        self.last_known.get().unwrap_or(Vec3::UNSET)
    }

    /// Last seen unit forward vector. Sentinel when the track is dead.
    pub fn facing(&self) -> Vec3 {
        self.facing
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Quarry loudness from the last visible sample, 0..1.
    pub fn noise(&self) -> f32 {
        self.noise
    }

    /// Distance from the agent to the freshest position fact, infinity
    /// when there is none. Fails closed in comparisons.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// True on the tick visibility was lost while the track is live.
    pub fn lost_sight(&self) -> bool {
        self.was_visible && !self.visible && self.has_track()
    }

    pub fn isolated(&self) -> bool {
        self.isolated
    }

    /// Quarry was swinging its view faster than the tuning threshold on
    /// the last visible tick.
    pub fn turning(&self) -> bool {
        self.turning
    }

    pub fn subject(&self) -> u64 {
        self.subject
    }

    /// Whether the visible quarry had the agent inside its watch cone
    /// on the last sample.
    pub fn watched(&self) -> bool {
        self.watched
    }

    /// Confirms a subject at `position`. Overwrites the stored position
    /// and restarts the record's window; reconfirmation never shortens
    /// a longer-lived record elsewhere because each subject has one.
    pub fn record_sighting(&mut self, subject: u64, position: Vec3, seconds: f32) {
        self.sightings.insert(
            subject,
            Sighting {
                position,
                remaining: seconds.max(0.0),
            },
        );
    }

    /// Drops records whose subject the host can no longer track.
    pub fn purge_untrackable(&mut self, keep: impl Fn(u64) -> bool) {
        self.sightings.retain(|subject, _| keep(*subject));
    }

    /// The sighting worth committing to: minimizes distance minus
    /// remaining life, so a close stale record loses to a farther fresh
    /// one. Ties go to the lowest subject id.
    pub fn persistent_target(&self, origin: Vec3) -> Option<Vec3> {
        let mut best = None;
        let mut best_rank = f32::INFINITY;
        for sighting in self.sightings.values() {
            let rank = origin.distance(sighting.position) - sighting.remaining;
            if rank < best_rank {
                best_rank = rank;
                best = Some(sighting.position);
            }
        }
        best
    }

    pub fn sightings(&self) -> &BTreeMap<u64, Sighting> {
        &self.sightings
    }
}

impl Default for QuarryTrack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seen_at(position: Vec3) -> QuarrySample {
        QuarrySample {
            subject: 1,
            position,
            facing: Vec3::new(0.0, 0.0, 1.0),
            velocity: Vec3::ZERO,
            noise: 0.0,
            visible: true,
            isolated: false,
        }
    }

    #[test]
    fn track_decays_to_sentinel() {
        let tuning = QuarryTuning::default();
        let mut track = QuarryTrack::new();
        track.observe(Vec3::ZERO, Some(&seen_at(Vec3::new(3.0, 0.0, 0.0))), 0.1, &tuning);
        assert!(track.has_track());
        assert_eq!(track.distance(), 3.0);

        for _ in 0..141 {
            track.advance(0.1);
        }
        assert!(!track.has_track());
        assert!(!track.position_or_unset().is_set());
        assert_eq!(track.distance(), f32::INFINITY);
    }

    #[test]
    fn losing_sight_keeps_last_known_only() {
        let tuning = QuarryTuning::default();
        let mut track = QuarryTrack::new();
        let spot = Vec3::new(4.0, 0.0, 0.0);
        track.observe(Vec3::ZERO, Some(&seen_at(spot)), 0.1, &tuning);
        track.advance(0.1);
        track.observe(Vec3::ZERO, None, 0.1, &tuning);

        assert!(!track.visible());
        assert!(track.lost_sight());
        assert_eq!(track.last_known(), Some(spot));

        track.advance(0.1);
        track.observe(Vec3::ZERO, None, 0.1, &tuning);
        assert!(!track.lost_sight());
    }

    #[test]
    fn turning_needs_consecutive_visible_ticks() {
        let tuning = QuarryTuning::default();
        let mut track = QuarryTrack::new();
        let mut swung = seen_at(Vec3::new(2.0, 0.0, 0.0));
        track.observe(Vec3::ZERO, Some(&swung), 0.1, &tuning);
        assert!(!track.turning());

        swung.facing = Vec3::new(1.0, 0.0, 0.0);
        track.observe(Vec3::ZERO, Some(&swung), 0.1, &tuning);
        assert!(track.turning());

        // Same facing again: angular rate back under threshold.
        track.observe(Vec3::ZERO, Some(&swung), 0.1, &tuning);
        assert!(!track.turning());
    }

    #[test]
    fn sightings_expire_and_purge() {
        let mut track = QuarryTrack::new();
        track.record_sighting(7, Vec3::new(1.0, 0.0, 0.0), 14.0);
        track.record_sighting(9, Vec3::new(9.0, 0.0, 0.0), 2.0);

        for _ in 0..140 {
            track.advance(0.1);
        }
        assert!(track.sightings().is_empty());

        track.record_sighting(7, Vec3::new(1.0, 0.0, 0.0), 14.0);
        track.purge_untrackable(|subject| subject != 7);
        assert!(track.sightings().is_empty());
    }

    #[test]
    fn persistent_target_trades_distance_against_freshness() {
        let mut track = QuarryTrack::new();
        // Close but nearly expired.
        track.record_sighting(1, Vec3::new(2.0, 0.0, 0.0), 1.0);
        // Farther but fresh: rank 6 - 14 beats 2 - 1.
        track.record_sighting(2, Vec3::new(6.0, 0.0, 0.0), 14.0);

        assert_eq!(track.persistent_target(Vec3::ZERO), Some(Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn watch_cone_uses_quarry_facing() {
        let tuning = QuarryTuning::default();
        let mut track = QuarryTrack::new();
        let mut sample = seen_at(Vec3::new(0.0, 0.0, 5.0));
        sample.facing = Vec3::new(0.0, 0.0, -1.0);
        track.observe(Vec3::ZERO, Some(&sample), 0.1, &tuning);
        assert!(track.watched());

        sample.facing = Vec3::new(1.0, 0.0, 0.0);
        track.observe(Vec3::ZERO, Some(&sample), 0.1, &tuning);
        assert!(!track.watched());

        track.observe(Vec3::ZERO, None, 0.1, &tuning);
        assert!(!track.watched());
    }
}
