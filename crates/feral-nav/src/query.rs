//! Host geometry query seam.
//!
//! Hosts answer these from whatever they have (navmesh, voxel grid,
//! physics scene). Everything the planners and the gateway know about the
//! environment flows through this trait, so a deterministic fake is
//! enough to test every consumer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Vec3;

/// Whether a path reaches its goal or stops short at an obstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathClass {
    Complete,
    Partial,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavPath {
    pub class: PathClass,
    /// Straightened waypoint list; `corners[0]` is the start.
    pub corners: Vec<Vec3>,
}

impl NavPath {
    pub fn new(class: PathClass, corners: Vec<Vec3>) -> Self {
        Self { class, corners }
    }

    pub fn is_complete(&self) -> bool {
        self.class == PathClass::Complete
    }

    /// Polyline length over all corners.
    pub fn length(&self) -> f32 {
        self.corners
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    pub fn end(&self) -> Option<Vec3> {
        self.corners.last().copied()
    }

    /// Walks `budget` units along the polyline starting from the point on
    /// it nearest to `from`. Used by reference hosts to integrate motion;
    /// production hosts have their own steering.
    pub fn advance_from(&self, from: Vec3, budget: f32) -> Vec3 {
        if self.corners.len() < 2 || budget <= 0.0 {
            return self.corners.last().copied().unwrap_or(from);
        }

        // Nearest segment, earliest on ties, so re-entry is deterministic.
        let mut best = (0usize, self.corners[0], f32::INFINITY);
        for (i, w) in self.corners.windows(2).enumerate() {
            let p = closest_point_on_segment(from, w[0], w[1]);
            let d = from.distance(p);
            if d < best.2 {
                best = (i, p, d);
            }
        }

        let (mut seg, mut current, _) = best;
        let mut remaining = budget;
        while seg + 1 < self.corners.len() && remaining > 0.0 {
            let target = self.corners[seg + 1];
            let to_target = target - current;
            let dist = to_target.length();
            if dist <= f32::EPSILON {
                seg += 1;
                continue;
            }
            if remaining >= dist {
                current = target;
                seg += 1;
                remaining -= dist;
                continue;
            }
            current = current + to_target * (remaining / dist);
            break;
        }
        current
    }
}

fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    /// Unit surface normal at the hit, facing back along the ray.
    pub normal: Vec3,
}

/// Static light for ambient darkness scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LightSource {
    pub position: Vec3,
    pub range: f32,
    pub intensity: f32,
}

pub trait NavQuery {
    /// Shortest path from `start` to `goal`.
    ///
    /// `None` when no progress toward the goal is possible at all; a
    /// `Partial` path stops at the furthest reachable point toward it.
    fn find_path(&self, start: Vec3, goal: Vec3) -> Option<NavPath>;

    /// Projects `point` onto navigable space, searching within `radius`.
    fn sample_navigable(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let _ = (point, radius);
        None
    }

    /// First blocking hit along `dir` (unit length) within `max_distance`.
    ///
    /// `None` means nothing blocks within range, which consumers treat as
    /// open space.
    fn cast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        let _ = (origin, dir, max_distance);
        None
    }

    /// Bounded, stably ordered navigable sample points for candidate
    /// surveys.
    fn sample_points(&self) -> &[Vec3] {
        &[]
    }

    /// Ambient lights, for darkness scoring.
    fn lights(&self) -> &[LightSource] {
        &[]
    }
}
