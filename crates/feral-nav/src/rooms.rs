//! Deterministic reference environment: one rectangular room with
//! axis-aligned box obstacles, a flat floor, and a flat ceiling.
//!
//! Stands in for a real navmesh in tests and benches. Paths are straight
//! lines with at most one dogleg around the first blocking obstacle;
//! partial paths stop at the obstruction. Rays hit obstacles, the walls,
//! the floor, and the ceiling.

use crate::{LightSource, NavPath, NavQuery, PathClass, RayHit, Vec3};

const WALL_INSET: f32 = 0.25;
const DOGLEG_INFLATE: f32 = 0.5;
const STOP_SHORT: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        assert!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "degenerate box"
        );
        Self { min, max }
    }

    /// Obstacles that touch the floor slab block walking.
    fn blocks_floor(&self) -> bool {
        self.min.y < 1.0
    }

    fn contains_horizontal(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Slab test; returns the entry distance along `dir` within `max` and
    /// the face normal crossed on entry (zero when `origin` starts inside).
    fn ray_hit(&self, origin: Vec3, dir: Vec3, max: f32) -> Option<(f32, Vec3)> {
        let mut t_near = 0.0_f32;
        let mut t_far = max;
        let mut normal = Vec3::ZERO;
        let axes = [
            (origin.x, dir.x, self.min.x, self.max.x, Vec3::new(1.0, 0.0, 0.0)),
            (origin.y, dir.y, self.min.y, self.max.y, Vec3::UP),
            (origin.z, dir.z, self.min.z, self.max.z, Vec3::new(0.0, 0.0, 1.0)),
        ];
        for (o, d, lo, hi, axis) in axes {
            if d.abs() <= f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let mut t0 = (lo - o) / d;
            let mut t1 = (hi - o) / d;
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_near {
                t_near = t0;
                normal = axis * -d.signum();
            }
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }
        Some((t_near, normal))
    }

    /// Entry parameter of the 2D (x, z) segment `s -> e`, if it crosses.
    fn segment_hit(&self, s: Vec3, e: Vec3) -> Option<f32> {
        let d = e - s;
        let mut t_near = 0.0_f32;
        let mut t_far = 1.0_f32;
        let axes = [
            (s.x, d.x, self.min.x, self.max.x),
            (s.z, d.z, self.min.z, self.max.z),
        ];
        for (o, d, lo, hi) in axes {
            if d.abs() <= f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let mut t0 = (lo - o) / d;
            let mut t1 = (hi - o) / d;
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }
        Some(t_near)
    }
}

#[derive(Debug, Clone)]
pub struct RoomNav {
    min: Vec3,
    max: Vec3,
    ceiling: f32,
    obstacles: Vec<Aabb>,
    points: Vec<Vec3>,
    lights: Vec<LightSource>,
}

impl RoomNav {
    /// A `width` x `depth` room with the origin corner at (0, 0, 0).
    pub fn new(width: f32, depth: f32, ceiling: f32) -> Self {
        assert!(width > 0.0 && depth > 0.0, "room must be non-empty");
        assert!(ceiling > 0.0, "ceiling must be above the floor");
        Self {
            min: Vec3::ZERO,
            max: Vec3::new(width, 0.0, depth),
            ceiling,
            obstacles: Vec::new(),
            points: Vec::new(),
            lights: Vec::new(),
        }
    }

    pub fn with_obstacle(mut self, obstacle: Aabb) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    pub fn with_sample_points(mut self, points: Vec<Vec3>) -> Self {
        self.points = points;
        self
    }

    pub fn with_lights(mut self, lights: Vec<LightSource>) -> Self {
        self.lights = lights;
        self
    }

    pub fn ceiling_height(&self) -> f32 {
        self.ceiling
    }

    fn in_bounds(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }

    fn clamp_inside(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.min.x + WALL_INSET, self.max.x - WALL_INSET),
            0.0,
            p.z.clamp(self.min.z + WALL_INSET, self.max.z - WALL_INSET),
        )
    }

    fn blocked_at(&self, p: Vec3) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.blocks_floor() && o.contains_horizontal(p))
    }

    /// Earliest floor-level obstruction along `s -> e`, strictly inside
    /// the segment.
    fn first_obstruction(&self, s: Vec3, e: Vec3) -> Option<f32> {
        let mut best: Option<f32> = None;
        for o in self.obstacles.iter().filter(|o| o.blocks_floor()) {
            if let Some(t) = o.segment_hit(s, e) {
                if t > 1e-4 && best.map(|b| t < b).unwrap_or(true) {
                    best = Some(t);
                }
            }
        }
        best
    }

    fn segment_clear(&self, s: Vec3, e: Vec3) -> bool {
        self.first_obstruction(s, e).is_none()
    }
}

impl NavQuery for RoomNav {
    fn find_path(&self, start: Vec3, goal: Vec3) -> Option<NavPath> {
        let s = start.flattened();
        let mut clipped = false;
        let mut g = goal.flattened();
        if !self.in_bounds(g) {
            g = self.clamp_inside(g);
            clipped = true;
        }

        let done_class = if clipped {
            PathClass::Partial
        } else {
            PathClass::Complete
        };

        let Some(t) = self.first_obstruction(s, g) else {
            return Some(NavPath::new(done_class, vec![s, g]));
        };

        // One dogleg around the blocking box, corners tried in fixed order.
        let dir = g - s;
        let hit = s + dir * t;
        let block = self
            .obstacles
            .iter()
            .filter(|o| o.blocks_floor())
            .find(|o| o.contains_horizontal(hit + dir.normalized_or(Vec3::ZERO) * 0.05));
        if let Some(block) = block {
            let lo = Vec3::new(block.min.x - DOGLEG_INFLATE, 0.0, block.min.z - DOGLEG_INFLATE);
            let hi = Vec3::new(block.max.x + DOGLEG_INFLATE, 0.0, block.max.z + DOGLEG_INFLATE);
            let corners = [
                Vec3::new(lo.x, 0.0, lo.z),
                Vec3::new(hi.x, 0.0, lo.z),
                Vec3::new(hi.x, 0.0, hi.z),
                Vec3::new(lo.x, 0.0, hi.z),
            ];
            for c in corners {
                if self.in_bounds(c)
                    && !self.blocked_at(c)
                    && self.segment_clear(s, c)
                    && self.segment_clear(c, g)
                {
                    return Some(NavPath::new(done_class, vec![s, c, g]));
                }
            }
        }

        // No way around: stop short of the obstruction.
        let len = dir.length();
        let stop_at = (t * len - STOP_SHORT).max(0.0);
        if stop_at <= f32::EPSILON {
            return None;
        }
        let stop = s + dir.normalized_or(Vec3::ZERO) * stop_at;
        Some(NavPath::new(PathClass::Partial, vec![s, stop]))
    }

    fn sample_navigable(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        if !point.is_set() {
            return None;
        }
        let flat = point.flattened();
        let mut candidate = self.clamp_inside(flat);
        if self.blocked_at(candidate) {
            // Push out of the blocking box to its nearest inflated edge.
            let block = self
                .obstacles
                .iter()
                .find(|o| o.blocks_floor() && o.contains_horizontal(candidate))?;
            let left = candidate.x - block.min.x;
            let right = block.max.x - candidate.x;
            let near = candidate.z - block.min.z;
            let far = block.max.z - candidate.z;
            let m = left.min(right).min(near).min(far);
            candidate = if m == left {
                candidate + Vec3::new(-(left + STOP_SHORT), 0.0, 0.0)
            } else if m == right {
                candidate + Vec3::new(right + STOP_SHORT, 0.0, 0.0)
            } else if m == near {
                candidate + Vec3::new(0.0, 0.0, -(near + STOP_SHORT))
            } else {
                candidate + Vec3::new(0.0, 0.0, far + STOP_SHORT)
            };
            candidate = self.clamp_inside(candidate);
            if self.blocked_at(candidate) {
                return None;
            }
        }
        if flat.horizontal_distance(candidate) > radius {
            return None;
        }
        Some(candidate)
    }

    fn cast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        let mut best: Option<(f32, Vec3)> = None;
        let mut consider = |t: f32, normal: Vec3| {
            if t > 1e-4 && t <= max_distance && best.map(|(b, _)| t < b).unwrap_or(true) {
                best = Some((t, normal));
            }
        };

        for o in &self.obstacles {
            if let Some((t, normal)) = o.ray_hit(origin, dir, max_distance) {
                let normal = if normal == Vec3::ZERO { -dir } else { normal };
                consider(t.max(1e-3), normal);
            }
        }

        // Room shell: floor, ceiling, and the four walls.
        if dir.y < -f32::EPSILON {
            consider((0.0 - origin.y) / dir.y, Vec3::UP);
        }
        if dir.y > f32::EPSILON {
            consider((self.ceiling - origin.y) / dir.y, Vec3::DOWN);
        }
        if dir.x < -f32::EPSILON {
            consider((self.min.x - origin.x) / dir.x, Vec3::new(1.0, 0.0, 0.0));
        }
        if dir.x > f32::EPSILON {
            consider((self.max.x - origin.x) / dir.x, Vec3::new(-1.0, 0.0, 0.0));
        }
        if dir.z < -f32::EPSILON {
            consider((self.min.z - origin.z) / dir.z, Vec3::new(0.0, 0.0, 1.0));
        }
        if dir.z > f32::EPSILON {
            consider((self.max.z - origin.z) / dir.z, Vec3::new(0.0, 0.0, -1.0));
        }

        best.map(|(t, normal)| RayHit {
            point: origin + dir * t,
            distance: t,
            normal,
        })
    }

    fn sample_points(&self) -> &[Vec3] {
        &self.points
    }

    fn lights(&self) -> &[LightSource] {
        &self.lights
    }
}
