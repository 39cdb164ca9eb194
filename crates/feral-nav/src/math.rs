//! Minimal 3D vector math and the unset-position sentinel.
//!
//! Positions that may be absent are plain `Vec3`s carrying [`Vec3::UNSET`]
//! (every component positive infinity) instead of an `Option`, so distance
//! math against an absent fact fails closed: any comparison against the
//! resulting infinite distance rejects. Readers test `is_set` before using
//! a value in arithmetic; mutators that clear a fact must write `UNSET`.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use feral_core::DecayTimer;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const DOWN: Self = Self::new(0.0, -1.0, 0.0);

    /// Reserved "no position" value.
    pub const UNSET: Self = Self::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// False for the sentinel (and for any non-finite component).
    pub fn is_set(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Distance ignoring the vertical axis.
    pub fn horizontal_distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Unit vector, or `fallback` when the length is degenerate.
    pub fn normalized_or(self, fallback: Self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON || !len.is_finite() {
            return fallback;
        }
        self / len
    }

    /// Copy with the vertical component zeroed.
    pub fn flattened(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    pub fn with_y(self, y: f32) -> Self {
        Self::new(self.x, y, self.z)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = clamp01(t);
        self + (other - self) * t
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Interpolation with `t` clamped to `[0, 1]`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * clamp01(t)
}

/// Where `v` sits between `a` and `b`, clamped to `[0, 1]`.
pub fn inv_lerp(a: f32, b: f32, v: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    clamp01((v - a) / (b - a))
}

pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Position fact valid only while its paired timer is positive.
///
/// The raw point may be stale-but-finite after expiry; `get` checks the
/// timer, never just the point, and `advance` resets the point to the
/// sentinel the moment the timer lapses.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimedPoint {
    point: Vec3,
    timer: DecayTimer,
}

impl Default for TimedPoint {
    fn default() -> Self {
        Self {
            point: Vec3::UNSET,
            timer: DecayTimer::spent(),
        }
    }
}

impl TimedPoint {
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f32) {
        self.timer.advance(dt);
        if !self.timer.is_active() {
            self.point = Vec3::UNSET;
        }
    }

    /// Overwrites both the point and the remaining time.
    pub fn place(&mut self, point: Vec3, seconds: f32) {
        self.point = point;
        self.timer.set(seconds);
    }

    /// Overwrites the point; extends the timer, never shortens it.
    pub fn reinforce(&mut self, point: Vec3, seconds: f32) {
        self.point = point;
        self.timer.set_at_least(seconds);
    }

    pub fn clear(&mut self) {
        self.point = Vec3::UNSET;
        self.timer.clear();
    }

    pub fn get(&self) -> Option<Vec3> {
        if self.timer.is_active() && self.point.is_set() {
            Some(self.point)
        } else {
            None
        }
    }

    pub fn is_live(&self) -> bool {
        self.get().is_some()
    }

    pub fn remaining(&self) -> f32 {
        self.timer.remaining()
    }
}
