//! Countdown and accumulator clocks.
//!
//! All agent memory with a lifetime is built from these two primitives.
//! Timeouts, cooldowns, and fact lifetimes are [`DecayTimer`]s; graded
//! pressure that rises toward a threshold (stare, anger) is a [`Meter`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Countdown clock clamped at zero.
///
/// `advance` never takes the remaining time below zero, and derived
/// predicates (`is_active`) are always computed from the remaining time so
/// they cannot desync from it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecayTimer {
    remaining: f32,
}

impl DecayTimer {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// A timer that is already spent.
    pub fn spent() -> Self {
        Self { remaining: 0.0 }
    }

    /// Counts down by `dt`, clamped at zero. Negative `dt` is ignored.
    pub fn advance(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// Overwrites the remaining time.
    pub fn set(&mut self, seconds: f32) {
        self.remaining = seconds.max(0.0);
    }

    /// Extends the remaining time to at least `seconds`; never shortens.
    ///
    /// The extend-only contract lets several call sites refresh the same
    /// fact without racing each other down.
    pub fn set_at_least(&mut self, seconds: f32) {
        self.remaining = self.remaining.max(seconds.max(0.0));
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Remaining time as a fraction of `full`, clamped to `[0, 1]`.
    pub fn ratio_of(&self, full: f32) -> f32 {
        if full <= 0.0 {
            return 0.0;
        }
        (self.remaining / full).clamp(0.0, 1.0)
    }
}

/// Accumulator clamped to `[0, max]`.
///
/// Rises under sustained stimulus, cools when the stimulus lapses. `max`
/// is fixed at construction; readiness means the meter sits at `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Meter {
    value: f32,
    max: f32,
}

impl Meter {
    pub fn new(max: f32) -> Self {
        Self {
            value: 0.0,
            max: max.max(0.0),
        }
    }

    pub fn rise(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.value = (self.value + amount).min(self.max);
    }

    pub fn cool(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.value = (self.value - amount).max(0.0);
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn ratio(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.value / self.max
    }

    pub fn is_full(&self) -> bool {
        self.value >= self.max && self.max > 0.0
    }

    /// True once the meter has reached `threshold`.
    pub fn reached(&self, threshold: f32) -> bool {
        self.value >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_drains_to_exactly_zero() {
        let mut t = DecayTimer::new(1.0);
        for _ in 0..7 {
            t.advance(0.25);
        }
        assert_eq!(t.remaining(), 0.0);
        assert!(!t.is_active());
    }

    #[test]
    fn timer_extend_never_shortens() {
        let mut t = DecayTimer::new(5.0);
        t.set_at_least(2.0);
        assert_eq!(t.remaining(), 5.0);
        t.set_at_least(8.0);
        assert_eq!(t.remaining(), 8.0);
    }

    #[test]
    fn timer_ignores_negative_dt() {
        let mut t = DecayTimer::new(1.0);
        t.advance(-3.0);
        assert_eq!(t.remaining(), 1.0);
    }

    #[test]
    fn meter_saturates_both_ends() {
        let mut m = Meter::new(2.0);
        m.rise(5.0);
        assert!(m.is_full());
        assert_eq!(m.value(), 2.0);
        m.cool(10.0);
        assert_eq!(m.value(), 0.0);
        assert!(!m.is_full());
    }

    #[test]
    fn meter_ratio_tracks_value() {
        let mut m = Meter::new(4.0);
        m.rise(1.0);
        assert!((m.ratio() - 0.25).abs() < 1e-6);
        assert!(m.reached(1.0));
        assert!(!m.reached(1.01));
    }
}
