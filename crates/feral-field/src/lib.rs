//! Shared noise field: a process-wide spatial heat accumulator with decay.
//!
//! Noise-emitting hosts call [`NoiseField::register_burst`]; listening
//! agents query by distance, never by emitter identity. The field models
//! the environment, not any one listener, so one instance serves every
//! agent in the scene.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

use feral_core::DecayTimer;
use feral_nav::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseConfig {
    /// Seconds a fresh burst takes to decay to nothing.
    pub max_life: f32,
    /// Bursts landing within this distance of a live record accumulate
    /// into it instead of spawning a new one.
    pub merge_radius: f32,
    /// Accumulation ceiling per record, so spam sources saturate instead
    /// of growing without bound.
    pub magnitude_cap: f32,
    /// Record count bound; the weakest record is evicted past it.
    pub max_records: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            max_life: 12.0,
            merge_radius: 1.5,
            magnitude_cap: 16.0,
            max_records: 128,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Burst {
    position: Vec3,
    magnitude: f32,
    life: DecayTimer,
}

/// One burst as seen by a query: where, and how loud right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hotspot {
    pub position: Vec3,
    pub magnitude: f32,
}

#[derive(Debug, Clone)]
pub struct NoiseField {
    config: NoiseConfig,
    bursts: Vec<Burst>,
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new(NoiseConfig::default())
    }
}

impl NoiseField {
    pub fn new(config: NoiseConfig) -> Self {
        Self {
            config,
            bursts: Vec::new(),
        }
    }

    pub fn config(&self) -> NoiseConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.bursts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    /// Effective loudness of a record: full at birth, zero at expiry.
    fn effective(&self, burst: &Burst) -> f32 {
        burst.magnitude * burst.life.ratio_of(self.config.max_life)
    }

    /// Appends or accumulates a decaying heat record.
    ///
    /// Reinforcing an existing record refreshes its life to the maximum;
    /// it never shortens what remains.
    pub fn register_burst(&mut self, position: Vec3, magnitude: f32) {
        if !position.is_set() || magnitude <= 0.0 {
            return;
        }

        for burst in &mut self.bursts {
            if burst.position.distance(position) <= self.config.merge_radius {
                burst.magnitude = (burst.magnitude + magnitude).min(self.config.magnitude_cap);
                burst.life.set_at_least(self.config.max_life);
                return;
            }
        }

        self.bursts.push(Burst {
            position,
            magnitude: magnitude.min(self.config.magnitude_cap),
            life: DecayTimer::new(self.config.max_life),
        });

        if self.bursts.len() > self.config.max_records {
            self.evict_weakest();
        }
    }

    fn evict_weakest(&mut self) {
        let mut weakest = 0usize;
        let mut weakest_heat = f32::INFINITY;
        for (i, burst) in self.bursts.iter().enumerate() {
            let heat = self.effective(burst);
            if heat < weakest_heat {
                weakest = i;
                weakest_heat = heat;
            }
        }
        self.bursts.remove(weakest);
    }

    /// Decays every record and drops the spent ones.
    pub fn advance(&mut self, dt: f32) {
        for burst in &mut self.bursts {
            burst.life.advance(dt);
        }
        self.bursts.retain(|b| b.life.is_active());
    }

    /// The loudest live record within `radius` of `origin`, if any.
    ///
    /// Ties resolve to the earliest-registered record so replays agree.
    pub fn query_hottest(&self, origin: Vec3, radius: f32) -> Option<Hotspot> {
        if !origin.is_set() {
            return None;
        }
        let mut best: Option<Hotspot> = None;
        for burst in &self.bursts {
            if burst.position.distance(origin) > radius {
                continue;
            }
            let heat = self.effective(burst);
            if heat <= 0.0 {
                continue;
            }
            if best.map(|b| heat > b.magnitude).unwrap_or(true) {
                best = Some(Hotspot {
                    position: burst.position,
                    magnitude: heat,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_merge_within_radius_and_cap() {
        let mut field = NoiseField::new(NoiseConfig {
            magnitude_cap: 10.0,
            ..NoiseConfig::default()
        });
        let p = Vec3::new(4.0, 0.0, 4.0);

        field.register_burst(p, 6.0);
        field.register_burst(p + Vec3::new(0.5, 0.0, 0.0), 6.0);
        assert_eq!(field.len(), 1, "second burst accumulated");

        let hot = field.query_hottest(p, 2.0).unwrap();
        assert_eq!(hot.magnitude, 10.0, "capped");
    }

    #[test]
    fn distinct_locations_stay_distinct() {
        let mut field = NoiseField::default();
        field.register_burst(Vec3::ZERO, 2.0);
        field.register_burst(Vec3::new(10.0, 0.0, 0.0), 5.0);
        assert_eq!(field.len(), 2);

        // Query radius selects by distance, not identity.
        let near = field.query_hottest(Vec3::ZERO, 3.0).unwrap();
        assert_eq!(near.position, Vec3::ZERO);
        let wide = field.query_hottest(Vec3::ZERO, 20.0).unwrap();
        assert_eq!(wide.position, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn record_count_is_bounded() {
        let mut field = NoiseField::new(NoiseConfig {
            max_records: 4,
            merge_radius: 0.1,
            ..NoiseConfig::default()
        });
        for i in 0..10 {
            field.register_burst(Vec3::new(i as f32 * 5.0, 0.0, 0.0), 1.0 + i as f32);
        }
        assert_eq!(field.len(), 4);
    }

    #[test]
    fn sentinel_and_silent_bursts_are_ignored() {
        let mut field = NoiseField::default();
        field.register_burst(Vec3::UNSET, 5.0);
        field.register_burst(Vec3::ZERO, 0.0);
        field.register_burst(Vec3::ZERO, -1.0);
        assert!(field.is_empty());
        assert_eq!(field.query_hottest(Vec3::UNSET, 10.0), None);
    }
}
