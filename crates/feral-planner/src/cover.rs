//! One-shot cover pick, for agents that stash the winner in a timed
//! memory slot instead of holding a candidate list.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use feral_nav::{NavQuery, Vec3};

/// Acceptance rules for a [`CoverQuery`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoverConfig {
    /// Acceptance band, measured from the querying agent.
    pub min_distance: f32,
    pub max_distance: f32,
    /// Picks scoring below this are rejected; the default accepts any
    /// finite score.
    pub min_score: f32,
    /// Projection radius for snapping raw sample points onto navigable
    /// space.
    pub sample_radius: f32,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            min_distance: 4.0,
            max_distance: 34.0,
            min_score: f32::NEG_INFINITY,
            sample_radius: 1.5,
        }
    }
}

/// The winning spot and the score it won with.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoverPick {
    pub point: Vec3,
    pub score: f32,
}

/// Uncached spot query: enumerates the host's sample points, scores
/// each on demand, and returns the single best pick.
///
/// Scoring closures reject a spot by returning a non-finite value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverQuery {
    config: CoverConfig,
}

impl CoverQuery {
    pub fn new(config: CoverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> CoverConfig {
        self.config
    }

    /// Best-scoring spot within the band around `origin`, or `None` when
    /// nothing qualifies. First-encountered wins ties.
    pub fn find(
        &self,
        nav: &dyn NavQuery,
        origin: Vec3,
        score_spot: impl Fn(&dyn NavQuery, Vec3) -> f32,
    ) -> Option<CoverPick> {
        if !origin.is_set() {
            return None;
        }
        let mut best: Option<CoverPick> = None;
        for &raw in nav.sample_points() {
            let Some(point) = nav.sample_navigable(raw, self.config.sample_radius) else {
                continue;
            };
            let distance = origin.distance(point);
            if distance < self.config.min_distance || distance > self.config.max_distance {
                continue;
            }
            let score = score_spot(nav, point);
            if !score.is_finite() || score < self.config.min_score {
                continue;
            }
            if best.map(|b| score > b.score).unwrap_or(true) {
                best = Some(CoverPick { point, score });
            }
        }
        best
    }
}

impl Default for CoverQuery {
    fn default() -> Self {
        Self::new(CoverConfig::default())
    }
}
