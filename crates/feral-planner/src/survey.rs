//! Deadline-throttled candidate spot cache.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use feral_nav::{NavQuery, Vec3};

/// Rebuild cadence and acceptance rules for a [`SpotSurvey`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurveyConfig {
    /// Seconds between candidate rebuilds.
    pub cooldown: f32,
    /// Acceptance band, measured from the anchor supplied at rebuild.
    pub min_distance: f32,
    pub max_distance: f32,
    /// Candidates scoring below this are rejected at rebuild.
    pub min_score: f32,
    /// Rebuilding stops accepting once this many candidates are kept.
    pub max_candidates: usize,
    /// Projection radius for snapping raw sample points onto navigable
    /// space.
    pub sample_radius: f32,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            cooldown: 6.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_score: 0.0,
            max_candidates: 64,
            sample_radius: 1.5,
        }
    }
}

impl SurveyConfig {
    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown = seconds;
        self
    }

    pub fn with_band(mut self, min_distance: f32, max_distance: f32) -> Self {
        self.min_distance = min_distance;
        self.max_distance = max_distance;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_cap(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }
}

/// A projected sample point that survived filtering, with its static
/// geometric score.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate {
    pub point: Vec3,
    pub score: f32,
}

/// Cached, periodically rebuilt list of scored candidate spots.
///
/// Owned by one agent. A rebuild runs when the refresh deadline has
/// passed or the list is empty; between rebuilds every read is a cache
/// hit and no probing happens. Selection adds a caller-supplied bias to
/// the cached static score, which keeps threat-relative preferences
/// current while the expensive geometry stays cached.
#[derive(Debug, Clone)]
pub struct SpotSurvey {
    config: SurveyConfig,
    candidates: Vec<Candidate>,
    refresh_at: f64,
    cursor: usize,
    rebuilds: u64,
}

impl SpotSurvey {
    pub fn new(config: SurveyConfig) -> Self {
        Self {
            config,
            candidates: Vec::new(),
            refresh_at: f64::NEG_INFINITY,
            cursor: 0,
            rebuilds: 0,
        }
    }

    pub fn config(&self) -> SurveyConfig {
        self.config
    }

    /// Candidates from the last rebuild, in host enumeration order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of rebuilds run so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Drops the cached list; the next selection rebuilds regardless of
    /// the deadline.
    pub fn invalidate(&mut self) {
        self.candidates.clear();
        self.refresh_at = f64::NEG_INFINITY;
    }

    /// Best candidate by cached score plus `bias`, refreshing the cache
    /// first if it is stale or empty. First-encountered wins ties.
    pub fn select_best(
        &mut self,
        nav: &dyn NavQuery,
        anchor: Vec3,
        now: f64,
        score_spot: impl Fn(&dyn NavQuery, Vec3) -> f32,
        bias: impl Fn(Vec3) -> f32,
    ) -> Option<Vec3> {
        self.ensure_fresh(nav, anchor, now, score_spot);
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;
        for candidate in &self.candidates {
            let mut total = candidate.score + bias(candidate.point);
            if total.is_nan() {
                total = f32::NEG_INFINITY;
            }
            if total > best_score {
                best_score = total;
                best = Some(candidate.point);
            }
        }
        best
    }

    /// Candidate farthest from `threat`, for fleeing. An unknown threat
    /// falls back to the first candidate.
    pub fn select_escape(
        &mut self,
        nav: &dyn NavQuery,
        anchor: Vec3,
        now: f64,
        score_spot: impl Fn(&dyn NavQuery, Vec3) -> f32,
        threat: Vec3,
    ) -> Option<Vec3> {
        self.ensure_fresh(nav, anchor, now, score_spot);
        if !threat.is_set() {
            return self.candidates.first().map(|c| c.point);
        }
        let mut farthest = None;
        let mut best_distance = f32::NEG_INFINITY;
        for candidate in &self.candidates {
            let distance = candidate.point.distance(threat);
            if distance > best_distance {
                best_distance = distance;
                farthest = Some(candidate.point);
            }
        }
        farthest
    }

    /// Next candidate in round-robin order, refreshing the cache first
    /// when due.
    ///
    /// The cursor survives rebuilds, so callers keep cycling instead of
    /// snapping back to the head of every fresh list.
    pub fn next_candidate(
        &mut self,
        nav: &dyn NavQuery,
        anchor: Vec3,
        now: f64,
        score_spot: impl Fn(&dyn NavQuery, Vec3) -> f32,
    ) -> Option<Vec3> {
        self.ensure_fresh(nav, anchor, now, score_spot);
        if self.candidates.is_empty() {
            return None;
        }
        let index = self.cursor % self.candidates.len();
        self.cursor = self.cursor.wrapping_add(1);
        Some(self.candidates[index].point)
    }

    fn ensure_fresh(
        &mut self,
        nav: &dyn NavQuery,
        anchor: Vec3,
        now: f64,
        score_spot: impl Fn(&dyn NavQuery, Vec3) -> f32,
    ) {
        if now < self.refresh_at && !self.candidates.is_empty() {
            return;
        }
        self.rebuild(nav, anchor, score_spot);
        self.refresh_at = now + f64::from(self.config.cooldown);
    }

    fn rebuild(
        &mut self,
        nav: &dyn NavQuery,
        anchor: Vec3,
        score_spot: impl Fn(&dyn NavQuery, Vec3) -> f32,
    ) {
        self.candidates.clear();
        self.rebuilds = self.rebuilds.wrapping_add(1);
        if !anchor.is_set() {
            return;
        }
        // Enumeration order is kept; the cap stops the scan rather than
        // keeping the best.
        for &raw in nav.sample_points() {
            if self.candidates.len() >= self.config.max_candidates {
                break;
            }
            let Some(point) = nav.sample_navigable(raw, self.config.sample_radius) else {
                continue;
            };
            let distance = anchor.distance(point);
            if distance < self.config.min_distance || distance > self.config.max_distance {
                continue;
            }
            let score = score_spot(nav, point);
            if score.is_nan() || score < self.config.min_score {
                continue;
            }
            self.candidates.push(Candidate { point, score });
        }
    }
}
