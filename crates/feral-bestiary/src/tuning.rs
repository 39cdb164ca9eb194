//! Archetype tuning tables and their load-time validation.
//!
//! Tables deserialize from YAML or JSON with every field optional;
//! omitted fields take the shipped defaults. Validation happens once at
//! load and is the only `Result` surface in the workspace. Tree
//! evaluation never sees a `Result`: a bad table refuses to load, a
//! loaded table is trusted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hound::HoundTuning;
use crate::lurker::LurkerTuning;
use crate::mimic::MimicTuning;
use crate::quarry::QuarryTuning;
use crate::skitter::SkitterTuning;
use crate::stalker::StalkerTuning;
use crate::statue::StatueTuning;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning value `{field}` out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },
    #[error("yaml tuning parse failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json tuning parse failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TuningResult<T> = Result<T, TuningError>;

/// All archetype tables plus the shared quarry perception table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BestiaryTuning {
    pub quarry: QuarryTuning,
    pub stalker: StalkerTuning,
    pub statue: StatueTuning,
    pub lurker: LurkerTuning,
    pub skitter: SkitterTuning,
    pub mimic: MimicTuning,
    pub hound: HoundTuning,
}

impl BestiaryTuning {
    pub fn from_yaml(text: &str) -> TuningResult<Self> {
        let tuning: Self = serde_yaml::from_str(text)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn from_json(text: &str) -> TuningResult<Self> {
        let tuning: Self = serde_json::from_str(text)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> TuningResult<()> {
        ensure_positive("quarry.memory_seconds", self.quarry.memory_seconds)?;
        ensure_positive("quarry.turn_rate", self.quarry.turn_rate)?;
        ensure_dot("quarry.watch_dot", self.quarry.watch_dot)?;
        self.stalker.validate()?;
        self.statue.validate()?;
        self.lurker.validate()?;
        self.skitter.validate()?;
        self.mimic.validate()?;
        self.hound.validate()?;
        tracing::debug!("Bestiary tuning validated");
        Ok(())
    }
}

pub(crate) fn ensure_positive(field: &'static str, value: f32) -> TuningResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            value,
            expected: "finite and > 0",
        })
    }
}

pub(crate) fn ensure_fraction(field: &'static str, value: f32) -> TuningResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            value,
            expected: "within 0..=1",
        })
    }
}

pub(crate) fn ensure_dot(field: &'static str, value: f32) -> TuningResult<()> {
    if value.is_finite() && (-1.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            value,
            expected: "within -1..=1",
        })
    }
}

pub(crate) fn ensure_band(field: &'static str, min: f32, max: f32) -> TuningResult<()> {
    if min.is_finite() && max.is_finite() && min >= 0.0 && min < max {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            value: min,
            expected: "0 <= min < max, both finite",
        })
    }
}
