//! World extension traits for navigation and motion.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use feral_core::{WorldMut, WorldView};

use crate::{NavPath, NavQuery, Vec3};

pub trait NavWorldView: WorldView {
    fn position(&self, agent: Self::Agent) -> Option<Vec3>;

    /// Unit forward vector.
    fn facing(&self, agent: Self::Agent) -> Option<Vec3>;

    fn nav(&self) -> &dyn NavQuery;
}

/// Speed envelope for a movement goal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionProfile {
    pub speed: f32,
    pub acceleration: f32,
    pub stopping_distance: f32,
}

/// A validated movement goal handed to the host's steering.
///
/// Issuing a new goal always replaces the active one; there is no cancel
/// handshake, which is what makes mid-`Running` abandonment safe.
#[derive(Debug, Clone)]
pub struct MoveGoal {
    pub label: &'static str,
    pub destination: Vec3,
    pub path: NavPath,
    pub profile: MotionProfile,
}

pub trait MotionWorld: WorldMut + NavWorldView {
    /// Replaces the agent's movement goal and motion profile.
    fn apply_motion(&mut self, agent: Self::Agent, goal: MoveGoal);

    /// Stops in place, clearing any active goal.
    fn halt(&mut self, agent: Self::Agent);

    /// Rotates the agent toward `point` this frame.
    fn face_toward(&mut self, agent: Self::Agent, point: Vec3);
}
