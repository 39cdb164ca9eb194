//! Navigation math, query traits, and the movement gateway.
//!
//! The host owns pathfinding and physics; this crate defines the trait
//! seam those primitives are consumed through, the `Vec3`/sentinel math
//! the rest of the workspace shares, the movement gateway that validates
//! and issues movement goals, and a deterministic reference backend
//! (`RoomNav`) for tests and benches.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod gateway;
pub mod math;
pub mod query;
pub mod rooms;
pub mod world;

pub use gateway::{agent_spread, request, MoveRequest};
pub use math::{clamp01, inv_lerp, lerp, TimedPoint, Vec3};
pub use query::{LightSource, NavPath, NavQuery, PathClass, RayHit};
pub use rooms::{Aabb, RoomNav};
pub use world::{MotionProfile, MotionWorld, MoveGoal, NavWorldView};
