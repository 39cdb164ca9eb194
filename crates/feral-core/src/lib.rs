//! Deterministic kernel primitives for the feral agent runtime.
//!
//! Everything here is engine-agnostic and dependency-free: tick context,
//! seeded RNG, the countdown/meter clock primitives that agent memory is
//! composed from, and the world trait seam that subsystem crates extend.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod clock;
pub mod rng;
pub mod tick;
pub mod world;

pub use clock::{DecayTimer, Meter};
pub use rng::{DeterministicRng, SplitMix64};
pub use tick::TickContext;
pub use world::{AgentId, WorldMut, WorldView};
