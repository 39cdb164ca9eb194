//! Archetype library and drive loop for the feral agent runtime.
//!
//! Six hunter archetypes live here, each as a module bundling a memory
//! fragment, a tuning table, condition predicates, action steps, and a
//! `tree()` builder. All per-agent mutability flows through one
//! [`Blackboard`] composed from the fragments; the trees themselves are
//! stateless and shared. [`drive_all`] is the host-facing tick entry:
//! advance memory decay, fold world observations in, then evaluate the
//! tree, in that order, per agent.
//!
//! Hosts plug in by implementing [`BestiaryWorld`]: navigation and
//! motion from `feral-nav`, plus the quarry sampling and latch/cue
//! capabilities defined in [`world`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod blackboard;
pub mod drive;
pub mod hound;
mod leaf;
pub mod lurker;
pub mod mimic;
pub mod quarry;
pub mod skitter;
pub mod stalker;
pub mod statue;
pub mod tuning;
pub mod world;

pub use blackboard::Blackboard;
pub use drive::{drive_all, Creature};
pub use quarry::{QuarryTrack, QuarryTuning, Sighting};
pub use tuning::{BestiaryTuning, TuningError, TuningResult};
pub use world::{BestiaryWorld, HostCue, HostEffects, QuarrySample, QuarryWorld};
