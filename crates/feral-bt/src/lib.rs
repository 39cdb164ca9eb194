//! Stateless behavior-tree evaluator built on `feral-core`.
//!
//! One tree instance is built per archetype and shared by every agent of
//! that archetype. Nodes therefore hold no per-agent state at all; the
//! running branch, timers, and targets all live in the caller's memory
//! store `M`, which is the second type parameter threaded through every
//! node.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod bt;
pub mod nodes;

pub use bt::{BtNode, BtStatus};
pub use nodes::{Action, Condition, PrioritySelector, Sequence};
