//! Deterministic trace primitives.
//!
//! Dumb-data events recorded during simulation and rendered later by
//! tooling. Replay tests compare whole logs: two runs with the same seed
//! must produce byte-identical event sequences. Emission must never
//! affect control flow.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{NullTraceSink, TraceEvent, TraceLog, TraceSink, VecTraceSink};
