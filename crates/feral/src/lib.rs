//! Umbrella crate that re-exports the `feral-*` building blocks.
//!
//! This crate is intended as a convenient entrypoint for hosts that want
//! the whole stack behind a single dependency, and as a home for docs.rs
//! feature flags.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use feral_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use feral_tools as tools;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use feral_nav as nav;

#[cfg(feature = "field")]
#[cfg_attr(docsrs, doc(cfg(feature = "field")))]
pub use feral_field as field;

#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use feral_bt as bt;

#[cfg(feature = "planner")]
#[cfg_attr(docsrs, doc(cfg(feature = "planner")))]
pub use feral_planner as planner;

#[cfg(feature = "bestiary")]
#[cfg_attr(docsrs, doc(cfg(feature = "bestiary")))]
pub use feral_bestiary as bestiary;
