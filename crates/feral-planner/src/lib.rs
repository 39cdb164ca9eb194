//! Spatial candidate planning over [`feral_nav::NavQuery`] probes.
//!
//! Two surfaces share one scoring toolkit:
//!
//! - [`SpotSurvey`]: a per-agent cached candidate list with a refresh
//!   deadline. Rebuilds enumerate the host's sample points and pay for
//!   raycast scoring; reads between rebuilds are cache hits. Selection
//!   layers a caller-supplied bias over the cached static scores, so
//!   threat-relative preferences stay current while geometry is cached.
//! - [`CoverQuery`]: the same enumeration and scoring run on demand with
//!   no cache. Callers that want reuse hold the winning point in a timed
//!   memory slot instead of holding a list.
//!
//! The [`score`] module carries the probe heuristics both surfaces are
//! fed with: wall closeness, choke width, ray-ring cover, ceiling hang
//! points, ambient darkness, and path reachability.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod cover;
pub mod score;
pub mod survey;

pub use cover::{CoverConfig, CoverPick, CoverQuery};
pub use score::{ChokeProbe, DarknessProbe, RingProbe, WallProbe};
pub use survey::{Candidate, SpotSurvey, SurveyConfig};
