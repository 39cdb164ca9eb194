//! Host capability traits for the archetype library.
//!
//! Everything an archetype can learn about its quarry or do to the host
//! is an explicit method here; there is no name-based lookup of optional
//! host fields. Hosts without a capability keep the default no-op and
//! the relevant branch fails closed.

use feral_core::WorldMut;
use feral_field::NoiseField;
use feral_nav::{MotionWorld, Vec3};

/// One tick's reading of the hunted target, as the host perceives it
/// for this agent. `visible` reflects line of sight from the agent;
/// samples with `visible == false` still carry the host's ground truth,
/// and it is the sense step's job to decide what the agent may keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarrySample {
    /// Stable id of the tracked subject.
    pub subject: u64,
    pub position: Vec3,
    /// Unit forward vector of the quarry.
    pub facing: Vec3,
    pub velocity: Vec3,
    /// How loudly the quarry is moving, 0..1.
    pub noise: f32,
    pub visible: bool,
    /// No other subjects near the quarry.
    pub isolated: bool,
}

pub trait QuarryWorld: WorldMut {
    /// Current sample of the agent's hunted target, if any.
    fn quarry(&self, agent: Self::Agent) -> Option<QuarrySample>;

    /// Whether a previously sighted subject can still be tracked at all.
    /// Sighting records for subjects that cannot are purged on sense.
    fn trackable(&self, subject: u64) -> bool;

    /// Center of the agent's assigned territory.
    fn territory(&self, agent: Self::Agent) -> Vec3;

    fn territory_radius(&self, _agent: Self::Agent) -> f32 {
        12.0
    }
}

/// Host-side cue an action wants performed (animation, audio). Cues are
/// fire-and-forget; nothing in the tree reads them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCue {
    /// Threat display before a retreat.
    Warn,
    /// Defensive spore burst.
    SporeBurst,
    Bite,
    /// Voice-lure playback.
    Vocal,
}

/// Physical effects only the host can perform. Defaults are no-ops so a
/// host only implements what its roster needs; `is_latched` defaulting
/// to `false` keeps ceiling branches failing closed on such hosts.
pub trait HostEffects: WorldMut {
    /// Begin attaching the agent to the ceiling at `hang`. Attachment
    /// may take multiple ticks; poll [`HostEffects::is_latched`].
    fn latch_ceiling(&mut self, _agent: Self::Agent, _hang: Vec3) {}

    /// Detach from the ceiling without attacking.
    fn release_ceiling(&mut self, _agent: Self::Agent) {}

    /// Detach and fall onto whatever is below.
    fn drop_attack(&mut self, _agent: Self::Agent) {}

    fn is_latched(&self, _agent: Self::Agent) -> bool {
        false
    }

    /// Whether the last drop ended with prey held.
    fn has_latched_prey(&self, _agent: Self::Agent) -> bool {
        false
    }

    fn emit_cue(&mut self, _agent: Self::Agent, _cue: HostCue) {}
}

/// Everything the archetype trees need from a host, in one bound.
pub trait BestiaryWorld: MotionWorld + QuarryWorld + HostEffects {
    /// The shared ambient noise accumulator. Hosts register bursts into
    /// it; agents only read.
    fn noise(&self) -> &NoiseField;
}
