//! World trait seam.
//!
//! The kernel does not prescribe which queries a world must answer; each
//! subsystem crate (nav, perception, archetypes) defines extension traits
//! over these markers. Hosts implement the capabilities they have, at
//! compile time, with no runtime name lookup.

use core::fmt::Debug;

/// Stable identifier for an agent.
///
/// Deterministic simulation requires stable ordering (`Ord`) and a stable
/// numeric id (`stable_id`) for seeding and traces.
pub trait AgentId: Copy + Ord + Eq + Debug {
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

impl AgentId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

/// Read-only world access.
pub trait WorldView {
    type Agent: AgentId;

    /// Whether `agent` is still alive in the host.
    ///
    /// Guards fail closed on a dead handle instead of panicking; hosts that
    /// never hand out stale handles can keep the default.
    fn contains(&self, agent: Self::Agent) -> bool {
        let _ = agent;
        true
    }
}

/// Write access / effect sink.
pub trait WorldMut: WorldView {}
