//! Per-frame tick context.

use crate::{rng, AgentId, SplitMix64};

/// Frame-scoped inputs shared by every agent ticked this frame.
///
/// `elapsed_seconds` is the host's accumulated simulation time; planner
/// refresh deadlines and other absolute-time facts compare against it so
/// they survive variable frame deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    pub elapsed_seconds: f64,
    pub seed: u64,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32, elapsed_seconds: f64, seed: u64) -> Self {
        Self {
            tick,
            dt_seconds,
            elapsed_seconds,
            seed,
        }
    }

    /// Deterministic per-agent generator for the given stream.
    ///
    /// Folding the tick in keeps draws independent across frames while
    /// staying replayable; callers that need a draw stable *across* frames
    /// (for example a fixed per-agent offset) use [`Self::agent_seed`]
    /// directly.
    pub fn rng_for_agent<A: AgentId>(&self, agent: A, stream: u64) -> SplitMix64 {
        let seed = rng::derive_seed(self.seed, agent.stable_id(), stream ^ rng::mix64(self.tick));
        SplitMix64::new(seed)
    }

    /// Tick-independent seed for the given agent and stream.
    pub fn agent_seed<A: AgentId>(&self, agent: A, stream: u64) -> u64 {
        rng::derive_seed(self.seed, agent.stable_id(), stream)
    }
}
