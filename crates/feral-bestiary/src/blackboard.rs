//! The per-agent memory store.
//!
//! One `Blackboard` per agent, composed from the quarry track plus one
//! fragment per archetype. A tree only touches its own fragment and the
//! quarry track, but the aggregate keeps ownership in one place: agent
//! state is allocated once and dies with the agent, with no global
//! table keyed by id anywhere.
//!
//! Decay runs through [`Blackboard::advance`] exactly once per agent
//! per tick, before the sense fold and tree evaluation.

use feral_tools::{TraceEvent, TraceLog};

use crate::hound::HoundMemory;
use crate::lurker::LurkerMemory;
use crate::mimic::MimicMemory;
use crate::quarry::QuarryTrack;
use crate::skitter::SkitterMemory;
use crate::stalker::StalkerMemory;
use crate::statue::StatueMemory;
use crate::tuning::BestiaryTuning;

#[derive(Debug, Clone)]
pub struct Blackboard {
    pub quarry: QuarryTrack,
    pub stalker: StalkerMemory,
    pub statue: StatueMemory,
    pub lurker: LurkerMemory,
    pub skitter: SkitterMemory,
    pub mimic: MimicMemory,
    pub hound: HoundMemory,
    active_action: Option<&'static str>,
    trace: Option<TraceLog>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::tuned(&BestiaryTuning::default())
    }

    /// Builds a board whose meters and survey caches are sized from
    /// `tuning`. The scalar thresholds stay in the tuning table and are
    /// read at evaluation time.
    pub fn tuned(tuning: &BestiaryTuning) -> Self {
        Self {
            quarry: QuarryTrack::new(),
            stalker: StalkerMemory::new(&tuning.stalker),
            statue: StatueMemory::new(),
            lurker: LurkerMemory::new(&tuning.lurker),
            skitter: SkitterMemory::new(),
            mimic: MimicMemory::new(&tuning.mimic),
            hound: HoundMemory::new(),
            active_action: None,
            trace: None,
        }
    }

    /// Enables the deterministic action trace, recorded on every action
    /// switch. Used by replay tests; never read by the trees.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(TraceLog::default());
        self
    }

    /// Decays every fragment. Must run before this agent's tree
    /// evaluation in the same tick.
    pub fn advance(&mut self, dt: f32) {
        self.quarry.advance(dt);
        self.stalker.advance(dt);
        self.statue.advance(dt);
        self.lurker.advance(dt);
        self.skitter.advance(dt);
        self.mimic.advance(dt);
        self.hound.advance(dt);
    }

    /// Label of the last action that reported progress.
    pub fn active_action(&self) -> Option<&'static str> {
        self.active_action
    }

    pub fn trace(&self) -> Option<&TraceLog> {
        self.trace.as_ref()
    }

    pub(crate) fn note_action(&mut self, tick: u64, agent: u64, label: &'static str) {
        if self.active_action == Some(label) {
            return;
        }
        self.active_action = Some(label);
        tracing::debug!(agent = agent, action = label, "Agent switched action");
        if let Some(log) = self.trace.as_mut() {
            log.record(TraceEvent::new(tick, label).with_a(agent));
        }
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new()
    }
}
