use feral_core::{TickContext, WorldMut};

/// Tri-state result of evaluating any node.
///
/// `Success` means the branch reached its goal this tick; `Failure` means
/// it could not proceed and a sibling may try; `Running` means the branch
/// made progress and should be favored again next tick while its guards
/// still hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtStatus {
    Running,
    Success,
    Failure,
}

impl BtStatus {
    pub fn is_failure(self) -> bool {
        self == BtStatus::Failure
    }
}

/// A node in a shared behavior tree.
///
/// `tick` takes `&self`: the node graph is immutable once built, so one
/// boxed tree drives an unbounded number of agents without per-agent
/// copies. Everything that varies per agent lives in the memory store `M`
/// owned by the caller.
pub trait BtNode<W, M>: 'static
where
    W: WorldMut + 'static,
{
    fn tick(&self, ctx: &TickContext, agent: W::Agent, world: &mut W, memory: &mut M) -> BtStatus;

    /// Stable name for traces and tests.
    fn name(&self) -> &'static str;
}
