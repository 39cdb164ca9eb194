//! One creature = one agent's board, sense step, and tree, driven in a
//! fixed per-tick order: decay the board, fold fresh world facts, then
//! evaluate the tree. `drive_all` fixes the cross-agent order too, so a
//! run is reproducible from (seed, roster) alone.

use feral_bt::{BtNode, BtStatus};
use feral_core::{AgentId, TickContext, WorldView};

use crate::blackboard::Blackboard;
use crate::tuning::BestiaryTuning;
use crate::world::BestiaryWorld;

/// Per-tick fact folding run before the tree. Each archetype supplies
/// its own; the hound's, for instance, never reads the quarry sample.
pub type SenseFn<W> =
    fn(&TickContext, <W as WorldView>::Agent, &W, &mut Blackboard, &BestiaryTuning);

pub struct Creature<W>
where
    W: BestiaryWorld + 'static,
{
    pub agent: W::Agent,
    pub board: Blackboard,
    tuning: BestiaryTuning,
    sense: SenseFn<W>,
    tree: Box<dyn BtNode<W, Blackboard>>,
    last_status: BtStatus,
}

impl<W> Creature<W>
where
    W: BestiaryWorld + 'static,
{
    pub fn new(
        agent: W::Agent,
        tuning: BestiaryTuning,
        sense: SenseFn<W>,
        tree: Box<dyn BtNode<W, Blackboard>>,
    ) -> Self {
        Self {
            agent,
            board: Blackboard::tuned(&tuning),
            tuning,
            sense,
            tree,
            last_status: BtStatus::Failure,
        }
    }

    /// Enables the replay trace on this creature's board.
    pub fn with_trace(mut self) -> Self {
        self.board = self.board.with_trace();
        self
    }

    pub fn tuning(&self) -> &BestiaryTuning {
        &self.tuning
    }

    pub fn last_status(&self) -> BtStatus {
        self.last_status
    }

    /// Label of the action that most recently reported progress.
    pub fn active_action(&self) -> Option<&'static str> {
        self.board.active_action()
    }

    pub fn drive(&mut self, ctx: &TickContext, world: &mut W) -> BtStatus {
        self.board.advance(ctx.dt_seconds);
        (self.sense)(ctx, self.agent, world, &mut self.board, &self.tuning);
        let status = self.tree.tick(ctx, self.agent, world, &mut self.board);
        self.last_status = status;
        status
    }
}

/// Drives every creature once, in stable-id order regardless of the
/// slice order handed in.
pub fn drive_all<W>(ctx: &TickContext, world: &mut W, creatures: &mut [Creature<W>])
where
    W: BestiaryWorld + 'static,
{
    creatures.sort_by_key(|c| c.agent.stable_id());
    for creature in creatures.iter_mut() {
        creature.drive(ctx, world);
    }
}
