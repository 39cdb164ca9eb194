//! The four node kinds: priority selector, sequence, condition, action.
//!
//! Composite children are evaluated in construction order every tick; the
//! order in the tree definition *is* the priority policy. There is no
//! remembered running-child index. Re-entering a `Running` branch must be
//! cheap and idempotent, which the action contract guarantees.

use feral_core::{TickContext, WorldMut};

use crate::bt::{BtNode, BtStatus};

/// Ordered alternatives. The first child whose result is not `Failure`
/// decides the selector's result; later children are not evaluated that
/// tick. Ties break positionally, never by score.
pub struct PrioritySelector<W, M>
where
    W: WorldMut + 'static,
{
    name: &'static str,
    children: Vec<Box<dyn BtNode<W, M>>>,
}

impl<W, M> PrioritySelector<W, M>
where
    W: WorldMut + 'static,
{
    pub fn new(name: &'static str, children: Vec<Box<dyn BtNode<W, M>>>) -> Self {
        Self { name, children }
    }
}

impl<W, M> BtNode<W, M> for PrioritySelector<W, M>
where
    W: WorldMut + 'static,
    M: 'static,
{
    fn tick(&self, ctx: &TickContext, agent: W::Agent, world: &mut W, memory: &mut M) -> BtStatus {
        for child in &self.children {
            match child.tick(ctx, agent, world, memory) {
                BtStatus::Failure => continue,
                other => return other,
            }
        }
        BtStatus::Failure
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Ordered steps. Aborts on the first `Failure` (returning `Failure`) or
/// `Running` (returning `Running`); succeeds only when every child
/// succeeded this tick. A later step can never run ahead of an earlier
/// one that has not succeeded.
pub struct Sequence<W, M>
where
    W: WorldMut + 'static,
{
    name: &'static str,
    children: Vec<Box<dyn BtNode<W, M>>>,
}

impl<W, M> Sequence<W, M>
where
    W: WorldMut + 'static,
{
    pub fn new(name: &'static str, children: Vec<Box<dyn BtNode<W, M>>>) -> Self {
        Self { name, children }
    }
}

impl<W, M> BtNode<W, M> for Sequence<W, M>
where
    W: WorldMut + 'static,
    M: 'static,
{
    fn tick(&self, ctx: &TickContext, agent: W::Agent, world: &mut W, memory: &mut M) -> BtStatus {
        for child in &self.children {
            match child.tick(ctx, agent, world, memory) {
                BtStatus::Success => continue,
                other => return other,
            }
        }
        BtStatus::Success
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Pure predicate leaf; `true` maps to `Success`. Conditions read the
/// world and memory but never mutate either.
pub struct Condition<F> {
    name: &'static str,
    pred: F,
}

impl<F> Condition<F> {
    pub fn new(name: &'static str, pred: F) -> Self {
        Self { name, pred }
    }
}

impl<F, W, M> BtNode<W, M> for Condition<F>
where
    F: Fn(&TickContext, W::Agent, &W, &M) -> bool + 'static,
    W: WorldMut + 'static,
    M: 'static,
{
    fn tick(&self, ctx: &TickContext, agent: W::Agent, world: &mut W, memory: &mut M) -> BtStatus {
        if (self.pred)(ctx, agent, &*world, &*memory) {
            BtStatus::Success
        } else {
            BtStatus::Failure
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Side-effecting step leaf. The only node kind allowed to mutate memory
/// or issue world effects. Must tolerate being called every tick while
/// `Running`: re-issuing the same movement goal may not restart progress,
/// and abandonment (the selector choosing a higher branch next tick) must
/// leave nothing dangling.
pub struct Action<F> {
    name: &'static str,
    step: F,
}

impl<F> Action<F> {
    pub fn new(name: &'static str, step: F) -> Self {
        Self { name, step }
    }
}

impl<F, W, M> BtNode<W, M> for Action<F>
where
    F: Fn(&TickContext, W::Agent, &mut W, &mut M) -> BtStatus + 'static,
    W: WorldMut + 'static,
    M: 'static,
{
    fn tick(&self, ctx: &TickContext, agent: W::Agent, world: &mut W, memory: &mut M) -> BtStatus {
        (self.step)(ctx, agent, world, memory)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
