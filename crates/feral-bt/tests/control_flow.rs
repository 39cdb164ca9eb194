use std::cell::Cell;

use feral_bt::{Action, BtNode, BtStatus, Condition, PrioritySelector, Sequence};
use feral_core::{TickContext, WorldMut, WorldView};

#[derive(Debug, Default)]
struct TestWorld;

impl WorldView for TestWorld {
    type Agent = u64;
}

impl WorldMut for TestWorld {}

#[derive(Debug, Default)]
struct TestMemory {
    hungry: bool,
    cond_calls: Cell<usize>,
    act_calls: Cell<usize>,
}

fn ctx() -> TickContext {
    TickContext::new(1, 0.05, 0.05, 7)
}

fn counted_cond(
    name: &'static str,
    value: bool,
) -> Condition<impl Fn(&TickContext, u64, &TestWorld, &TestMemory) -> bool> {
    Condition::new(
        name,
        move |_ctx: &TickContext, _agent, _world: &TestWorld, mem: &TestMemory| {
            mem.cond_calls.set(mem.cond_calls.get() + 1);
            value
        },
    )
}

fn counted_act(
    name: &'static str,
    result: BtStatus,
) -> Action<impl Fn(&TickContext, u64, &mut TestWorld, &mut TestMemory) -> BtStatus> {
    Action::new(
        name,
        move |_ctx: &TickContext, _agent, _world: &mut TestWorld, mem: &mut TestMemory| {
            mem.act_calls.set(mem.act_calls.get() + 1);
            result
        },
    )
}

#[test]
fn sequence_aborts_at_first_failure() {
    let seq: Sequence<TestWorld, TestMemory> = Sequence::new(
        "seq",
        vec![
            Box::new(counted_cond("gate", false)),
            Box::new(counted_act("step", BtStatus::Success)),
        ],
    );
    let mut world = TestWorld;
    let mut mem = TestMemory::default();

    let status = seq.tick(&ctx(), 1, &mut world, &mut mem);

    assert_eq!(status, BtStatus::Failure);
    assert_eq!(mem.cond_calls.get(), 1);
    // The failing gate short-circuits; the step is never touched.
    assert_eq!(mem.act_calls.get(), 0);
}

#[test]
fn sequence_aborts_at_running_child() {
    let seq: Sequence<TestWorld, TestMemory> = Sequence::new(
        "seq",
        vec![
            Box::new(counted_act("walk", BtStatus::Running)),
            Box::new(counted_act("strike", BtStatus::Success)),
        ],
    );
    let mut world = TestWorld;
    let mut mem = TestMemory::default();

    let status = seq.tick(&ctx(), 1, &mut world, &mut mem);

    assert_eq!(status, BtStatus::Running);
    assert_eq!(mem.act_calls.get(), 1);
}

#[test]
fn sequence_succeeds_only_when_every_child_does() {
    let seq: Sequence<TestWorld, TestMemory> = Sequence::new(
        "seq",
        vec![
            Box::new(counted_cond("a", true)),
            Box::new(counted_cond("b", true)),
            Box::new(counted_act("c", BtStatus::Success)),
        ],
    );
    let mut world = TestWorld;
    let mut mem = TestMemory::default();

    assert_eq!(seq.tick(&ctx(), 1, &mut world, &mut mem), BtStatus::Success);
    assert_eq!(mem.cond_calls.get(), 2);
    assert_eq!(mem.act_calls.get(), 1);
}

#[test]
fn selector_stops_at_first_non_failure() {
    let sel: PrioritySelector<TestWorld, TestMemory> = PrioritySelector::new(
        "root",
        vec![
            Box::new(counted_cond("first", false)),
            Box::new(counted_act("second", BtStatus::Running)),
            Box::new(counted_act("third", BtStatus::Success)),
        ],
    );
    let mut world = TestWorld;
    let mut mem = TestMemory::default();

    let status = sel.tick(&ctx(), 1, &mut world, &mut mem);

    assert_eq!(status, BtStatus::Running);
    assert_eq!(mem.cond_calls.get(), 1);
    // "third" sits below the running branch and must not be evaluated.
    assert_eq!(mem.act_calls.get(), 1);
}

#[test]
fn selector_fails_when_all_children_fail() {
    let sel: PrioritySelector<TestWorld, TestMemory> = PrioritySelector::new(
        "root",
        vec![
            Box::new(counted_cond("a", false)),
            Box::new(counted_cond("b", false)),
        ],
    );
    let mut world = TestWorld;
    let mut mem = TestMemory::default();

    assert_eq!(sel.tick(&ctx(), 1, &mut world, &mut mem), BtStatus::Failure);
    assert_eq!(mem.cond_calls.get(), 2);
}

#[test]
fn guarded_branch_falls_through_to_idle() {
    // The canonical archetype shape: guard + step behind a selector with an
    // unconditioned fallback.
    let root: PrioritySelector<TestWorld, TestMemory> = PrioritySelector::new(
        "root",
        vec![
            Box::new(Sequence::new(
                "hunt",
                vec![
                    Box::new(Condition::new(
                        "hungry",
                        |_c: &TickContext, _a, _w: &TestWorld, mem: &TestMemory| mem.hungry,
                    )),
                    Box::new(counted_act("chase", BtStatus::Running)),
                ],
            )),
            Box::new(counted_act("idle", BtStatus::Running)),
        ],
    );
    let mut world = TestWorld;
    let mut mem = TestMemory::default();

    assert_eq!(root.tick(&ctx(), 1, &mut world, &mut mem), BtStatus::Running);
    assert_eq!(mem.act_calls.get(), 1, "only idle ran");

    mem.hungry = true;
    assert_eq!(root.tick(&ctx(), 1, &mut world, &mut mem), BtStatus::Running);
    assert_eq!(mem.act_calls.get(), 2, "hunt now outranks idle");
}

#[test]
fn condition_does_not_mutate_memory() {
    let cond: Condition<_> = Condition::new(
        "watched",
        |_c: &TickContext, _a, _w: &TestWorld, mem: &TestMemory| mem.hungry,
    );
    let mut world = TestWorld;
    let mut mem = TestMemory::default();

    let before = mem.hungry;
    let _ = BtNode::<TestWorld, TestMemory>::tick(&cond, &ctx(), 1, &mut world, &mut mem);
    assert_eq!(mem.hungry, before);
    assert_eq!(BtNode::<TestWorld, TestMemory>::name(&cond), "watched");
}
