//! The transition planner.
//!
//! Turns the set of transit requests accumulated during dispatch into one
//! atomic plan: an ordered exit list, the next configuration, and an ordered
//! entry list. Exits are a post-order walk of the current active tree
//! restricted to the must-exit set; entries are a pre-order walk of the next
//! configuration restricted to the must-enter set; siblings keep declaration
//! order. Joints are interleaved so that a deactivating joint exits before
//! the first of its guards and an activating joint enters after the last of
//! its guards.

use core::fmt;

use crate::core::active::{ActiveSet, JointIndex};
use crate::core::event::{Event, Reply};
use crate::core::tree::{ChartDefinition, StateKind};

/// One scheduled exit or entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlanStep<S> {
    State(S),
    Joint(S),
}

/// An atomic transition between two legal configurations.
#[derive(Debug)]
pub(crate) struct TransitionPlan<S, const N: usize> {
    pub(crate) exits: heapless::Vec<PlanStep<S>, N>,
    pub(crate) entries: heapless::Vec<PlanStep<S>, N>,
    pub(crate) next: heapless::Vec<S, N>,
}

/// Why a transit-request set could not be planned. The configuration is left
/// unchanged in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlanError<S> {
    /// A requested target names no declared node.
    UnknownTarget(S),
    /// Two requests select different children of the same composite.
    Conflict(S),
    /// Planner scratch space exhausted (more steps than `N` nodes).
    Overflow,
}

/// Plan the transition for `targets` against the current configuration.
pub(crate) fn plan_transition<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
    joints: &JointIndex<S, N>,
    active: &ActiveSet<S, N>,
    targets: &[S],
) -> Result<TransitionPlan<S, N>, PlanError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    // A transit to a joint stands for a transit to all of its guards; the
    // guards do not pick up the outer re-entry rule (an already-active guard
    // stays untouched).
    let mut expanded: heapless::Vec<(S, bool), N> = heapless::Vec::new();
    for &target in targets {
        let node = def.node(target).ok_or(PlanError::UnknownTarget(target))?;
        if matches!(node.kind, StateKind::Joint { .. }) {
            for &guard in joints.guards_of(target) {
                push_target(&mut expanded, guard, false)?;
            }
        } else {
            push_target(&mut expanded, target, true)?;
        }
    }

    // Each target's path to the top selects one child per composite along the
    // way; two targets selecting different children of one composite are
    // inconsistent.
    let mut chosen: heapless::Vec<(S, S), N> = heapless::Vec::new();
    for &(target, _) in &expanded {
        let path: heapless::Vec<S, N> = def.path_to_top(target);
        for window in 0..path.len().saturating_sub(1) {
            let child = path[window];
            let parent = path[window + 1];
            if !matches!(
                def.node(parent).map(|n| &n.kind),
                Some(StateKind::Composite { .. })
            ) {
                continue;
            }
            match chosen.iter().find(|(p, _)| *p == parent) {
                Some((_, existing)) if *existing != child => {
                    return Err(PlanError::Conflict(target));
                }
                Some(_) => {}
                None => {
                    chosen
                        .push((parent, child))
                        .map_err(|_| PlanError::Overflow)?;
                }
            }
        }
    }

    // The outer-transition rule: a requested target that is already active
    // exits and re-enters together with its whole active subtree.
    let mut reenter: heapless::Vec<S, N> = heapless::Vec::new();
    for &(target, outer) in &expanded {
        if outer && active.is_active(target) {
            reenter.push(target).map_err(|_| PlanError::Overflow)?;
        }
    }

    let mut next: heapless::Vec<S, N> = heapless::Vec::new();
    let mut raw_entries: heapless::Vec<S, N> = heapless::Vec::new();
    build_next(
        def,
        &chosen,
        active,
        &reenter,
        def.top,
        false,
        &mut next,
        &mut raw_entries,
    )?;

    let mut raw_exits: heapless::Vec<S, N> = heapless::Vec::new();
    collect_exits(def, active, &next, &reenter, def.top, false, &mut raw_exits)?;

    let exits = interleave_exits(joints, active, &raw_exits)?;
    let mut exited_joints: heapless::Vec<S, N> = heapless::Vec::new();
    for step in &exits {
        if let PlanStep::Joint(j) = step {
            exited_joints.push(*j).map_err(|_| PlanError::Overflow)?;
        }
    }
    let entries = interleave_entries(joints, active, &exited_joints, &raw_entries, &next)?;

    Ok(TransitionPlan {
        exits,
        entries,
        next,
    })
}

/// Plan the exit of the entire configuration (`terminate`).
pub(crate) fn plan_terminate<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
    joints: &JointIndex<S, N>,
    active: &ActiveSet<S, N>,
) -> Result<TransitionPlan<S, N>, PlanError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    let mut raw_exits: heapless::Vec<S, N> = heapless::Vec::new();
    collect_exits(def, active, &[], &[], def.top, false, &mut raw_exits)?;
    let exits = interleave_exits(joints, active, &raw_exits)?;
    Ok(TransitionPlan {
        exits,
        entries: heapless::Vec::new(),
        next: heapless::Vec::new(),
    })
}

fn push_target<S: Copy + Eq, const N: usize>(
    expanded: &mut heapless::Vec<(S, bool), N>,
    target: S,
    outer: bool,
) -> Result<(), PlanError<S>> {
    if let Some(entry) = expanded.iter_mut().find(|(t, _)| *t == target) {
        entry.1 |= outer;
        return Ok(());
    }
    expanded
        .push((target, outer))
        .map_err(|_| PlanError::Overflow)
}

fn chosen_child<S: Copy + Eq>(chosen: &[(S, S)], parent: S) -> Option<S> {
    chosen
        .iter()
        .find(|(p, _)| *p == parent)
        .map(|(_, child)| *child)
}

/// Grow the next configuration from the top down, recording which nodes are
/// entered. A node is preserved when it is active, outside every re-entered
/// subtree, and its position is not contradicted by a chosen child.
#[allow(clippy::too_many_arguments)]
fn build_next<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
    chosen: &[(S, S)],
    active: &ActiveSet<S, N>,
    reenter: &[S],
    id: S,
    forced_in: bool,
    next: &mut heapless::Vec<S, N>,
    entries: &mut heapless::Vec<S, N>,
) -> Result<(), PlanError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    let forced = forced_in || reenter.contains(&id);
    let entering = forced || !active.is_active(id);
    next.push(id).map_err(|_| PlanError::Overflow)?;
    if entering {
        entries.push(id).map_err(|_| PlanError::Overflow)?;
    }

    let Some(node) = def.node(id) else {
        return Ok(());
    };
    match node.kind {
        StateKind::Simple | StateKind::Joint { .. } => {}
        StateKind::Composite { children } => {
            let preserved = if entering {
                None
            } else {
                children.iter().copied().find(|&c| active.is_active(c))
            };
            let child = chosen_child(chosen, id)
                .or(preserved)
                .or_else(|| children.first().copied());
            if let Some(child) = child {
                build_next(def, chosen, active, reenter, child, forced, next, entries)?;
            }
        }
        StateKind::Parallel { regions, .. } => {
            for &region in regions {
                build_next(def, chosen, active, reenter, region, forced, next, entries)?;
            }
        }
    }
    Ok(())
}

/// Post-order walk of the current active tree collecting every node that is
/// not part of the next configuration, plus everything inside a re-entered
/// subtree.
fn collect_exits<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
    active: &ActiveSet<S, N>,
    next: &[S],
    reenter: &[S],
    id: S,
    forced_in: bool,
    exits: &mut heapless::Vec<S, N>,
) -> Result<(), PlanError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    if !active.is_active(id) {
        return Ok(());
    }
    let forced = forced_in || reenter.contains(&id);

    let Some(node) = def.node(id) else {
        return Ok(());
    };
    match node.kind {
        StateKind::Simple | StateKind::Joint { .. } => {}
        StateKind::Composite { children } => {
            for &child in children {
                collect_exits(def, active, next, reenter, child, forced, exits)?;
            }
        }
        StateKind::Parallel { regions, .. } => {
            for &region in regions {
                collect_exits(def, active, next, reenter, region, forced, exits)?;
            }
        }
    }

    if forced || !next.contains(&id) {
        exits.push(id).map_err(|_| PlanError::Overflow)?;
    }
    Ok(())
}

/// Schedule each deactivating joint immediately before the first of its
/// guards in the exit order; several at one position go in reverse
/// declaration order.
fn interleave_exits<S: Copy + Eq + fmt::Debug, const N: usize>(
    joints: &JointIndex<S, N>,
    active: &ActiveSet<S, N>,
    raw_exits: &[S],
) -> Result<heapless::Vec<PlanStep<S>, N>, PlanError<S>> {
    let entries = joints.entries();
    let mut first_guard_exit: heapless::Vec<Option<usize>, N> = heapless::Vec::new();
    for entry in entries {
        let position = if active.joint_is_active(entry.joint) {
            raw_exits.iter().position(|s| entry.guards.contains(s))
        } else {
            None
        };
        first_guard_exit
            .push(position)
            .map_err(|_| PlanError::Overflow)?;
    }

    let mut out: heapless::Vec<PlanStep<S>, N> = heapless::Vec::new();
    for (index, &state) in raw_exits.iter().enumerate() {
        for (slot, entry) in entries.iter().enumerate().rev() {
            if first_guard_exit[slot] == Some(index) {
                out.push(PlanStep::Joint(entry.joint))
                    .map_err(|_| PlanError::Overflow)?;
            }
        }
        out.push(PlanStep::State(state))
            .map_err(|_| PlanError::Overflow)?;
    }
    Ok(out)
}

/// Schedule each activating joint immediately after the last of its guards in
/// the entry order; several at one position go in forward declaration order.
fn interleave_entries<S: Copy + Eq + fmt::Debug, const N: usize>(
    joints: &JointIndex<S, N>,
    active: &ActiveSet<S, N>,
    exited_joints: &[S],
    raw_entries: &[S],
    next: &[S],
) -> Result<heapless::Vec<PlanStep<S>, N>, PlanError<S>> {
    let entries = joints.entries();
    let mut eligible: heapless::Vec<bool, N> = heapless::Vec::new();
    let mut last_guard_entry: heapless::Vec<Option<usize>, N> = heapless::Vec::new();
    for entry in entries {
        let satisfied_after = entry.guards.iter().all(|g| next.contains(g));
        let inactive_before =
            !active.joint_is_active(entry.joint) || exited_joints.contains(&entry.joint);
        eligible
            .push(satisfied_after && inactive_before)
            .map_err(|_| PlanError::Overflow)?;
        last_guard_entry
            .push(raw_entries.iter().rposition(|s| entry.guards.contains(s)))
            .map_err(|_| PlanError::Overflow)?;
    }

    let mut out: heapless::Vec<PlanStep<S>, N> = heapless::Vec::new();
    for (index, &state) in raw_entries.iter().enumerate() {
        out.push(PlanStep::State(state))
            .map_err(|_| PlanError::Overflow)?;
        for (slot, entry) in entries.iter().enumerate() {
            if eligible[slot] && last_guard_entry[slot] == Some(index) {
                out.push(PlanStep::Joint(entry.joint))
                    .map_err(|_| PlanError::Overflow)?;
            }
        }
    }
    // A joint can only activate when at least one guard just entered, but a
    // stale tracked set must not lose the activation.
    for (slot, entry) in entries.iter().enumerate() {
        if eligible[slot] && last_guard_entry[slot].is_none() {
            out.push(PlanStep::Joint(entry.joint))
                .map_err(|_| PlanError::Overflow)?;
        }
    }
    Ok(out)
}
