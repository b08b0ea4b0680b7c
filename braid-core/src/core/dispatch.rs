//! Event propagation across the active tree.
//!
//! Inner states get first refusal: the walk recurses into active children
//! before consulting a node's own handlers, and a node whose children handled
//! the event never runs its own. Joints attached to a parallel are consulted
//! after the regions and before the parallel itself.

use core::fmt;

use crate::core::active::ActiveSet;
use crate::core::event::{Event, Reply};
use crate::core::scope::Scope;
use crate::core::tree::{ChartDefinition, StateKind};

/// Dispatch `event` to the subtree rooted at `id`. Returns whether any node
/// in the subtree handled it.
pub(crate) fn dispatch_event<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
    active: &ActiveSet<S, N>,
    id: S,
    context: &mut C,
    scope: &mut Scope<'_, S, R>,
    event: &E,
) -> bool
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    let Some(node) = def.node(id) else {
        return false;
    };

    let mut children_handled = false;
    match node.kind {
        StateKind::Simple | StateKind::Joint { .. } => {}
        StateKind::Composite { children } => {
            if let Some(child) = children.iter().copied().find(|&c| active.is_active(c)) {
                children_handled = dispatch_event(def, active, child, context, scope, event);
            }
        }
        StateKind::Parallel { regions, joints } => {
            for region in regions.iter().copied() {
                if active.is_active(region) {
                    children_handled |= dispatch_event(def, active, region, context, scope, event);
                }
            }
            for joint in joints.iter().copied() {
                if active.joint_is_active(joint) {
                    children_handled |= run_typed_handlers(def, joint, context, scope, event);
                }
            }
        }
    }

    if children_handled {
        return true;
    }
    run_typed_handlers(def, id, context, scope, event)
}

/// Run every typed handler registered on `id` for the event's kind. The
/// node's handled-ness is the OR over its handlers: it forwards the event
/// only if every handler refused (or none matched).
pub(crate) fn run_typed_handlers<S, E, R, C>(
    def: &ChartDefinition<'_, S, E, R, C>,
    id: S,
    context: &mut C,
    scope: &mut Scope<'_, S, R>,
    event: &E,
) -> bool
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    let Some(node) = def.node(id) else {
        return false;
    };
    let kind = event.kind();
    let mut selected = false;
    let mut handled = false;
    for handler in node.on.iter().filter(|h| h.event == kind) {
        selected = true;
        if (handler.run)(context, scope, event) {
            handled = true;
        }
    }
    selected && handled
}
