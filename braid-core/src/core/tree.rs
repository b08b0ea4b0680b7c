//! The static chart model: node records, handler tables, and the chart
//! definition the engine runs against.
//!
//! A chart is declared as a `const` table, one [`StateNode`] per state, in
//! *declaration order* (the order used to break ties in exit/entry
//! scheduling). Handlers are plain `fn` pointers so the whole table can live
//! in a `const`:
//!
//! ```rust
//! use braid_core::core::{ChartDefinition, Event, Reply, StateKind, StateNode};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Id { Top, Idle, Busy }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Ev { Go }
//! impl Event for Ev {
//!     type Kind = Self;
//!     fn kind(&self) -> Self { *self }
//! }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Rep { Started }
//! impl Reply for Rep {
//!     type Kind = Self;
//!     fn kind(&self) -> Self { *self }
//! }
//!
//! const STATES: &[StateNode<Id, Ev, Rep, ()>] = &[
//!     StateNode {
//!         id: Id::Top,
//!         parent: None,
//!         kind: StateKind::Composite { children: &[Id::Idle, Id::Busy] },
//!         enter: &[],
//!         exit: &[],
//!         on: &[],
//!     },
//!     StateNode::simple(Id::Idle, Id::Top),
//!     StateNode::simple(Id::Busy, Id::Top),
//! ];
//!
//! const CHART: ChartDefinition<Id, Ev, Rep, ()> = ChartDefinition {
//!     name: "doc",
//!     top: Id::Top,
//!     states: STATES,
//!     replies: &[],
//! };
//! ```

use crate::core::event::{Event, Reply};
use crate::core::scope::{ReplyScope, Scope};

/// Enter/exit handler: receives the triggering event (`None` during
/// `initiate`/`terminate`), may reply, may not transit. Returning `false`
/// refuses the event, letting the node's generic handlers run.
pub type EnterExitFn<S, E, R, C> = fn(&mut C, &mut Scope<'_, S, R>, Option<&E>) -> bool;

/// Event handler: receives the event being dispatched, may reply and transit
/// arbitrarily often. Returning `false` refuses the event; a node whose
/// typed handlers all refuse forwards the event outward.
pub type HandleFn<S, E, R, C> = fn(&mut C, &mut Scope<'_, S, R>, &E) -> bool;

/// Chart-level reply handler: receives one reply instance.
pub type ReplyFn<E, R, C> = fn(&mut C, &mut ReplyScope<'_, E, R>, &R);

/// One enter or exit handler registration. `event: None` declares a *generic*
/// handler, run when no typed handler matched (or every typed handler
/// refused).
pub struct EnterExitHandler<S, E: Event, R: Reply, C> {
    pub event: Option<E::Kind>,
    pub run: EnterExitFn<S, E, R, C>,
}

/// One event-handler registration. Event handlers are always typed; several
/// registrations for the same kind on one node form an ordered list and
/// combine by OR over their results.
pub struct EventHandler<S, E: Event, R: Reply, C> {
    pub event: E::Kind,
    pub run: HandleFn<S, E, R, C>,
}

/// One chart-level reply-handler registration.
pub struct ReplyHandler<E: Event, R: Reply, C> {
    pub reply: R::Kind,
    pub run: ReplyFn<E, R, C>,
}

/// What a node is, and the structure it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind<'a, S> {
    /// Leaf; no children.
    Simple,
    /// Ordered children; exactly one active at a time. The first child is the
    /// initial child entered by default.
    Composite { children: &'a [S] },
    /// Region children, all active together, plus the joint states attached
    /// to this parallel.
    Parallel { regions: &'a [S], joints: &'a [S] },
    /// Pseudo-state, active iff every guard node is active. Not a tree child;
    /// attached to exactly one parallel as a joint.
    Joint { guards: &'a [S] },
}

/// One declared state.
pub struct StateNode<'a, S, E: Event, R: Reply, C> {
    pub id: S,
    /// `None` only for the top node. Joints carry the parallel they are
    /// attached to.
    pub parent: Option<S>,
    pub kind: StateKind<'a, S>,
    pub enter: &'a [EnterExitHandler<S, E, R, C>],
    pub exit: &'a [EnterExitHandler<S, E, R, C>],
    pub on: &'a [EventHandler<S, E, R, C>],
}

impl<'a, S, E: Event, R: Reply, C> StateNode<'a, S, E, R, C> {
    /// A simple state with no handlers; the common case in fixtures and
    /// leaf-heavy charts.
    #[must_use]
    pub const fn simple(id: S, parent: S) -> Self {
        StateNode {
            id,
            parent: Some(parent),
            kind: StateKind::Simple,
            enter: &[],
            exit: &[],
            on: &[],
        }
    }
}

/// The complete static description the engine runs against.
pub struct ChartDefinition<'a, S, E: Event, R: Reply, C> {
    /// Chart name, used only in diagnostics.
    pub name: &'a str,
    /// The single top node.
    pub top: S,
    /// Every node, in declaration order.
    pub states: &'a [StateNode<'a, S, E, R, C>],
    /// Chart-level reply handlers, keyed by reply kind.
    pub replies: &'a [ReplyHandler<E, R, C>],
}

impl<'a, S: Copy + PartialEq, E: Event, R: Reply, C> ChartDefinition<'a, S, E, R, C> {
    /// Look up a node by identity.
    #[must_use]
    pub fn node(&self, id: S) -> Option<&StateNode<'a, S, E, R, C>> {
        self.states.iter().find(|n| n.id == id)
    }

    /// Declaration-order index of a node.
    #[must_use]
    pub fn index_of(&self, id: S) -> Option<usize> {
        self.states.iter().position(|n| n.id == id)
    }

    /// Iterate the joint states in declaration order.
    pub fn joints(&self) -> impl Iterator<Item = &StateNode<'a, S, E, R, C>> {
        self.states
            .iter()
            .filter(|n| matches!(n.kind, StateKind::Joint { .. }))
    }

    /// Path from `id` up to the top node, `id` first. Bounded by the state
    /// count so a malformed parent chain cannot loop.
    pub(crate) fn path_to_top<const N: usize>(&self, id: S) -> heapless::Vec<S, N> {
        let mut path = heapless::Vec::new();
        let mut cursor = Some(id);
        for _ in 0..=self.states.len() {
            let Some(current) = cursor else { break };
            if path.push(current).is_err() {
                break;
            }
            cursor = self.node(current).and_then(|n| n.parent);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Id {
        Top,
        A,
        B,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ev {
        Tick,
    }
    impl Event for Ev {
        type Kind = Self;
        fn kind(&self) -> Self {
            *self
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Rep {
        Done,
    }
    impl Reply for Rep {
        type Kind = Self;
        fn kind(&self) -> Self {
            *self
        }
    }

    const STATES: &[StateNode<Id, Ev, Rep, ()>] = &[
        StateNode {
            id: Id::Top,
            parent: None,
            kind: StateKind::Composite {
                children: &[Id::A, Id::B],
            },
            enter: &[],
            exit: &[],
            on: &[],
        },
        StateNode::simple(Id::A, Id::Top),
        StateNode::simple(Id::B, Id::Top),
    ];

    const CHART: ChartDefinition<Id, Ev, Rep, ()> = ChartDefinition {
        name: "tree-tests",
        top: Id::Top,
        states: STATES,
        replies: &[],
    };

    #[test]
    fn lookup_and_declaration_order() {
        assert_eq!(CHART.index_of(Id::A), Some(1));
        assert!(CHART.node(Id::B).is_some());
        assert_eq!(CHART.joints().count(), 0);
    }

    #[test]
    fn path_walks_to_the_top() {
        let path: heapless::Vec<Id, 8> = CHART.path_to_top(Id::B);
        assert_eq!(path.as_slice(), &[Id::B, Id::Top]);
    }
}
