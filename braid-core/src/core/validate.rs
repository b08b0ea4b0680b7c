//! Construction-time validation of a [`ChartDefinition`].
//!
//! Runs once in [`StateChart::new`]; a chart that validates cannot fault
//! structurally at runtime, which is what lets the planner index into child
//! lists without checking.
//!
//! [`StateChart::new`]: crate::core::StateChart::new

use core::fmt;

use crate::core::event::{Event, Reply};
use crate::core::tree::{ChartDefinition, StateKind};

/// Why a chart definition was rejected. Fatal: the engine is not constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError<S> {
    /// More states declared than the engine's `N` capacity.
    CapacityExceeded { states: usize, capacity: usize },
    /// Two nodes share an identity.
    DuplicateState(S),
    /// `top` names no declared node.
    MissingTop(S),
    /// The top node carries a parent link.
    TopHasParent(S),
    /// A non-top node has no parent link.
    OrphanState(S),
    /// A child/region/joint list entry names no declared node.
    UnknownChild { parent: S, child: S },
    /// A node's parent link disagrees with the list that names it.
    ParentMismatch { parent: S, child: S },
    /// A composite with no children.
    EmptyComposite(S),
    /// A parallel with no regions.
    EmptyParallel(S),
    /// A joint listed as a composite child or parallel region.
    JointAsChild { parent: S, child: S },
    /// A parallel's joint list names a non-joint node.
    NotAJoint { parallel: S, state: S },
    /// A joint listed by no parallel.
    UnattachedJoint(S),
    /// A joint listed by more than one parallel.
    SharedJoint(S),
    /// A node the top state cannot reach.
    Unreachable(S),
    /// A joint with no guards.
    EmptyJoint(S),
    /// A guard reference that names no declared node.
    UnknownGuard { joint: S, guard: S },
    /// A joint is (transitively) its own guard.
    GuardCycle(S),
    /// Two guards of one joint can never be active at the same time.
    IncompatibleGuards { joint: S, first: S, second: S },
}

impl<S: fmt::Debug> fmt::Display for ConfigError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::CapacityExceeded { states, capacity } => {
                write!(f, "{states} states exceed the chart capacity of {capacity}")
            }
            ConfigError::DuplicateState(id) => write!(f, "duplicate state {id:?}"),
            ConfigError::MissingTop(id) => write!(f, "top state {id:?} is not declared"),
            ConfigError::TopHasParent(id) => write!(f, "top state {id:?} has a parent"),
            ConfigError::OrphanState(id) => write!(f, "state {id:?} has no parent"),
            ConfigError::UnknownChild { parent, child } => {
                write!(f, "{parent:?} references undeclared child {child:?}")
            }
            ConfigError::ParentMismatch { parent, child } => {
                write!(f, "{child:?} is listed by {parent:?} but links another parent")
            }
            ConfigError::EmptyComposite(id) => write!(f, "composite {id:?} has no children"),
            ConfigError::EmptyParallel(id) => write!(f, "parallel {id:?} has no regions"),
            ConfigError::JointAsChild { parent, child } => {
                write!(f, "joint {child:?} cannot be a tree child of {parent:?}")
            }
            ConfigError::NotAJoint { parallel, state } => {
                write!(f, "{state:?} in the joint list of {parallel:?} is not a joint")
            }
            ConfigError::UnattachedJoint(id) => {
                write!(f, "joint {id:?} is not attached to a parallel")
            }
            ConfigError::SharedJoint(id) => {
                write!(f, "joint {id:?} is attached to more than one parallel")
            }
            ConfigError::Unreachable(id) => write!(f, "state {id:?} is unreachable from the top"),
            ConfigError::EmptyJoint(id) => write!(f, "joint {id:?} has no guards"),
            ConfigError::UnknownGuard { joint, guard } => {
                write!(f, "joint {joint:?} references undeclared guard {guard:?}")
            }
            ConfigError::GuardCycle(id) => write!(f, "joint {id:?} is transitively its own guard"),
            ConfigError::IncompatibleGuards { joint, first, second } => {
                write!(
                    f,
                    "guards {first:?} and {second:?} of joint {joint:?} can never be active together"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl<S: fmt::Debug> std::error::Error for ConfigError<S> {}

/// Validate every invariant over the declared tree.
pub(crate) fn validate<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
) -> Result<(), ConfigError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    if def.states.len() > N {
        return Err(ConfigError::CapacityExceeded {
            states: def.states.len(),
            capacity: N,
        });
    }

    for (index, node) in def.states.iter().enumerate() {
        if def.states[..index].iter().any(|n| n.id == node.id) {
            return Err(ConfigError::DuplicateState(node.id));
        }
    }

    let Some(top) = def.node(def.top) else {
        return Err(ConfigError::MissingTop(def.top));
    };
    if top.parent.is_some() {
        return Err(ConfigError::TopHasParent(def.top));
    }

    for node in def.states {
        if node.parent.is_none() && node.id != def.top {
            return Err(ConfigError::OrphanState(node.id));
        }
        match node.kind {
            StateKind::Simple => {}
            StateKind::Composite { children } => {
                if children.is_empty() {
                    return Err(ConfigError::EmptyComposite(node.id));
                }
                check_child_links(def, node.id, children)?;
            }
            StateKind::Parallel { regions, joints } => {
                if regions.is_empty() {
                    return Err(ConfigError::EmptyParallel(node.id));
                }
                check_child_links(def, node.id, regions)?;
                for (index, &joint) in joints.iter().enumerate() {
                    if joints[..index].contains(&joint) {
                        return Err(ConfigError::DuplicateState(joint));
                    }
                    let Some(j) = def.node(joint) else {
                        return Err(ConfigError::UnknownChild {
                            parent: node.id,
                            child: joint,
                        });
                    };
                    if !matches!(j.kind, StateKind::Joint { .. }) {
                        return Err(ConfigError::NotAJoint {
                            parallel: node.id,
                            state: joint,
                        });
                    }
                    if j.parent != Some(node.id) {
                        return Err(ConfigError::ParentMismatch {
                            parent: node.id,
                            child: joint,
                        });
                    }
                }
            }
            StateKind::Joint { guards } => {
                if guards.is_empty() {
                    return Err(ConfigError::EmptyJoint(node.id));
                }
            }
        }
    }

    check_joint_attachment(def)?;
    check_reachability::<S, E, R, C, N>(def)?;

    for joint in def.joints() {
        let guards = flatten_guards::<S, E, R, C, N>(def, joint.id)?;
        check_guard_compatibility::<S, E, R, C, N>(def, joint.id, &guards)?;
    }

    Ok(())
}

fn check_child_links<S, E, R, C>(
    def: &ChartDefinition<'_, S, E, R, C>,
    parent: S,
    children: &[S],
) -> Result<(), ConfigError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    for (index, &child) in children.iter().enumerate() {
        if children[..index].contains(&child) {
            return Err(ConfigError::DuplicateState(child));
        }
        let Some(node) = def.node(child) else {
            return Err(ConfigError::UnknownChild { parent, child });
        };
        if matches!(node.kind, StateKind::Joint { .. }) {
            return Err(ConfigError::JointAsChild { parent, child });
        }
        if node.parent != Some(parent) {
            return Err(ConfigError::ParentMismatch { parent, child });
        }
    }
    Ok(())
}

/// Every declared node must be reachable from the top through child, region,
/// and joint lists; together with the parent-link checks this rules out
/// cycles and sharing.
fn check_reachability<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
) -> Result<(), ConfigError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    let mut visited: heapless::Vec<S, N> = heapless::Vec::new();
    let mut stack: heapless::Vec<S, N> = heapless::Vec::new();
    let _ = stack.push(def.top);

    while let Some(id) = stack.pop() {
        if visited.contains(&id) {
            continue;
        }
        let _ = visited.push(id);
        let Some(node) = def.node(id) else { continue };
        match node.kind {
            StateKind::Simple | StateKind::Joint { .. } => {}
            StateKind::Composite { children } => {
                for &c in children {
                    let _ = stack.push(c);
                }
            }
            StateKind::Parallel { regions, joints } => {
                for &r in regions {
                    let _ = stack.push(r);
                }
                for &j in joints {
                    let _ = stack.push(j);
                }
            }
        }
    }

    match def.states.iter().find(|n| !visited.contains(&n.id)) {
        Some(node) => Err(ConfigError::Unreachable(node.id)),
        None => Ok(()),
    }
}

fn check_joint_attachment<S, E, R, C>(
    def: &ChartDefinition<'_, S, E, R, C>,
) -> Result<(), ConfigError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    for joint in def.joints() {
        let mut listed = 0usize;
        for node in def.states {
            if let StateKind::Parallel { joints, .. } = node.kind {
                listed += joints.iter().filter(|&&j| j == joint.id).count();
            }
        }
        match listed {
            0 => return Err(ConfigError::UnattachedJoint(joint.id)),
            1 => {}
            _ => return Err(ConfigError::SharedJoint(joint.id)),
        }
    }
    Ok(())
}

/// Resolve a joint's guard set to concrete (non-joint) nodes. Guards naming
/// other joints are replaced by those joints' guards, transitively; a joint
/// reached twice on one chain is a cycle.
pub(crate) fn flatten_guards<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
    joint: S,
) -> Result<heapless::Vec<S, N>, ConfigError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    let mut visiting: heapless::Vec<S, N> = heapless::Vec::new();
    let mut out: heapless::Vec<S, N> = heapless::Vec::new();
    visiting
        .push(joint)
        .map_err(|_| ConfigError::GuardCycle(joint))?;
    flatten_into(def, joint, &mut visiting, &mut out)?;
    Ok(out)
}

fn flatten_into<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
    joint: S,
    visiting: &mut heapless::Vec<S, N>,
    out: &mut heapless::Vec<S, N>,
) -> Result<(), ConfigError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    let guards = match def.node(joint).map(|n| &n.kind) {
        Some(StateKind::Joint { guards }) => *guards,
        _ => return Ok(()),
    };
    for &guard in guards {
        let Some(node) = def.node(guard) else {
            return Err(ConfigError::UnknownGuard { joint, guard });
        };
        if matches!(node.kind, StateKind::Joint { .. }) {
            if visiting.contains(&guard) {
                return Err(ConfigError::GuardCycle(guard));
            }
            visiting
                .push(guard)
                .map_err(|_| ConfigError::GuardCycle(guard))?;
            flatten_into(def, guard, visiting, out)?;
            visiting.pop();
        } else if !out.contains(&guard) {
            out.push(guard).map_err(|_| ConfigError::CapacityExceeded {
                states: def.states.len(),
                capacity: N,
            })?;
        }
    }
    Ok(())
}

/// Two guards are incompatible if their paths to the top diverge at a
/// composite: the composite can only hold one of the two branches active.
fn check_guard_compatibility<S, E, R, C, const N: usize>(
    def: &ChartDefinition<'_, S, E, R, C>,
    joint: S,
    guards: &[S],
) -> Result<(), ConfigError<S>>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    for (index, &first) in guards.iter().enumerate() {
        for &second in &guards[index + 1..] {
            let mut path_a: heapless::Vec<S, N> = def.path_to_top(first);
            let mut path_b: heapless::Vec<S, N> = def.path_to_top(second);
            path_a.reverse();
            path_b.reverse();

            let shared = path_a
                .iter()
                .zip(path_b.iter())
                .take_while(|(a, b)| a == b)
                .count();
            // One path being a prefix of the other means ancestor/descendant,
            // which is always co-activatable.
            if shared == path_a.len() || shared == path_b.len() {
                continue;
            }
            let fork = path_a[shared - 1];
            if matches!(def.node(fork).map(|n| &n.kind), Some(StateKind::Composite { .. })) {
                return Err(ConfigError::IncompatibleGuards {
                    joint,
                    first,
                    second,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::StateNode;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Id {
        Top,
        R1,
        X1,
        X2,
        R2,
        Y1,
        Y2,
        J,
        K,
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

    type Node = StateNode<'static, Id, Ev, Rep, ()>;
    type Chart = ChartDefinition<'static, Id, Ev, Rep, ()>;

    const fn composite(id: Id, parent: Option<Id>, children: &'static [Id]) -> Node {
        StateNode {
            id,
            parent,
            kind: StateKind::Composite { children },
            enter: &[],
            exit: &[],
            on: &[],
        }
    }

    const fn joint(id: Id, parent: Id, guards: &'static [Id]) -> Node {
        StateNode {
            id,
            parent: Some(parent),
            kind: StateKind::Joint { guards },
            enter: &[],
            exit: &[],
            on: &[],
        }
    }

    const VALID: Chart = ChartDefinition {
        name: "valid",
        top: Id::Top,
        states: &[
            StateNode {
                id: Id::Top,
                parent: None,
                kind: StateKind::Parallel {
                    regions: &[Id::R1, Id::R2],
                    joints: &[Id::J],
                },
                enter: &[],
                exit: &[],
                on: &[],
            },
            composite(Id::R1, Some(Id::Top), &[Id::X1, Id::X2]),
            StateNode::simple(Id::X1, Id::R1),
            StateNode::simple(Id::X2, Id::R1),
            composite(Id::R2, Some(Id::Top), &[Id::Y1, Id::Y2]),
            StateNode::simple(Id::Y1, Id::R2),
            StateNode::simple(Id::Y2, Id::R2),
            joint(Id::J, Id::Top, &[Id::X1, Id::Y1]),
        ],
        replies: &[],
    };

    #[test]
    fn valid_chart_passes() {
        assert_eq!(validate::<_, _, _, _, 16>(&VALID), Ok(()));
    }

    #[test]
    fn capacity_is_enforced() {
        assert_eq!(
            validate::<_, _, _, _, 4>(&VALID),
            Err(ConfigError::CapacityExceeded {
                states: 8,
                capacity: 4
            })
        );
    }

    #[test]
    fn empty_composite_is_rejected() {
        const CHART: Chart = ChartDefinition {
            name: "empty",
            top: Id::Top,
            states: &[composite(Id::Top, None, &[])],
            replies: &[],
        };
        assert_eq!(
            validate::<_, _, _, _, 16>(&CHART),
            Err(ConfigError::EmptyComposite(Id::Top))
        );
    }

    #[test]
    fn parent_mismatch_is_rejected() {
        const CHART: Chart = ChartDefinition {
            name: "mismatch",
            top: Id::Top,
            states: &[
                composite(Id::Top, None, &[Id::X1]),
                // X1 claims a different parent than the list that names it.
                StateNode::simple(Id::X1, Id::R1),
            ],
            replies: &[],
        };
        assert_eq!(
            validate::<_, _, _, _, 16>(&CHART),
            Err(ConfigError::ParentMismatch {
                parent: Id::Top,
                child: Id::X1
            })
        );
    }

    #[test]
    fn incompatible_guards_are_rejected() {
        // X1 and X2 are siblings under the composite R1: never both active.
        const CHART: Chart = ChartDefinition {
            name: "incompatible",
            top: Id::Top,
            states: &[
                StateNode {
                    id: Id::Top,
                    parent: None,
                    kind: StateKind::Parallel {
                        regions: &[Id::R1],
                        joints: &[Id::J],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
                composite(Id::R1, Some(Id::Top), &[Id::X1, Id::X2]),
                StateNode::simple(Id::X1, Id::R1),
                StateNode::simple(Id::X2, Id::R1),
                joint(Id::J, Id::Top, &[Id::X1, Id::X2]),
            ],
            replies: &[],
        };
        assert_eq!(
            validate::<_, _, _, _, 16>(&CHART),
            Err(ConfigError::IncompatibleGuards {
                joint: Id::J,
                first: Id::X1,
                second: Id::X2
            })
        );
    }

    #[test]
    fn guard_cycles_are_rejected() {
        const CHART: Chart = ChartDefinition {
            name: "cycle",
            top: Id::Top,
            states: &[
                StateNode {
                    id: Id::Top,
                    parent: None,
                    kind: StateKind::Parallel {
                        regions: &[Id::R1, Id::R2],
                        joints: &[Id::J, Id::K],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
                composite(Id::R1, Some(Id::Top), &[Id::X1]),
                StateNode::simple(Id::X1, Id::R1),
                composite(Id::R2, Some(Id::Top), &[Id::Y1]),
                StateNode::simple(Id::Y1, Id::R2),
                joint(Id::J, Id::Top, &[Id::X1, Id::K]),
                joint(Id::K, Id::Top, &[Id::Y1, Id::J]),
            ],
            replies: &[],
        };
        assert_eq!(
            validate::<_, _, _, _, 16>(&CHART),
            Err(ConfigError::GuardCycle(Id::J))
        );
    }

    #[test]
    fn joints_flatten_through_other_joints() {
        const CHART: Chart = ChartDefinition {
            name: "nested",
            top: Id::Top,
            states: &[
                StateNode {
                    id: Id::Top,
                    parent: None,
                    kind: StateKind::Parallel {
                        regions: &[Id::R1, Id::R2],
                        joints: &[Id::J, Id::K],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
                composite(Id::R1, Some(Id::Top), &[Id::X1]),
                StateNode::simple(Id::X1, Id::R1),
                composite(Id::R2, Some(Id::Top), &[Id::Y1]),
                StateNode::simple(Id::Y1, Id::R2),
                joint(Id::J, Id::Top, &[Id::X1]),
                joint(Id::K, Id::Top, &[Id::J, Id::Y1]),
            ],
            replies: &[],
        };
        assert_eq!(validate::<_, _, _, _, 16>(&CHART), Ok(()));
        let guards = flatten_guards::<_, _, _, _, 16>(&CHART, Id::K).unwrap();
        assert_eq!(guards.as_slice(), &[Id::X1, Id::Y1]);
    }

    #[test]
    fn unattached_joint_is_rejected() {
        const CHART: Chart = ChartDefinition {
            name: "unattached",
            top: Id::Top,
            states: &[
                StateNode {
                    id: Id::Top,
                    parent: None,
                    kind: StateKind::Parallel {
                        regions: &[Id::R1],
                        joints: &[],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
                composite(Id::R1, Some(Id::Top), &[Id::X1]),
                StateNode::simple(Id::X1, Id::R1),
                joint(Id::J, Id::Top, &[Id::X1]),
            ],
            replies: &[],
        };
        assert_eq!(
            validate::<_, _, _, _, 16>(&CHART),
            Err(ConfigError::UnattachedJoint(Id::J))
        );
    }
}
