//! The mutable configuration: which tree nodes and which joints are active.
//!
//! Mutation is reserved for the engine during plan execution; handlers only
//! ever observe the configuration through [`StateChart`] accessors.
//!
//! [`StateChart`]: crate::core::StateChart

use core::fmt;

use crate::core::event::{Event, Reply};
use crate::core::tree::ChartDefinition;
use crate::core::validate::{flatten_guards, ConfigError};

/// The set of currently active nodes and joints.
#[derive(Debug, Clone)]
pub(crate) struct ActiveSet<S, const N: usize> {
    states: heapless::Vec<S, N>,
    joints: heapless::Vec<S, N>,
}

impl<S: Copy + Eq, const N: usize> ActiveSet<S, N> {
    pub(crate) const fn new() -> Self {
        ActiveSet {
            states: heapless::Vec::new(),
            joints: heapless::Vec::new(),
        }
    }

    pub(crate) fn is_active(&self, id: S) -> bool {
        self.states.contains(&id)
    }

    pub(crate) fn joint_is_active(&self, id: S) -> bool {
        self.joints.contains(&id)
    }

    pub(crate) fn states(&self) -> &[S] {
        &self.states
    }

    pub(crate) fn joints(&self) -> &[S] {
        &self.joints
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Idempotent; capacity is guaranteed by construction-time validation
    /// (`states.len() <= N`).
    pub(crate) fn activate(&mut self, id: S) {
        if !self.states.contains(&id) {
            let _ = self.states.push(id);
        }
    }

    pub(crate) fn deactivate(&mut self, id: S) {
        if let Some(index) = self.states.iter().position(|s| *s == id) {
            self.states.swap_remove(index);
        }
    }

    pub(crate) fn activate_joint(&mut self, id: S) {
        if !self.joints.contains(&id) {
            let _ = self.joints.push(id);
        }
    }

    pub(crate) fn deactivate_joint(&mut self, id: S) {
        if let Some(index) = self.joints.iter().position(|s| *s == id) {
            self.joints.swap_remove(index);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.states.clear();
        self.joints.clear();
    }
}

/// Per-joint flattened guard sets, built once at construction so joint
/// activation is a slice scan at runtime. Declaration order is preserved;
/// the planner and `recompute` rely on it for deterministic ordering.
#[derive(Debug)]
pub(crate) struct JointIndex<S, const N: usize> {
    entries: heapless::Vec<JointGuards<S, N>, N>,
}

#[derive(Debug)]
pub(crate) struct JointGuards<S, const N: usize> {
    pub(crate) joint: S,
    pub(crate) guards: heapless::Vec<S, N>,
}

impl<S: Copy + Eq + fmt::Debug, const N: usize> JointIndex<S, N> {
    pub(crate) fn build<E, R, C>(
        def: &ChartDefinition<'_, S, E, R, C>,
    ) -> Result<Self, ConfigError<S>>
    where
        E: Event,
        R: Reply,
    {
        let mut entries = heapless::Vec::new();
        for joint in def.joints() {
            let guards = flatten_guards::<S, E, R, C, N>(def, joint.id)?;
            entries
                .push(JointGuards {
                    joint: joint.id,
                    guards,
                })
                .map_err(|_| ConfigError::CapacityExceeded {
                    states: def.states.len(),
                    capacity: N,
                })?;
        }
        Ok(JointIndex { entries })
    }

    /// Joints in declaration order.
    pub(crate) fn entries(&self) -> &[JointGuards<S, N>] {
        &self.entries
    }

    pub(crate) fn guards_of(&self, joint: S) -> &[S] {
        self.entries
            .iter()
            .find(|e| e.joint == joint)
            .map_or(&[], |e| e.guards.as_slice())
    }

    pub(crate) fn is_satisfied(&self, joint: S, active: &ActiveSet<S, N>) -> bool {
        self.guards_of(joint).iter().all(|&g| active.is_active(g))
    }

    /// Compare derived joint activity against the tracked set. Returns
    /// `(newly_inactive, newly_active)`; newly inactive in reverse
    /// declaration order, newly active in forward declaration order, which is
    /// the order their exit/entry handlers fire in.
    pub(crate) fn recompute(
        &self,
        active: &ActiveSet<S, N>,
    ) -> (heapless::Vec<S, N>, heapless::Vec<S, N>) {
        let mut newly_inactive = heapless::Vec::new();
        let mut newly_active = heapless::Vec::new();
        for entry in self.entries.iter().rev() {
            if active.joint_is_active(entry.joint) && !self.is_satisfied(entry.joint, active) {
                let _ = newly_inactive.push(entry.joint);
            }
        }
        for entry in &self.entries {
            if !active.joint_is_active(entry.joint) && self.is_satisfied(entry.joint, active) {
                let _ = newly_active.push(entry.joint);
            }
        }
        (newly_inactive, newly_active)
    }
}
