//! The event-processing engine.
//!
//! One event is fully resolved before the next begins: handlers fire, the
//! planner collapses the requested transits into one atomic transition, exits
//! run, buffered replies flush, entries run, and only then is the reentrancy
//! queue drained. The engine holds no locks and has no suspension points; the
//! host serializes calls.

use core::fmt;
use core::mem;

use heapless::{Deque, Vec};

use crate::core::active::{ActiveSet, JointIndex};
use crate::core::diagnostics::{ChartHooks, DefaultHooks};
use crate::core::dispatch;
use crate::core::event::{Event, Reply};
use crate::core::plan::{plan_terminate, plan_transition, PlanError, PlanStep};
use crate::core::scope::{OverflowFlags, Phase, ReplyScope, Scope};
use crate::core::tree::{ChartDefinition, EnterExitFn, EnterExitHandler, StateKind};
use crate::core::validate::{validate, ConfigError};
use crate::core::{MAX_ACTIVE_REGIONS, MAX_PENDING_REPLIES, MAX_PENDING_TRANSITS, MAX_QUEUED_EVENTS};

/// What [`StateChart::process`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// The event ran to completion (including any reentrant events it
    /// queued).
    Processed,
    /// An event was already in flight; this one joined the FIFO queue and
    /// will be processed before the outer `process` call returns.
    Enqueued,
    /// The reentrancy queue was full; the event was dropped and reported.
    Dropped,
    /// The chart is not initiated; the event was dropped and reported.
    NotInitiated,
}

/// A running state chart: one static [`ChartDefinition`] plus the mutable
/// configuration, context, and diagnostics hooks.
///
/// `N` is the chart capacity: the maximum number of declared states
/// (validated at construction), which sizes the active set and the planner's
/// scratch space.
pub struct StateChart<'a, S, E, R, C, H, const N: usize>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    definition: &'a ChartDefinition<'a, S, E, R, C>,
    context: C,
    hooks: H,
    joints: JointIndex<S, N>,
    active: ActiveSet<S, N>,
    event_queue: Deque<E, MAX_QUEUED_EVENTS>,
    pending_transits: Vec<S, MAX_PENDING_TRANSITS>,
    rejected_transits: Vec<S, MAX_PENDING_TRANSITS>,
    pending_replies: Deque<R, MAX_PENDING_REPLIES>,
    overflow: OverflowFlags,
    processing: bool,
    initiated: bool,
}

impl<'a, S, E, R, C, const N: usize> StateChart<'a, S, E, R, C, DefaultHooks, N>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
{
    /// Validate `definition` and construct an engine with [`DefaultHooks`].
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the declared tree violates a structural
    /// invariant; the engine is not constructed.
    pub fn new(
        definition: &'a ChartDefinition<'a, S, E, R, C>,
        context: C,
    ) -> Result<Self, ConfigError<S>> {
        StateChart::with_hooks(definition, context, DefaultHooks)
    }
}

impl<'a, S, E, R, C, H, const N: usize> StateChart<'a, S, E, R, C, H, N>
where
    S: Copy + Eq + fmt::Debug,
    E: Event,
    R: Reply,
    H: ChartHooks<S, E, R>,
{
    /// Validate `definition` and construct an engine with the given hooks.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the declared tree violates a structural
    /// invariant; the engine is not constructed.
    pub fn with_hooks(
        definition: &'a ChartDefinition<'a, S, E, R, C>,
        context: C,
        hooks: H,
    ) -> Result<Self, ConfigError<S>> {
        validate::<S, E, R, C, N>(definition)?;
        let joints = JointIndex::build(definition)?;
        Ok(StateChart {
            definition,
            context,
            hooks,
            joints,
            active: ActiveSet::new(),
            event_queue: Deque::new(),
            pending_transits: Vec::new(),
            rejected_transits: Vec::new(),
            pending_replies: Deque::new(),
            overflow: OverflowFlags::default(),
            processing: false,
            initiated: false,
        })
    }

    /// Activate the top state and run the full default-entry cascade.
    ///
    /// Entry replies are dispatched immediately; events queued by their reply
    /// handlers are drained before this returns. Calling `initiate` on an
    /// already initiated chart reports an error and changes nothing.
    pub fn initiate(&mut self) {
        if self.initiated {
            self.hooks
                .report_error(format_args!("initiate on an already initiated chart"));
            return;
        }
        self.initiated = true;
        self.processing = true;
        match plan_transition(self.definition, &self.joints, &self.active, &[self.definition.top])
        {
            Ok(plan) => {
                self.execute_entries(&plan.entries, None);
                self.debug_check_joints();
            }
            // Unreachable on a validated definition.
            Err(_) => self
                .hooks
                .report_error(format_args!("initiation could not be planned")),
        }
        self.hooks.report_initiated();
        self.drain_event_queue();
        self.processing = false;
    }

    /// Exit every active state and return the chart to the empty
    /// configuration. Queued events are discarded.
    pub fn terminate(&mut self) {
        if self.initiated && !self.active.is_empty() {
            self.processing = true;
            match plan_terminate(self.definition, &self.joints, &self.active) {
                Ok(plan) => self.execute_exits(&plan.exits, None),
                Err(_) => self
                    .hooks
                    .report_error(format_args!("termination could not be planned")),
            }
            self.processing = false;
        }
        self.active.clear();
        while self.event_queue.pop_front().is_some() {}
        while self.pending_replies.pop_front().is_some() {}
        self.pending_transits.clear();
        self.rejected_transits.clear();
        self.overflow.clear();
        self.initiated = false;
        self.hooks.report_terminated();
    }

    /// Inject an event.
    ///
    /// Runs the whole per-event pipeline to completion, or enqueues the event
    /// if one is already in flight (the reply-handler reentrancy path).
    pub fn process(&mut self, event: E) -> ProcessResult {
        if !self.initiated {
            self.hooks.report_not_initiated();
            return ProcessResult::NotInitiated;
        }
        if self.processing {
            return if self.event_queue.push_back(event).is_ok() {
                ProcessResult::Enqueued
            } else {
                self.hooks
                    .report_error(format_args!("event queue overflow; event dropped"));
                ProcessResult::Dropped
            };
        }
        self.processing = true;
        self.run_event(&event);
        self.drain_event_queue();
        self.processing = false;
        ProcessResult::Processed
    }

    /// The active leaf states, one per simultaneously active region.
    #[must_use]
    pub fn state(&self) -> heapless::Vec<S, MAX_ACTIVE_REGIONS> {
        let mut leaves = heapless::Vec::new();
        self.collect_leaves(self.definition.top, &mut leaves);
        leaves
    }

    /// Whether `id` is in the active configuration (tree nodes only; joints
    /// are reported by [`Self::active_joints`]).
    #[must_use]
    pub fn is_active(&self, id: S) -> bool {
        self.active.is_active(id)
    }

    /// Every active tree node, in activation order.
    #[must_use]
    pub fn active_states(&self) -> &[S] {
        self.active.states()
    }

    /// Every active joint.
    #[must_use]
    pub fn active_joints(&self) -> &[S] {
        self.active.joints()
    }

    /// Whether `initiate` has run (and `terminate` has not).
    #[must_use]
    pub fn is_initiated(&self) -> bool {
        self.initiated
    }

    #[must_use]
    pub fn definition(&self) -> &'a ChartDefinition<'a, S, E, R, C> {
        self.definition
    }

    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    fn drain_event_queue(&mut self) {
        while let Some(event) = self.event_queue.pop_front() {
            self.run_event(&event);
        }
    }

    /// The per-event pipeline: dispatch, decide, transition, finish.
    fn run_event(&mut self, event: &E) {
        crate::trace!(
            "[EVENT] {:?} received by chart {}",
            event,
            self.definition.name
        );
        let handled = {
            let mut scope = Scope {
                phase: Phase::Handle,
                transits: &mut self.pending_transits,
                rejected: &mut self.rejected_transits,
                replies: &mut self.pending_replies,
                overflow: &mut self.overflow,
            };
            dispatch::dispatch_event(
                self.definition,
                &self.active,
                self.definition.top,
                &mut self.context,
                &mut scope,
                event,
            )
        };
        self.report_overflow();
        if !handled {
            self.hooks.report_unprocessed_event(event);
        }

        if self.pending_transits.is_empty() {
            let mut buffered = mem::replace(&mut self.pending_replies, Deque::new());
            self.flush_replies(&mut buffered);
            self.hooks.report_event_finished(event);
            return;
        }

        let targets = mem::replace(&mut self.pending_transits, Vec::new());
        self.hooks.report_transitions(&targets);
        match plan_transition(self.definition, &self.joints, &self.active, &targets) {
            Ok(plan) => {
                crate::trace!(
                    "[TRANSITION] {} exits, {} entries",
                    plan.exits.len(),
                    plan.entries.len()
                );
                let mut buffered = mem::replace(&mut self.pending_replies, Deque::new());
                self.execute_exits(&plan.exits, Some(event));
                self.flush_replies(&mut buffered);
                self.execute_entries(&plan.entries, Some(event));
                debug_assert!(
                    plan.next.len() == self.active.states().len()
                        && plan.next.iter().all(|&id| self.active.is_active(id)),
                    "executed transition diverged from the planned configuration"
                );
                self.debug_check_joints();
            }
            Err(error) => {
                // The configuration is unchanged; collected replies still
                // reach the host.
                match error {
                    PlanError::UnknownTarget(target) | PlanError::Conflict(target) => {
                        self.hooks.report_transition_error(&target);
                    }
                    PlanError::Overflow => self
                        .hooks
                        .report_error(format_args!("transition plan overflow")),
                }
                let mut buffered = mem::replace(&mut self.pending_replies, Deque::new());
                self.flush_replies(&mut buffered);
            }
        }
        self.hooks.report_event_finished(event);
    }

    fn execute_exits(&mut self, steps: &[PlanStep<S>], event: Option<&E>) {
        for &step in steps {
            match step {
                PlanStep::Joint(id) => {
                    self.run_exit_handlers(id, event);
                    self.active.deactivate_joint(id);
                }
                PlanStep::State(id) => {
                    self.run_exit_handlers(id, event);
                    self.active.deactivate(id);
                }
            }
        }
    }

    fn execute_entries(&mut self, steps: &[PlanStep<S>], event: Option<&E>) {
        for &step in steps {
            match step {
                PlanStep::Joint(id) => {
                    self.active.activate_joint(id);
                    self.run_enter_handlers(id, event);
                }
                PlanStep::State(id) => {
                    self.active.activate(id);
                    self.run_enter_handlers(id, event);
                }
            }
        }
    }

    fn run_enter_handlers(&mut self, id: S, event: Option<&E>) {
        let def = self.definition;
        if let Some(node) = def.node(id) {
            self.run_enter_exit_table(node.enter, Phase::Enter, event);
        }
    }

    fn run_exit_handlers(&mut self, id: S, event: Option<&E>) {
        let def = self.definition;
        if let Some(node) = def.node(id) {
            self.run_enter_exit_table(node.exit, Phase::Exit, event);
        }
    }

    /// Typed handlers for the current event's kind run first; if none matched
    /// or every one refused, the generic handlers run.
    fn run_enter_exit_table(
        &mut self,
        table: &[EnterExitHandler<S, E, R, C>],
        phase: Phase,
        event: Option<&E>,
    ) {
        let mut saw_typed = false;
        let mut any_handled = false;
        if let Some(kind) = event.map(Event::kind) {
            for handler in table.iter().filter(|h| h.event == Some(kind)) {
                saw_typed = true;
                if self.invoke_enter_exit(handler.run, phase, event) {
                    any_handled = true;
                }
            }
        }
        if !saw_typed || !any_handled {
            for handler in table.iter().filter(|h| h.event.is_none()) {
                let _ = self.invoke_enter_exit(handler.run, phase, event);
            }
        }
    }

    /// Run one enter/exit handler; its replies are dispatched as soon as it
    /// returns, and any transit it attempted is reported and dropped.
    fn invoke_enter_exit(
        &mut self,
        run: EnterExitFn<S, E, R, C>,
        phase: Phase,
        event: Option<&E>,
    ) -> bool {
        let handled = {
            let mut scope = Scope {
                phase,
                transits: &mut self.pending_transits,
                rejected: &mut self.rejected_transits,
                replies: &mut self.pending_replies,
                overflow: &mut self.overflow,
            };
            run(&mut self.context, &mut scope, event)
        };
        self.report_rejected_transits();
        self.dispatch_immediate_replies();
        self.report_overflow();
        handled
    }

    fn report_rejected_transits(&mut self) {
        if self.rejected_transits.is_empty() {
            return;
        }
        let rejected = mem::replace(&mut self.rejected_transits, Vec::new());
        for target in &rejected {
            self.hooks.report_transition_error(target);
        }
    }

    /// Drain the engine reply buffer, dispatching in FIFO order. Replies
    /// emitted by the handlers themselves join the back of the queue.
    fn dispatch_immediate_replies(&mut self) {
        while let Some(reply) = self.pending_replies.pop_front() {
            self.dispatch_reply(reply);
        }
    }

    /// Flush replies buffered during the event-handler phase.
    fn flush_replies(&mut self, buffered: &mut Deque<R, MAX_PENDING_REPLIES>) {
        while let Some(reply) = buffered.pop_front() {
            self.dispatch_reply(reply);
            // A reply handler's own replies run before the next buffered one.
            self.dispatch_immediate_replies();
        }
    }

    fn dispatch_reply(&mut self, reply: R) {
        let def = self.definition;
        let kind = reply.kind();
        let mut matched = false;
        for handler in def.replies.iter().filter(|h| h.reply == kind) {
            matched = true;
            let mut scope = ReplyScope {
                events: &mut self.event_queue,
                replies: &mut self.pending_replies,
                overflow: &mut self.overflow,
            };
            (handler.run)(&mut self.context, &mut scope, &reply);
        }
        if !matched {
            self.hooks.report_unprocessed_reply(&reply);
        }
        self.report_overflow();
    }

    fn report_overflow(&mut self) {
        if self.overflow.transits {
            self.hooks
                .report_error(format_args!("transit buffer overflow; request dropped"));
        }
        if self.overflow.replies {
            self.hooks
                .report_error(format_args!("reply buffer overflow; reply dropped"));
        }
        if self.overflow.events {
            self.hooks
                .report_error(format_args!("event queue overflow; event dropped"));
        }
        self.overflow.clear();
    }

    /// Joint activation must equal "all guards active" after every event.
    fn debug_check_joints(&self) {
        if cfg!(debug_assertions) {
            let (newly_inactive, newly_active) = self.joints.recompute(&self.active);
            debug_assert!(
                newly_inactive.is_empty() && newly_active.is_empty(),
                "joint activation drifted from its guards"
            );
        }
    }

    fn collect_leaves(&self, id: S, out: &mut heapless::Vec<S, MAX_ACTIVE_REGIONS>) {
        if !self.active.is_active(id) {
            return;
        }
        let Some(node) = self.definition.node(id) else {
            return;
        };
        match node.kind {
            StateKind::Simple => {
                let _ = out.push(id);
            }
            StateKind::Composite { children } => {
                match children.iter().copied().find(|&c| self.active.is_active(c)) {
                    Some(child) => self.collect_leaves(child, out),
                    None => {
                        let _ = out.push(id);
                    }
                }
            }
            StateKind::Parallel { regions, .. } => {
                for &region in regions {
                    self.collect_leaves(region, out);
                }
            }
            StateKind::Joint { .. } => {}
        }
    }
}
