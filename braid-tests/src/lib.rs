//! Integration and property tests for braid
//!
//! This crate contains tests that want std and heavier dependencies than the
//! core `no_std` build should carry (proptest, tracing-subscriber).

#![cfg(test)]

pub mod integration;
pub mod property_tests;

/// Common test fixtures: a two-region rig with one joint, instrumented with
/// enter/exit counters so properties can check balance and legality.
pub mod common {
    use braid_core::core::{
        ChartDefinition, DefaultHooks, EnterExitHandler, Event, EventHandler, Reply,
        ReplyHandler, ReplyScope, Scope, StateChart, StateKind, StateNode,
    };

    /// Setup tracing for tests
    pub fn setup_tracing() {
        use tracing_subscriber::{fmt, EnvFilter};

        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RigId {
        Top,
        Power,
        PowerOff,
        PowerOn,
        Link,
        Down,
        Up,
        Ready,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RigEvent {
        PowerToggle,
        LinkToggle,
        Kick,
        Reset,
    }

    impl Event for RigEvent {
        type Kind = Self;
        fn kind(&self) -> Self {
            *self
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RigReply {
        Online,
        Offline,
    }

    impl Reply for RigReply {
        type Kind = Self;
        fn kind(&self) -> Self {
            *self
        }
    }

    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    pub struct RigContext {
        pub enters: u32,
        pub exits: u32,
        pub online: u32,
        pub offline: u32,
    }

    fn count_enter(ctx: &mut RigContext, _s: &mut Scope<'_, RigId, RigReply>, _e: Option<&RigEvent>) -> bool {
        ctx.enters += 1;
        true
    }
    fn count_exit(ctx: &mut RigContext, _s: &mut Scope<'_, RigId, RigReply>, _e: Option<&RigEvent>) -> bool {
        ctx.exits += 1;
        true
    }
    fn ready_enter(ctx: &mut RigContext, scope: &mut Scope<'_, RigId, RigReply>, _e: Option<&RigEvent>) -> bool {
        ctx.enters += 1;
        scope.reply(RigReply::Online);
        true
    }
    fn ready_exit(ctx: &mut RigContext, scope: &mut Scope<'_, RigId, RigReply>, _e: Option<&RigEvent>) -> bool {
        ctx.exits += 1;
        scope.reply(RigReply::Offline);
        true
    }

    fn power_off_toggle(_c: &mut RigContext, scope: &mut Scope<'_, RigId, RigReply>, _e: &RigEvent) -> bool {
        scope.transit(RigId::PowerOn);
        true
    }
    fn power_on_toggle(_c: &mut RigContext, scope: &mut Scope<'_, RigId, RigReply>, _e: &RigEvent) -> bool {
        scope.transit(RigId::PowerOff);
        true
    }
    fn down_toggle(_c: &mut RigContext, scope: &mut Scope<'_, RigId, RigReply>, _e: &RigEvent) -> bool {
        scope.transit(RigId::Up);
        true
    }
    fn up_toggle(_c: &mut RigContext, scope: &mut Scope<'_, RigId, RigReply>, _e: &RigEvent) -> bool {
        scope.transit(RigId::Down);
        true
    }
    fn top_reset(_c: &mut RigContext, scope: &mut Scope<'_, RigId, RigReply>, _e: &RigEvent) -> bool {
        scope.transit(RigId::Top);
        true
    }

    fn on_online(ctx: &mut RigContext, _s: &mut ReplyScope<'_, RigEvent, RigReply>, _r: &RigReply) {
        ctx.online += 1;
    }
    fn on_offline(ctx: &mut RigContext, _s: &mut ReplyScope<'_, RigEvent, RigReply>, _r: &RigReply) {
        ctx.offline += 1;
    }

    const COUNTED_ENTER: &[EnterExitHandler<RigId, RigEvent, RigReply, RigContext>] =
        &[EnterExitHandler {
            event: None,
            run: count_enter,
        }];
    const COUNTED_EXIT: &[EnterExitHandler<RigId, RigEvent, RigReply, RigContext>] =
        &[EnterExitHandler {
            event: None,
            run: count_exit,
        }];

    pub const RIG: ChartDefinition<'static, RigId, RigEvent, RigReply, RigContext> =
        ChartDefinition {
            name: "rig",
            top: RigId::Top,
            states: &[
                StateNode {
                    id: RigId::Top,
                    parent: None,
                    kind: StateKind::Parallel {
                        regions: &[RigId::Power, RigId::Link],
                        joints: &[RigId::Ready],
                    },
                    enter: COUNTED_ENTER,
                    exit: COUNTED_EXIT,
                    on: &[EventHandler {
                        event: RigEvent::Reset,
                        run: top_reset,
                    }],
                },
                StateNode {
                    id: RigId::Power,
                    parent: Some(RigId::Top),
                    kind: StateKind::Composite {
                        children: &[RigId::PowerOff, RigId::PowerOn],
                    },
                    enter: COUNTED_ENTER,
                    exit: COUNTED_EXIT,
                    on: &[],
                },
                StateNode {
                    id: RigId::PowerOff,
                    parent: Some(RigId::Power),
                    kind: StateKind::Simple,
                    enter: COUNTED_ENTER,
                    exit: COUNTED_EXIT,
                    on: &[EventHandler {
                        event: RigEvent::PowerToggle,
                        run: power_off_toggle,
                    }],
                },
                StateNode {
                    id: RigId::PowerOn,
                    parent: Some(RigId::Power),
                    kind: StateKind::Simple,
                    enter: COUNTED_ENTER,
                    exit: COUNTED_EXIT,
                    on: &[EventHandler {
                        event: RigEvent::PowerToggle,
                        run: power_on_toggle,
                    }],
                },
                StateNode {
                    id: RigId::Link,
                    parent: Some(RigId::Top),
                    kind: StateKind::Composite {
                        children: &[RigId::Down, RigId::Up],
                    },
                    enter: COUNTED_ENTER,
                    exit: COUNTED_EXIT,
                    on: &[],
                },
                StateNode {
                    id: RigId::Down,
                    parent: Some(RigId::Link),
                    kind: StateKind::Simple,
                    enter: COUNTED_ENTER,
                    exit: COUNTED_EXIT,
                    on: &[EventHandler {
                        event: RigEvent::LinkToggle,
                        run: down_toggle,
                    }],
                },
                StateNode {
                    id: RigId::Up,
                    parent: Some(RigId::Link),
                    kind: StateKind::Simple,
                    enter: COUNTED_ENTER,
                    exit: COUNTED_EXIT,
                    on: &[EventHandler {
                        event: RigEvent::LinkToggle,
                        run: up_toggle,
                    }],
                },
                StateNode {
                    id: RigId::Ready,
                    parent: Some(RigId::Top),
                    kind: StateKind::Joint {
                        guards: &[RigId::PowerOn, RigId::Up],
                    },
                    enter: &[EnterExitHandler {
                        event: None,
                        run: ready_enter,
                    }],
                    exit: &[EnterExitHandler {
                        event: None,
                        run: ready_exit,
                    }],
                    on: &[],
                },
            ],
            replies: &[
                ReplyHandler {
                    reply: RigReply::Online,
                    run: on_online,
                },
                ReplyHandler {
                    reply: RigReply::Offline,
                    run: on_offline,
                },
            ],
        };

    pub type RigChart = StateChart<'static, RigId, RigEvent, RigReply, RigContext, DefaultHooks, 16>;

    pub fn rig() -> RigChart {
        StateChart::new(&RIG, RigContext::default()).expect("rig chart must validate")
    }

    /// The configuration must be legal after every processed event: the top
    /// is active, every active composite has exactly one active child, every
    /// active parallel has all regions active, and joint activity equals
    /// "all guards active".
    pub fn assert_legal(chart: &RigChart) {
        if !chart.is_initiated() {
            assert!(chart.active_states().is_empty(), "terminated but not empty");
            assert!(chart.active_joints().is_empty());
            return;
        }
        let def = chart.definition();
        assert!(chart.is_active(def.top), "top must be active");
        for node in def.states {
            match node.kind {
                StateKind::Simple => {}
                StateKind::Composite { children } => {
                    let active_children =
                        children.iter().filter(|&&c| chart.is_active(c)).count();
                    if chart.is_active(node.id) {
                        assert_eq!(
                            active_children, 1,
                            "active composite {:?} must have exactly one active child",
                            node.id
                        );
                    } else {
                        assert_eq!(
                            active_children, 0,
                            "inactive composite {:?} must have no active children",
                            node.id
                        );
                    }
                }
                StateKind::Parallel { regions, .. } => {
                    if chart.is_active(node.id) {
                        assert!(
                            regions.iter().all(|&r| chart.is_active(r)),
                            "active parallel {:?} must have every region active",
                            node.id
                        );
                    } else {
                        assert!(regions.iter().all(|&r| !chart.is_active(r)));
                    }
                }
                StateKind::Joint { guards } => {
                    let satisfied = guards.iter().all(|&g| chart.is_active(g));
                    assert_eq!(
                        chart.active_joints().contains(&node.id),
                        satisfied,
                        "joint {:?} activity must equal its guard conjunction",
                        node.id
                    );
                }
            }
        }
    }
}
