//! Benchmark support for braid: chart fixtures and event workloads.

pub mod fixtures;

/// Shared chart definitions driven by the benchmarks.
pub mod common {
    use braid_core::core::{
        ChartDefinition, DefaultHooks, Event, EventHandler, Reply, Scope, StateChart, StateKind,
        StateNode,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BenchEvent {
        Flip,
        Power,
        Link,
        Noop,
    }

    impl Event for BenchEvent {
        type Kind = Self;
        fn kind(&self) -> Self {
            *self
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BenchReply {
        Unused,
    }

    impl Reply for BenchReply {
        type Kind = Self;
        fn kind(&self) -> Self {
            *self
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PingPongId {
        Top,
        A,
        B,
    }

    fn a_flip(_c: &mut (), scope: &mut Scope<'_, PingPongId, BenchReply>, _e: &BenchEvent) -> bool {
        scope.transit(PingPongId::B);
        true
    }
    fn b_flip(_c: &mut (), scope: &mut Scope<'_, PingPongId, BenchReply>, _e: &BenchEvent) -> bool {
        scope.transit(PingPongId::A);
        true
    }

    /// The smallest transitioning chart: two siblings swapping on `Flip`.
    pub const PING_PONG: ChartDefinition<'static, PingPongId, BenchEvent, BenchReply, ()> =
        ChartDefinition {
            name: "ping-pong",
            top: PingPongId::Top,
            states: &[
                StateNode {
                    id: PingPongId::Top,
                    parent: None,
                    kind: StateKind::Composite {
                        children: &[PingPongId::A, PingPongId::B],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
                StateNode {
                    id: PingPongId::A,
                    parent: Some(PingPongId::Top),
                    kind: StateKind::Simple,
                    enter: &[],
                    exit: &[],
                    on: &[EventHandler {
                        event: BenchEvent::Flip,
                        run: a_flip,
                    }],
                },
                StateNode {
                    id: PingPongId::B,
                    parent: Some(PingPongId::Top),
                    kind: StateKind::Simple,
                    enter: &[],
                    exit: &[],
                    on: &[EventHandler {
                        event: BenchEvent::Flip,
                        run: b_flip,
                    }],
                },
            ],
            replies: &[],
        };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RigId {
        Top,
        Power,
        P0,
        P1,
        Link,
        L0,
        L1,
        Ready,
    }

    fn p0_power(_c: &mut (), scope: &mut Scope<'_, RigId, BenchReply>, _e: &BenchEvent) -> bool {
        scope.transit(RigId::P1);
        true
    }
    fn p1_power(_c: &mut (), scope: &mut Scope<'_, RigId, BenchReply>, _e: &BenchEvent) -> bool {
        scope.transit(RigId::P0);
        true
    }
    fn l0_link(_c: &mut (), scope: &mut Scope<'_, RigId, BenchReply>, _e: &BenchEvent) -> bool {
        scope.transit(RigId::L1);
        true
    }
    fn l1_link(_c: &mut (), scope: &mut Scope<'_, RigId, BenchReply>, _e: &BenchEvent) -> bool {
        scope.transit(RigId::L0);
        true
    }

    const fn simple_with(
        id: RigId,
        parent: RigId,
        on: &'static [EventHandler<RigId, BenchEvent, BenchReply, ()>],
    ) -> StateNode<'static, RigId, BenchEvent, BenchReply, ()> {
        StateNode {
            id,
            parent: Some(parent),
            kind: StateKind::Simple,
            enter: &[],
            exit: &[],
            on,
        }
    }

    /// Two toggling regions with one joint across them; `Power`/`Link`
    /// events flip the joint on and off, exercising the interleaving path.
    pub const JOINT_RIG: ChartDefinition<'static, RigId, BenchEvent, BenchReply, ()> =
        ChartDefinition {
            name: "joint-rig",
            top: RigId::Top,
            states: &[
                StateNode {
                    id: RigId::Top,
                    parent: None,
                    kind: StateKind::Parallel {
                        regions: &[RigId::Power, RigId::Link],
                        joints: &[RigId::Ready],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
                StateNode {
                    id: RigId::Power,
                    parent: Some(RigId::Top),
                    kind: StateKind::Composite {
                        children: &[RigId::P0, RigId::P1],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
                simple_with(
                    RigId::P0,
                    RigId::Power,
                    &[EventHandler {
                        event: BenchEvent::Power,
                        run: p0_power,
                    }],
                ),
                simple_with(
                    RigId::P1,
                    RigId::Power,
                    &[EventHandler {
                        event: BenchEvent::Power,
                        run: p1_power,
                    }],
                ),
                StateNode {
                    id: RigId::Link,
                    parent: Some(RigId::Top),
                    kind: StateKind::Composite {
                        children: &[RigId::L0, RigId::L1],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
                simple_with(
                    RigId::L0,
                    RigId::Link,
                    &[EventHandler {
                        event: BenchEvent::Link,
                        run: l0_link,
                    }],
                ),
                simple_with(
                    RigId::L1,
                    RigId::Link,
                    &[EventHandler {
                        event: BenchEvent::Link,
                        run: l1_link,
                    }],
                ),
                StateNode {
                    id: RigId::Ready,
                    parent: Some(RigId::Top),
                    kind: StateKind::Joint {
                        guards: &[RigId::P1, RigId::L1],
                    },
                    enter: &[],
                    exit: &[],
                    on: &[],
                },
            ],
            replies: &[],
        };

    pub type PingPongChart =
        StateChart<'static, PingPongId, BenchEvent, BenchReply, (), DefaultHooks, 4>;
    pub type RigChart = StateChart<'static, RigId, BenchEvent, BenchReply, (), DefaultHooks, 8>;

    #[must_use]
    pub fn ping_pong() -> PingPongChart {
        let mut chart = StateChart::new(&PING_PONG, ()).expect("bench chart must validate");
        chart.initiate();
        chart
    }

    #[must_use]
    pub fn joint_rig() -> RigChart {
        let mut chart = StateChart::new(&JOINT_RIG, ()).expect("bench chart must validate");
        chart.initiate();
        chart
    }
}
