// braid-core/tests/parallel_joint_integration_test.rs

#[cfg(test)]
mod parallel_joint_integration_test {
    use braid_core::core::{
        ChartDefinition, EnterExitHandler, Event, EventHandler, Reply, Scope, StateChart,
        StateKind, StateNode,
    };
    use heapless::String;

    const LOG_CAPACITY: usize = 32;
    const STRING_CAPACITY: usize = 32;

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct TestLogContext {
        log: heapless::Vec<String<STRING_CAPACITY>, LOG_CAPACITY>,
    }

    impl TestLogContext {
        fn record(&mut self, action: &str) {
            let entry = String::try_from(action).expect("action name too long");
            self.log.push(entry).expect("log overflow");
        }
        fn log_strs(&self) -> heapless::Vec<&str, LOG_CAPACITY> {
            self.log.iter().map(String::as_str).collect()
        }
        fn clear(&mut self) {
            self.log.clear();
        }
    }

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
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ev {
        Advance,
        Jump,
        Ping,
        Reset,
    }
    impl Event for Ev {
        type Kind = Self;
        fn kind(&self) -> Self {
            *self
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Rep {
        Unused,
    }
    impl Reply for Rep {
        type Kind = Self;
        fn kind(&self) -> Self {
            *self
        }
    }

    type Ctx = TestLogContext;

    macro_rules! logging_handlers {
        ($($fn_name:ident => $label:literal),* $(,)?) => {
            $(
                fn $fn_name(ctx: &mut Ctx, _s: &mut Scope<'_, Id, Rep>, _e: Option<&Ev>) -> bool {
                    ctx.record($label);
                    true
                }
            )*
        };
    }

    logging_handlers! {
        enter_top => "EnterTop", exit_top => "ExitTop",
        enter_r1 => "EnterR1", exit_r1 => "ExitR1",
        enter_x1 => "EnterX1", exit_x1 => "ExitX1",
        enter_x2 => "EnterX2", exit_x2 => "ExitX2",
        enter_r2 => "EnterR2", exit_r2 => "ExitR2",
        enter_y1 => "EnterY1", exit_y1 => "ExitY1",
        enter_y2 => "EnterY2", exit_y2 => "ExitY2",
        enter_j => "EnterJ", exit_j => "ExitJ",
    }

    fn x1_on_advance(ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
        ctx.record("HandleAdvance");
        scope.transit(Id::X2);
        true
    }
    fn x2_on_jump(ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
        ctx.record("HandleJump");
        scope.transit(Id::J);
        true
    }
    fn j_on_ping(ctx: &mut Ctx, _s: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
        ctx.record("JointPing");
        true
    }
    fn top_on_ping(ctx: &mut Ctx, _s: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
        ctx.record("TopPing");
        true
    }
    fn y1_on_reset(ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
        ctx.record("HandleReset");
        scope.transit(Id::Top);
        true
    }

    const fn generic(
        run: fn(&mut Ctx, &mut Scope<'_, Id, Rep>, Option<&Ev>) -> bool,
    ) -> EnterExitHandler<Id, Ev, Rep, Ctx> {
        EnterExitHandler { event: None, run }
    }

    const CHART: ChartDefinition<'static, Id, Ev, Rep, Ctx> = ChartDefinition {
        name: "parallel-joint",
        top: Id::Top,
        states: &[
            StateNode {
                id: Id::Top,
                parent: None,
                kind: StateKind::Parallel {
                    regions: &[Id::R1, Id::R2],
                    joints: &[Id::J],
                },
                enter: &[generic(enter_top)],
                exit: &[generic(exit_top)],
                on: &[EventHandler {
                    event: Ev::Ping,
                    run: top_on_ping,
                }],
            },
            StateNode {
                id: Id::R1,
                parent: Some(Id::Top),
                kind: StateKind::Composite {
                    children: &[Id::X1, Id::X2],
                },
                enter: &[generic(enter_r1)],
                exit: &[generic(exit_r1)],
                on: &[],
            },
            StateNode {
                id: Id::X1,
                parent: Some(Id::R1),
                kind: StateKind::Simple,
                enter: &[generic(enter_x1)],
                exit: &[generic(exit_x1)],
                on: &[EventHandler {
                    event: Ev::Advance,
                    run: x1_on_advance,
                }],
            },
            StateNode {
                id: Id::X2,
                parent: Some(Id::R1),
                kind: StateKind::Simple,
                enter: &[generic(enter_x2)],
                exit: &[generic(exit_x2)],
                on: &[EventHandler {
                    event: Ev::Jump,
                    run: x2_on_jump,
                }],
            },
            StateNode {
                id: Id::R2,
                parent: Some(Id::Top),
                kind: StateKind::Composite {
                    children: &[Id::Y1, Id::Y2],
                },
                enter: &[generic(enter_r2)],
                exit: &[generic(exit_r2)],
                on: &[],
            },
            StateNode {
                id: Id::Y1,
                parent: Some(Id::R2),
                kind: StateKind::Simple,
                enter: &[generic(enter_y1)],
                exit: &[generic(exit_y1)],
                on: &[EventHandler {
                    event: Ev::Reset,
                    run: y1_on_reset,
                }],
            },
            StateNode {
                id: Id::Y2,
                parent: Some(Id::R2),
                kind: StateKind::Simple,
                enter: &[generic(enter_y2)],
                exit: &[generic(exit_y2)],
                on: &[],
            },
            StateNode {
                id: Id::J,
                parent: Some(Id::Top),
                kind: StateKind::Joint {
                    guards: &[Id::X1, Id::Y1],
                },
                enter: &[generic(enter_j)],
                exit: &[generic(exit_j)],
                on: &[EventHandler {
                    event: Ev::Ping,
                    run: j_on_ping,
                }],
            },
        ],
        replies: &[],
    };

    fn fresh_chart() -> StateChart<'static, Id, Ev, Rep, Ctx, braid_core::DefaultHooks, 16> {
        StateChart::new(&CHART, TestLogContext::default()).expect("chart must validate")
    }

    #[test]
    fn test_parallel_initiation_enters_regions_then_joint() {
        let mut chart = fresh_chart();
        chart.initiate();
        assert_eq!(
            chart.context().log_strs().as_slice(),
            &["EnterTop", "EnterR1", "EnterX1", "EnterR2", "EnterY1", "EnterJ"],
        );
        let mut leaves = chart.state();
        leaves.sort_unstable_by_key(|id| *id as u8);
        assert_eq!(leaves.as_slice(), &[Id::X1, Id::Y1]);
        assert_eq!(chart.active_joints(), &[Id::J]);
    }

    #[test]
    fn test_guard_exit_deactivates_joint_first() {
        let mut chart = fresh_chart();
        chart.initiate();
        chart.context_mut().clear();

        let _ = chart.process(Ev::Advance);
        // The joint loses guard X1, so its exit precedes X1's exit handlers.
        assert_eq!(
            chart.context().log_strs().as_slice(),
            &["HandleAdvance", "ExitJ", "ExitX1", "EnterX2"],
        );
        assert!(chart.active_joints().is_empty());
        assert!(chart.is_active(Id::X2));
        assert!(chart.is_active(Id::Y1));
    }

    #[test]
    fn test_joint_target_rewrites_to_guards() {
        let mut chart = fresh_chart();
        chart.initiate();
        let _ = chart.process(Ev::Advance);
        chart.context_mut().clear();

        let _ = chart.process(Ev::Jump);
        // transit(J) stands for transits to X1 and Y1. Y1 is already active
        // and must not be re-entered; the joint enters after its last
        // entering guard.
        assert_eq!(
            chart.context().log_strs().as_slice(),
            &["HandleJump", "ExitX2", "EnterX1", "EnterJ"],
        );
        assert_eq!(chart.active_joints(), &[Id::J]);
    }

    #[test]
    fn test_active_joint_handles_before_the_parallel() {
        let mut chart = fresh_chart();
        chart.initiate();
        chart.context_mut().clear();

        let _ = chart.process(Ev::Ping);
        assert_eq!(chart.context().log_strs().as_slice(), &["JointPing"]);

        // Once the joint deactivates, the parallel's own handler takes over.
        let _ = chart.process(Ev::Advance);
        chart.context_mut().clear();
        let _ = chart.process(Ev::Ping);
        assert_eq!(chart.context().log_strs().as_slice(), &["TopPing"]);
    }

    #[test]
    fn test_outer_reentry_of_the_parallel_top() {
        let mut chart = fresh_chart();
        chart.initiate();
        chart.context_mut().clear();

        let _ = chart.process(Ev::Reset);
        assert_eq!(
            chart.context().log_strs().as_slice(),
            &[
                "HandleReset",
                "ExitJ",
                "ExitX1",
                "ExitR1",
                "ExitY1",
                "ExitR2",
                "ExitTop",
                "EnterTop",
                "EnterR1",
                "EnterX1",
                "EnterR2",
                "EnterY1",
                "EnterJ",
            ],
        );
        assert_eq!(chart.active_joints(), &[Id::J]);
    }

    #[test]
    fn test_terminate_exits_joint_before_its_guards() {
        let mut chart = fresh_chart();
        chart.initiate();
        chart.context_mut().clear();

        chart.terminate();
        assert_eq!(
            chart.context().log_strs().as_slice(),
            &["ExitJ", "ExitX1", "ExitR1", "ExitY1", "ExitR2", "ExitTop"],
        );
        assert!(chart.active_states().is_empty());
        assert!(chart.active_joints().is_empty());
    }
}
