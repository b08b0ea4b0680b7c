//! # Pump Controller Example
//!
//! Two orthogonal regions bridged by joint states:
//!
//! 1. **`Request`**: what the operator asked for (`ReqOff` / `ReqOn`)
//! 2. **`Motor`**: what the hardware is doing (`Off` / `Starting` / `On` / `Stopping`)
//!
//! The regions never reference each other. The `TurnOn` joint becomes active
//! exactly when `ReqOn` and `Off` are both active and its entry handler asks
//! the host (via a reply) to spin the motor up; `TurnOff` does the reverse.
//! The host's reply handlers feed hardware acknowledgements back in through
//! `process`, exercising the FIFO reentrancy path.
//!
//! Run with `RUST_LOG=trace` to watch the engine's own tracing.

use braid_core::core::{
    ChartDefinition, EnterExitHandler, Event, EventHandler, Reply, ReplyHandler, ReplyScope,
    Scope, StateChart, StateKind, StateNode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Id {
    Top,
    Request,
    ReqOff,
    ReqOn,
    Motor,
    Off,
    Starting,
    On,
    Stopping,
    TurnOn,
    TurnOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ev {
    CmdOn,
    CmdOff,
    SpinUp,
    SpunUp,
    SpinDown,
    SpunDown,
}

impl Event for Ev {
    type Kind = Self;
    fn kind(&self) -> Self {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rep {
    OnRequested,
    OffRequested,
    StartMotor,
    StopMotor,
    SpinningUp,
    SpinningDown,
}

impl Reply for Rep {
    type Kind = Self;
    fn kind(&self) -> Self {
        *self
    }
}

type Ctx = ();

fn req_off_on_cmd_on(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
    scope.transit(Id::ReqOn);
    scope.reply(Rep::OnRequested);
    true
}

fn req_on_on_cmd_off(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
    scope.transit(Id::ReqOff);
    scope.reply(Rep::OffRequested);
    true
}

fn off_on_spin_up(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
    scope.transit(Id::Starting);
    true
}

fn starting_enter(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: Option<&Ev>) -> bool {
    scope.reply(Rep::SpinningUp);
    true
}

fn starting_on_spun_up(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
    scope.transit(Id::On);
    true
}

fn on_on_spin_down(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
    scope.transit(Id::Stopping);
    true
}

fn stopping_enter(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: Option<&Ev>) -> bool {
    scope.reply(Rep::SpinningDown);
    true
}

fn stopping_on_spun_down(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: &Ev) -> bool {
    scope.transit(Id::Off);
    true
}

fn turn_on_enter(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: Option<&Ev>) -> bool {
    println!("[chart] TurnOn joint active: requesting motor start");
    scope.reply(Rep::StartMotor);
    true
}

fn turn_off_enter(_ctx: &mut Ctx, scope: &mut Scope<'_, Id, Rep>, _e: Option<&Ev>) -> bool {
    println!("[chart] TurnOff joint active: requesting motor stop");
    scope.reply(Rep::StopMotor);
    true
}

// The host side: reply handlers are where side effects live. Hardware
// acknowledgements come back in through `process` and are queued behind the
// event currently in flight.

fn host_on_requested(_ctx: &mut Ctx, _scope: &mut ReplyScope<'_, Ev, Rep>, _r: &Rep) {
    println!("[host ] operator request registered: on");
}

fn host_off_requested(_ctx: &mut Ctx, _scope: &mut ReplyScope<'_, Ev, Rep>, _r: &Rep) {
    println!("[host ] operator request registered: off");
}

fn host_start_motor(_ctx: &mut Ctx, scope: &mut ReplyScope<'_, Ev, Rep>, _r: &Rep) {
    println!("[host ] driving relay closed");
    scope.process(Ev::SpinUp);
}

fn host_stop_motor(_ctx: &mut Ctx, scope: &mut ReplyScope<'_, Ev, Rep>, _r: &Rep) {
    println!("[host ] driving relay open");
    scope.process(Ev::SpinDown);
}

fn host_spinning_up(_ctx: &mut Ctx, scope: &mut ReplyScope<'_, Ev, Rep>, _r: &Rep) {
    println!("[host ] motor spinning up, ack");
    scope.process(Ev::SpunUp);
}

fn host_spinning_down(_ctx: &mut Ctx, scope: &mut ReplyScope<'_, Ev, Rep>, _r: &Rep) {
    println!("[host ] motor spinning down, ack");
    scope.process(Ev::SpunDown);
}

const fn generic_enter(
    run: fn(&mut Ctx, &mut Scope<'_, Id, Rep>, Option<&Ev>) -> bool,
) -> EnterExitHandler<Id, Ev, Rep, Ctx> {
    EnterExitHandler { event: None, run }
}

const CHART: ChartDefinition<'static, Id, Ev, Rep, Ctx> = ChartDefinition {
    name: "pump-controller",
    top: Id::Top,
    states: &[
        StateNode {
            id: Id::Top,
            parent: None,
            kind: StateKind::Parallel {
                regions: &[Id::Request, Id::Motor],
                joints: &[Id::TurnOn, Id::TurnOff],
            },
            enter: &[],
            exit: &[],
            on: &[],
        },
        StateNode {
            id: Id::Request,
            parent: Some(Id::Top),
            kind: StateKind::Composite {
                children: &[Id::ReqOff, Id::ReqOn],
            },
            enter: &[],
            exit: &[],
            on: &[],
        },
        StateNode {
            id: Id::ReqOff,
            parent: Some(Id::Request),
            kind: StateKind::Simple,
            enter: &[],
            exit: &[],
            on: &[EventHandler {
                event: Ev::CmdOn,
                run: req_off_on_cmd_on,
            }],
        },
        StateNode {
            id: Id::ReqOn,
            parent: Some(Id::Request),
            kind: StateKind::Simple,
            enter: &[],
            exit: &[],
            on: &[EventHandler {
                event: Ev::CmdOff,
                run: req_on_on_cmd_off,
            }],
        },
        StateNode {
            id: Id::Motor,
            parent: Some(Id::Top),
            kind: StateKind::Composite {
                children: &[Id::Off, Id::Starting, Id::On, Id::Stopping],
            },
            enter: &[],
            exit: &[],
            on: &[],
        },
        StateNode {
            id: Id::Off,
            parent: Some(Id::Motor),
            kind: StateKind::Simple,
            enter: &[],
            exit: &[],
            on: &[EventHandler {
                event: Ev::SpinUp,
                run: off_on_spin_up,
            }],
        },
        StateNode {
            id: Id::Starting,
            parent: Some(Id::Motor),
            kind: StateKind::Simple,
            enter: &[generic_enter(starting_enter)],
            exit: &[],
            on: &[EventHandler {
                event: Ev::SpunUp,
                run: starting_on_spun_up,
            }],
        },
        StateNode {
            id: Id::On,
            parent: Some(Id::Motor),
            kind: StateKind::Simple,
            enter: &[],
            exit: &[],
            on: &[EventHandler {
                event: Ev::SpinDown,
                run: on_on_spin_down,
            }],
        },
        StateNode {
            id: Id::Stopping,
            parent: Some(Id::Motor),
            kind: StateKind::Simple,
            enter: &[generic_enter(stopping_enter)],
            exit: &[],
            on: &[EventHandler {
                event: Ev::SpunDown,
                run: stopping_on_spun_down,
            }],
        },
        StateNode {
            id: Id::TurnOn,
            parent: Some(Id::Top),
            kind: StateKind::Joint {
                guards: &[Id::ReqOn, Id::Off],
            },
            enter: &[generic_enter(turn_on_enter)],
            exit: &[],
            on: &[],
        },
        StateNode {
            id: Id::TurnOff,
            parent: Some(Id::Top),
            kind: StateKind::Joint {
                guards: &[Id::ReqOff, Id::On],
            },
            enter: &[generic_enter(turn_off_enter)],
            exit: &[],
            on: &[],
        },
    ],
    replies: &[
        ReplyHandler {
            reply: Rep::OnRequested,
            run: host_on_requested,
        },
        ReplyHandler {
            reply: Rep::OffRequested,
            run: host_off_requested,
        },
        ReplyHandler {
            reply: Rep::StartMotor,
            run: host_start_motor,
        },
        ReplyHandler {
            reply: Rep::StopMotor,
            run: host_stop_motor,
        },
        ReplyHandler {
            reply: Rep::SpinningUp,
            run: host_spinning_up,
        },
        ReplyHandler {
            reply: Rep::SpinningDown,
            run: host_spinning_down,
        },
    ],
};

fn main() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let mut chart: StateChart<'_, _, _, _, _, _, 16> =
        StateChart::new(&CHART, ()).expect("pump chart must validate");

    println!("--- initiate ---");
    chart.initiate();
    println!("configuration: {:?}", chart.state());

    println!("--- operator: on ---");
    let _ = chart.process(Ev::CmdOn);
    println!("configuration: {:?}", chart.state());

    println!("--- operator: off ---");
    let _ = chart.process(Ev::CmdOff);
    println!("configuration: {:?}", chart.state());

    println!("--- terminate ---");
    chart.terminate();
    println!("configuration: {:?}", chart.state());
}
