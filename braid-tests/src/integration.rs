//! End-to-end scenarios against the rig fixture.

use crate::common::*;
use braid_core::core::ProcessResult;

#[test]
fn test_rig_reaches_ready_and_reports_online() {
    setup_tracing();
    let mut chart = rig();
    chart.initiate();
    assert_legal(&chart);
    assert_eq!(chart.context().online, 0);

    // Power on: the joint still waits for the link.
    assert_eq!(chart.process(RigEvent::PowerToggle), ProcessResult::Processed);
    assert_legal(&chart);
    assert!(chart.active_joints().is_empty());
    assert_eq!(chart.context().online, 0);

    // Link up: both guards active, Ready fires once.
    assert_eq!(chart.process(RigEvent::LinkToggle), ProcessResult::Processed);
    assert_legal(&chart);
    assert_eq!(chart.active_joints(), &[RigId::Ready]);
    assert_eq!(chart.context().online, 1);
    assert_eq!(chart.context().offline, 0);

    // Power off: Ready goes down with its guard.
    assert_eq!(chart.process(RigEvent::PowerToggle), ProcessResult::Processed);
    assert_legal(&chart);
    assert!(chart.active_joints().is_empty());
    assert_eq!(chart.context().offline, 1);
}

#[test]
fn test_reset_rebuilds_the_default_configuration() {
    setup_tracing();
    let mut chart = rig();
    chart.initiate();
    let _ = chart.process(RigEvent::PowerToggle);
    let _ = chart.process(RigEvent::LinkToggle);
    assert_eq!(chart.active_joints(), &[RigId::Ready]);

    // An outer transition to the top re-enters everything at defaults.
    let _ = chart.process(RigEvent::Reset);
    assert_legal(&chart);
    assert!(chart.is_active(RigId::PowerOff));
    assert!(chart.is_active(RigId::Down));
    assert!(chart.active_joints().is_empty());
    // Ready was active before the reset, so it went offline exactly once.
    assert_eq!(chart.context().online, 1);
    assert_eq!(chart.context().offline, 1);
}

#[test]
fn test_long_toggle_run_stays_legal_and_balanced() {
    setup_tracing();
    let mut chart = rig();
    chart.initiate();

    for step in 0..1000u32 {
        let event = match step % 3 {
            0 => RigEvent::PowerToggle,
            1 => RigEvent::LinkToggle,
            _ => RigEvent::Kick,
        };
        let _ = chart.process(event);
        assert_legal(&chart);
        let ctx = chart.context();
        assert_eq!(ctx.online - ctx.offline, chart.active_joints().len() as u32);
    }

    chart.terminate();
    assert_legal(&chart);
    let ctx = chart.context();
    assert_eq!(ctx.enters, ctx.exits, "every entry must be matched by an exit");
    assert_eq!(ctx.online, ctx.offline);
}

#[test]
fn test_unhandled_kick_changes_nothing() {
    setup_tracing();
    let mut chart = rig();
    chart.initiate();
    let before = chart.context().clone();
    let active_before: Vec<RigId> = chart.active_states().to_vec();

    let _ = chart.process(RigEvent::Kick);
    assert_eq!(chart.context(), &before);
    assert_eq!(chart.active_states(), active_before.as_slice());
}
