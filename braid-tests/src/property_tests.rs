//! Property-based tests for chart behavior

use crate::common::*;
use proptest::prelude::*;

// Property test strategies
prop_compose! {
    fn arb_rig_event()(variant in 0..4u8) -> RigEvent {
        match variant {
            0 => RigEvent::PowerToggle,
            1 => RigEvent::LinkToggle,
            2 => RigEvent::Reset,
            _ => RigEvent::Kick,
        }
    }
}

prop_compose! {
    fn arb_event_sequence()(events in prop::collection::vec(arb_rig_event(), 0..100)) -> Vec<RigEvent> {
        events
    }
}

proptest! {
    #[test]
    fn configuration_stays_legal(events in arb_event_sequence()) {
        // Property: every event maps a legal configuration to a legal
        // configuration, and joint activity always equals its guard
        // conjunction.
        let mut chart = rig();
        chart.initiate();
        assert_legal(&chart);
        for event in events {
            let _ = chart.process(event);
            assert_legal(&chart);
        }
    }

    #[test]
    fn same_sequence_same_configuration(events in arb_event_sequence()) {
        // Property: the engine is deterministic; two charts fed the same
        // sequence end in the same configuration with the same context.
        let mut first = rig();
        let mut second = rig();
        first.initiate();
        second.initiate();
        for event in &events {
            let _ = first.process(*event);
            let _ = second.process(*event);
        }
        prop_assert_eq!(first.active_states(), second.active_states());
        prop_assert_eq!(first.active_joints(), second.active_joints());
        prop_assert_eq!(first.context(), second.context());
    }

    #[test]
    fn terminate_balances_every_entry(events in arb_event_sequence()) {
        // Property: after terminate, the chart is empty and each entry
        // handler fired exactly as often as the matching exit handler.
        let mut chart = rig();
        chart.initiate();
        for event in events {
            let _ = chart.process(event);
        }
        chart.terminate();
        assert_legal(&chart);
        prop_assert!(chart.active_states().is_empty());
        prop_assert_eq!(chart.context().enters, chart.context().exits);
        prop_assert_eq!(chart.context().online, chart.context().offline);
    }

    #[test]
    fn events_after_terminate_are_dropped(events in arb_event_sequence()) {
        // Property: a terminated chart reports and drops everything.
        let mut chart = rig();
        chart.initiate();
        chart.terminate();
        let before = chart.context().clone();
        for event in events {
            let _ = chart.process(event);
        }
        prop_assert_eq!(chart.context(), &before);
        prop_assert!(chart.active_states().is_empty());
    }
}
