//! Benchmark fixtures for generating event workloads

use crate::common::BenchEvent;

/// Generate a sequence of benchmark events
#[must_use]
pub fn generate_event_sequence(count: usize) -> Vec<BenchEvent> {
    (0..count)
        .map(|i| match i % 2 {
            0 => BenchEvent::Flip,
            _ => BenchEvent::Noop,
        })
        .collect()
}

/// Generate a realistic workload pattern
///
/// - 40% power toggles
/// - 40% link toggles (half of which flip the joint)
/// - 20% unhandled events
#[must_use]
pub fn joint_workload(count: usize) -> Vec<BenchEvent> {
    (0..count)
        .map(|i| match i % 5 {
            0 | 1 => BenchEvent::Power,
            2 | 3 => BenchEvent::Link,
            _ => BenchEvent::Noop,
        })
        .collect()
}
