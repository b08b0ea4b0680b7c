//! Engine core: the static chart model, the active-set tracker, the handler
//! dispatcher, the transition planner, and the event-processing loop.
//!
//! Charts are declared as `const` tables of [`StateNode`] records with plain
//! `fn` handler pointers, validated once at [`StateChart::new`], and driven
//! one event at a time. No allocation: every runtime buffer is a `heapless`
//! collection whose capacity comes from the `N` const generic (maximum node
//! count) or one of the `MAX_*` consts below.

mod active;
mod diagnostics;
mod dispatch;
mod event;
mod plan;
mod runtime;
mod scope;
mod tree;
mod validate;

pub use diagnostics::{ChartHooks, DefaultHooks};
pub use event::{Event, Reply};
pub use runtime::{ProcessResult, StateChart};
pub use scope::{ReplyScope, Scope};
pub use tree::{
    ChartDefinition, EnterExitFn, EnterExitHandler, EventHandler, HandleFn, ReplyFn, ReplyHandler,
    StateKind, StateNode,
};
pub use validate::ConfigError;

/// Maximum number of leaf states reported by [`StateChart::state`]. One leaf
/// per parallel region that is simultaneously active.
pub const MAX_ACTIVE_REGIONS: usize = 16;

/// Capacity of the FIFO reentrancy queue (`process` calls made from reply
/// handlers while an event is in flight).
pub const MAX_QUEUED_EVENTS: usize = 16;

/// Capacity of the reply buffer for a single event.
pub const MAX_PENDING_REPLIES: usize = 16;

/// Capacity of the transit-request buffer for a single event.
pub const MAX_PENDING_TRANSITS: usize = 16;

/// Engine-internal tracing. Forwards to `tracing` when the `std` feature is
/// enabled and compiles to nothing otherwise.
#[cfg(feature = "std")]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!($($arg)*) };
}

/// Engine-internal tracing. Forwards to `tracing` when the `std` feature is
/// enabled and compiles to nothing otherwise.
#[cfg(not(feature = "std"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {{
        let _ = || ::core::format_args!($($arg)*);
    }};
}

pub use crate::trace;
