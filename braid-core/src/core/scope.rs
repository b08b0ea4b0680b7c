//! Handler-facing views of the engine's pending buffers.
//!
//! Handlers never hold a reference to the engine itself; they receive a
//! short-lived [`Scope`] (state handlers) or [`ReplyScope`] (reply handlers)
//! that appends to the engine-level buffers. This keeps the handler signature
//! a plain `fn` pointer with no captured context.

use heapless::{Deque, Vec};

use crate::core::{MAX_PENDING_REPLIES, MAX_PENDING_TRANSITS, MAX_QUEUED_EVENTS};

/// Which handler phase a [`Scope`] was created for. `transit` is only legal
/// during the event-handler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Handle,
    Enter,
    Exit,
}

/// Overflow markers for the fixed-capacity buffers. The engine reports and
/// clears these after each handler invocation; the overflowing item is
/// dropped rather than panicking.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OverflowFlags {
    pub(crate) events: bool,
    pub(crate) replies: bool,
    pub(crate) transits: bool,
}

impl OverflowFlags {
    pub(crate) fn clear(&mut self) {
        *self = OverflowFlags::default();
    }
}

/// The view handed to enter, exit, and event handlers.
#[derive(Debug)]
pub struct Scope<'s, S, R> {
    pub(crate) phase: Phase,
    pub(crate) transits: &'s mut Vec<S, MAX_PENDING_TRANSITS>,
    pub(crate) rejected: &'s mut Vec<S, MAX_PENDING_TRANSITS>,
    pub(crate) replies: &'s mut Deque<R, MAX_PENDING_REPLIES>,
    pub(crate) overflow: &'s mut OverflowFlags,
}

impl<S: Copy, R> Scope<'_, S, R> {
    /// Emit a reply to the host.
    ///
    /// During the event-handler phase replies are buffered and flushed
    /// between the exit and entry halves of the resulting transition (or at
    /// the end of the event if nothing transitions). During entry and exit
    /// phases the reply is dispatched as soon as the emitting handler
    /// returns.
    pub fn reply(&mut self, reply: R) {
        if self.replies.push_back(reply).is_err() {
            self.overflow.replies = true;
        }
    }

    /// Request a transition to `target`.
    ///
    /// All transits requested while one event is dispatched are collapsed
    /// into a single atomic transition. Only event handlers may transit;
    /// calls from enter or exit handlers are ignored and reported through
    /// [`ChartHooks::report_transition_error`].
    ///
    /// [`ChartHooks::report_transition_error`]: crate::core::ChartHooks::report_transition_error
    pub fn transit(&mut self, target: S) {
        match self.phase {
            Phase::Handle => {
                if self.transits.push(target).is_err() {
                    self.overflow.transits = true;
                }
            }
            Phase::Enter | Phase::Exit => {
                // Reported (and dropped) by the engine after the handler
                // returns; a second overflow here is not worth tracking.
                let _ = self.rejected.push(target);
            }
        }
    }
}

/// The view handed to the host's reply handlers.
#[derive(Debug)]
pub struct ReplyScope<'s, E, R> {
    pub(crate) events: &'s mut Deque<E, MAX_QUEUED_EVENTS>,
    pub(crate) replies: &'s mut Deque<R, MAX_PENDING_REPLIES>,
    pub(crate) overflow: &'s mut OverflowFlags,
}

impl<E, R> ReplyScope<'_, E, R> {
    /// Inject a follow-up event.
    ///
    /// An event is always in flight while a reply handler runs, so the event
    /// joins the FIFO reentrancy queue and is processed after the current
    /// event completes.
    pub fn process(&mut self, event: E) {
        if self.events.push_back(event).is_err() {
            self.overflow.events = true;
        }
    }

    /// Emit a further reply; it is dispatched after the current reply handler
    /// returns, in emission order.
    pub fn reply(&mut self, reply: R) {
        if self.replies.push_back(reply).is_err() {
            self.overflow.replies = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transit_outside_handle_phase_is_rejected() {
        let mut transits: Vec<u8, MAX_PENDING_TRANSITS> = Vec::new();
        let mut rejected: Vec<u8, MAX_PENDING_TRANSITS> = Vec::new();
        let mut replies: Deque<u8, MAX_PENDING_REPLIES> = Deque::new();
        let mut overflow = OverflowFlags::default();

        let mut scope = Scope {
            phase: Phase::Exit,
            transits: &mut transits,
            rejected: &mut rejected,
            replies: &mut replies,
            overflow: &mut overflow,
        };
        scope.transit(7);

        assert!(transits.is_empty());
        assert_eq!(rejected.as_slice(), &[7]);
    }

    #[test]
    fn reply_overflow_sets_flag_and_drops() {
        let mut transits: Vec<u8, MAX_PENDING_TRANSITS> = Vec::new();
        let mut rejected: Vec<u8, MAX_PENDING_TRANSITS> = Vec::new();
        let mut replies: Deque<u8, MAX_PENDING_REPLIES> = Deque::new();
        let mut overflow = OverflowFlags::default();

        let mut scope = Scope {
            phase: Phase::Handle,
            transits: &mut transits,
            rejected: &mut rejected,
            replies: &mut replies,
            overflow: &mut overflow,
        };
        for i in 0..=MAX_PENDING_REPLIES {
            scope.reply(i as u8);
        }

        assert_eq!(replies.len(), MAX_PENDING_REPLIES);
        assert!(overflow.replies);
    }
}
