//! Event and reply classification.
//!
//! Typed handlers are selected by *kind*: a host-declared tag that identifies
//! the event (or reply) type without its payload. For a C-like enum the kind
//! is simply the enum itself:
//!
//! ```rust
//! use braid_core::Event;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum PlayerEvent {
//!     Play,
//!     Stop,
//! }
//!
//! impl Event for PlayerEvent {
//!     type Kind = Self;
//!     fn kind(&self) -> Self { *self }
//! }
//! ```
//!
//! Enums with payloads declare a parallel fieldless enum as their kind, which
//! is the discriminant-tag realisation of typed dispatch. Matching is exact:
//! there is no subtype relation between kinds.

use core::fmt;

/// An event injected into the chart through [`StateChart::process`].
///
/// Events are cloned into the reentrancy queue, so `Clone` is required; the
/// diagnostics hooks format events with `Debug`.
///
/// [`StateChart::process`]: crate::core::StateChart::process
pub trait Event: Clone + fmt::Debug {
    /// Tag identifying this event's type for handler selection.
    type Kind: Copy + PartialEq + fmt::Debug;

    /// The kind of this particular event instance.
    fn kind(&self) -> Self::Kind;
}

/// An opaque value emitted by state handlers for the host to react to.
///
/// Replies decouple state-machine logic from application side effects: a
/// handler calls [`Scope::reply`] and the host's matching reply handler runs
/// at a well-defined point in the event pipeline.
///
/// [`Scope::reply`]: crate::core::Scope::reply
pub trait Reply: fmt::Debug {
    /// Tag identifying this reply's type for reply-handler selection.
    type Kind: Copy + PartialEq + fmt::Debug;

    /// The kind of this particular reply instance.
    fn kind(&self) -> Self::Kind;
}
