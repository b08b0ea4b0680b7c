// Copyright 2025 The braid project developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg_attr(not(feature = "std"), no_std)]

//! # Braid
//! A Rust library for hierarchical state charts with first-class parallel
//! (orthogonal) regions and *joint states*: pseudo-states that become active
//! whenever a declared set of guard states elsewhere in the tree are all
//! active at once.
//!
//! The chart is declared as a static table of [`StateNode`] records and driven
//! through [`StateChart::process`]. State handlers communicate with the host
//! exclusively through *replies*, keeping state-machine logic free of
//! side-effecting application code. `no_std` compatible; all runtime buffers
//! are fixed-capacity `heapless` collections.

pub mod core;

// Re-export key types/traits for easier use by consumers of the crate.
pub use crate::core::ChartDefinition;
pub use crate::core::ChartHooks;
pub use crate::core::ConfigError;
pub use crate::core::DefaultHooks;
pub use crate::core::Event;
pub use crate::core::ProcessResult;
pub use crate::core::Reply;
pub use crate::core::ReplyScope;
pub use crate::core::Scope;
pub use crate::core::StateChart;
pub use crate::core::StateKind;
pub use crate::core::StateNode;
pub use crate::core::MAX_ACTIVE_REGIONS;

pub mod prelude {
    pub use crate::core::{
        ChartDefinition, ChartHooks, DefaultHooks, EnterExitHandler, Event, EventHandler,
        ProcessResult, Reply, ReplyHandler, StateChart, StateKind, StateNode,
    };
}
