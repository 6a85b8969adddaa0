//! Plan scheduler, event dispatch, and plugin orchestration for Nucleus.
//!
//! This crate is the kernel proper: the time-ordered [`PlanQueue`], the
//! typed publish/subscribe dispatcher, the [`Context`] that owns all
//! per-run state, the plugin/data-manager orchestrator, and the
//! checkpoint/resume ("run continuity") machinery.
//!
//! A run is single-threaded by construction: the drain loop inside
//! [`Simulation::execute`] is the only driver of state mutation, and
//! event dispatch is synchronous, re-entrant, in-order callback
//! invocation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod continuity;
pub mod dispatch;
mod orchestrator;
pub mod output;
pub mod plugin;
pub mod scheduler;
pub mod simulation;

pub use context::Context;
pub use continuity::{Checkpoint, SimulationState};
pub use dispatch::{Event, EventLabeler};
pub use output::OutputBuffer;
pub use plugin::{DataManager, Plugin, PluginBuilder, PluginContext, PluginData};
pub use scheduler::{PlanCallback, PlanQueue, ScheduledPlan};
pub use simulation::{Simulation, SimulationBuilder};
