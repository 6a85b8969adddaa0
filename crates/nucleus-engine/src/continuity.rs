//! Checkpointing and run continuity.
//!
//! A [`Checkpoint`] captures everything a halted run needs to continue:
//! the scheduler-level [`SimulationState`] (clock, outstanding plans,
//! arrival counter) and the plugin set rebuilt around each data
//! manager's finalized snapshot. Resuming re-runs orchestration from
//! those plugins and restores the plan queue, so a resumed run and an
//! uninterrupted run are indistinguishable downstream.

use std::fmt;

use nucleus_core::Time;

use crate::context::Context;
use crate::orchestrator::{rebuild_plugins, PluginRecord};
use crate::plugin::Plugin;
use crate::scheduler::ScheduledPlan;

/// The scheduler-level checkpoint: clock, outstanding plans, and the
/// next arrival-sequence value.
///
/// Carrying the arrival counter across the boundary keeps the total
/// plan order of a resumed run identical to the uninterrupted run:
/// plans added after resume continue the same sequence.
pub struct SimulationState {
    pub(crate) start_time: Time,
    pub(crate) plans: Vec<ScheduledPlan>,
    pub(crate) next_arrival_seq: u64,
}

impl SimulationState {
    /// The clock value the resumed run starts from.
    pub fn start_time(&self) -> Time {
        self.start_time
    }

    /// Number of outstanding plans captured.
    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    /// The arrival-sequence value the resumed queue continues from.
    pub fn next_arrival_sequence(&self) -> u64 {
        self.next_arrival_seq
    }
}

impl fmt::Debug for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationState")
            .field("start_time", &self.start_time)
            .field("plans", &self.plans.len())
            .field("next_arrival_seq", &self.next_arrival_seq)
            .finish()
    }
}

/// A complete halt-boundary capture: simulation state plus the plugin
/// set to re-orchestrate from.
pub struct Checkpoint {
    pub(crate) state: SimulationState,
    pub(crate) plugins: Vec<Plugin>,
}

impl Checkpoint {
    /// The captured scheduler state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The rebuilt plugins, in initialization order.
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }
}

impl fmt::Debug for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkpoint")
            .field("state", &self.state)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

/// Capture a checkpoint from a halted context.
///
/// Manager snapshots are taken before the plan queue is drained out of
/// the context, so a snapshot hook observing `plan_count` sees the
/// queue as it stood at halt.
pub(crate) fn capture(ctx: &mut Context, records: &[PluginRecord]) -> Checkpoint {
    let snapshots = ctx.manager_snapshots();
    let (plans, next_arrival_seq) = ctx.export_plans();
    Checkpoint {
        state: SimulationState {
            start_time: ctx.time(),
            plans,
            next_arrival_seq,
        },
        plugins: rebuild_plugins(records, snapshots),
    }
}
