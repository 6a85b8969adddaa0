//! Simulation assembly and the drain loop.

use nucleus_core::{ContractError, Time};

use crate::context::Context;
use crate::continuity::{capture, Checkpoint, SimulationState};
use crate::orchestrator::initialize_plugins;
use crate::output::OutputBuffer;
use crate::plugin::Plugin;

/// Builder for a [`Simulation`].
///
/// A fresh run starts from [`add_plugin`](Self::add_plugin) calls; a
/// continued run starts from [`resume_from`](Self::resume_from) with a
/// [`Checkpoint`] captured by a previous run.
pub struct SimulationBuilder {
    plugins: Vec<Plugin>,
    state: Option<SimulationState>,
    halt_time: Option<Time>,
    record_state: bool,
}

impl SimulationBuilder {
    /// A builder with no plugins, starting at [`Time::START`].
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            state: None,
            halt_time: None,
            record_state: false,
        }
    }

    /// Add a plugin. Orchestration orders plugins by dependency, with
    /// addition order breaking ties.
    pub fn add_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Continue from a captured checkpoint: the checkpoint's plugins
    /// replace any added so far and the clock and plan queue resume
    /// where the previous run halted.
    pub fn resume_from(mut self, checkpoint: Checkpoint) -> Self {
        self.plugins = checkpoint.plugins;
        self.state = Some(checkpoint.state);
        self
    }

    /// Halt once the next plan's time would exceed `time`. The clock
    /// is advanced to `time` at the halt boundary; plans at exactly
    /// `time` still execute.
    pub fn with_halt_time(mut self, time: Time) -> Self {
        self.halt_time = Some(time);
        self
    }

    /// Capture a [`Checkpoint`] into the output when the run ends, for
    /// any termination cause.
    pub fn record_state(mut self, record: bool) -> Self {
        self.record_state = record;
        self
    }

    /// Finish building.
    pub fn build(self) -> Simulation {
        Simulation {
            plugins: self.plugins,
            state: self.state,
            halt_time: self.halt_time,
            record_state: self.record_state,
        }
    }
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A single simulation run: plugins, optional resume state, and halt
/// policy.
pub struct Simulation {
    plugins: Vec<Plugin>,
    state: Option<SimulationState>,
    halt_time: Option<Time>,
    record_state: bool,
}

impl Simulation {
    /// Start building a simulation.
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Run to completion and return the released output.
    ///
    /// Initializes plugins in dependency order, closes registration,
    /// then drains plans in `(time, arrival)` order until the queue is
    /// empty, a handler calls halt, or the halt time is crossed. If
    /// state recording is enabled, a [`Checkpoint`] is released into
    /// the output at termination.
    ///
    /// # Errors
    ///
    /// Orchestration failures, and any error returned by a plan
    /// callback or event handler. A callback error is simulation-fatal:
    /// the failing plan is already consumed and the run stops where it
    /// stood.
    pub fn execute(self) -> Result<OutputBuffer, ContractError> {
        let start = match &self.state {
            Some(state) => state.start_time,
            None => Time::START,
        };
        let mut ctx = Context::new(start);
        if let Some(state) = self.state {
            ctx.restore_plans(state.plans, state.next_arrival_seq);
        }
        let records = initialize_plugins(&mut ctx, self.plugins)?;
        ctx.close_registration();

        drain(&mut ctx, self.halt_time)?;

        if self.record_state {
            let checkpoint = capture(&mut ctx, &records);
            ctx.release_output(checkpoint);
        }
        Ok(ctx.into_output())
    }
}

fn drain(ctx: &mut Context, halt_time: Option<Time>) -> Result<(), ContractError> {
    loop {
        if ctx.is_halted() {
            return Ok(());
        }
        let next = match ctx.peek_plan_time() {
            Some(time) => time,
            None => return Ok(()),
        };
        if let Some(limit) = halt_time {
            if next > limit {
                if limit > ctx.time() {
                    ctx.set_clock(limit);
                }
                ctx.halt();
                return Ok(());
            }
        }
        let plan = match ctx.pop_plan() {
            Some(plan) => plan,
            None => return Ok(()),
        };
        ctx.set_clock(plan.time);
        (plan.callback)(ctx)?;
    }
}
