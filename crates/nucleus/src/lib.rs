//! Nucleus: a discrete-event simulation kernel for agent-based modeling.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Nucleus sub-crates. For most users, adding `nucleus` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use nucleus::prelude::*;
//! use std::any::Any;
//!
//! // A data manager counting how many plans ran.
//! struct CounterData(u32);
//! impl PluginData for CounterData {
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! struct Counter(u32);
//! impl DataManager for Counter {
//!     fn init(&mut self, ctx: &mut Context) -> Result<(), ContractError> {
//!         for t in [1.0, 2.0, 3.0] {
//!             ctx.add_plan(Time(t), |ctx| {
//!                 ctx.data_manager::<Counter>()?.borrow_mut().0 += 1;
//!                 Ok(())
//!             })?;
//!         }
//!         Ok(())
//!     }
//!     fn checkpoint(&self, _ctx: &Context) -> Box<dyn PluginData> {
//!         Box::new(CounterData(self.0))
//!     }
//! }
//!
//! let plugin = Plugin::builder(PluginId("example.counter"))
//!     .with_initializer(|p| p.add_data_manager(Counter(0)))
//!     .build();
//! let mut output = Simulation::builder()
//!     .add_plugin(plugin)
//!     .record_state(true)
//!     .build()
//!     .execute()
//!     .unwrap();
//! let checkpoint = output.take::<Checkpoint>().pop().unwrap();
//! let data = checkpoint
//!     .plugins()
//!     .iter()
//!     .find_map(|p| p.data::<CounterData>())
//!     .unwrap();
//! assert_eq!(data.0, 3);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `nucleus-core` | IDs, simulation time, planner categories, error types |
//! | [`store`] | `nucleus-store` | Default-compressed property value containers |
//! | [`engine`] | `nucleus-engine` | Scheduler, dispatcher, orchestration, checkpoints |
//! | [`experiment`] | `nucleus-experiment` | Multi-scenario runner and report output |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, IDs, and errors (`nucleus-core`).
///
/// Contains [`types::Time`], the id newtypes, the [`types::Planner`]
/// categories, and the [`types::ContractError`] validation error.
pub use nucleus_core as types;

/// Property value containers (`nucleus-store`).
///
/// [`store::PropertyManager`] and the dense default-compressed stores
/// backing it ([`store::BoolStore`], [`store::IntStore`],
/// [`store::FloatStore`], [`store::DoubleStore`], [`store::ObjectStore`]).
pub use nucleus_store as store;

/// The simulation kernel (`nucleus-engine`).
///
/// [`engine::Simulation`] and [`engine::Context`] drive plan
/// scheduling, event dispatch, plugin orchestration, and
/// checkpoint/resume.
pub use nucleus_engine as engine;

/// Multi-scenario experiments (`nucleus-experiment`).
///
/// [`experiment::Experiment`] runs scenario replications on worker
/// threads and aggregates [`experiment::ReportRow`]s through a
/// [`experiment::ReportWriter`].
pub use nucleus_experiment as experiment;

/// Common imports for typical Nucleus usage.
///
/// ```rust
/// use nucleus::prelude::*;
/// ```
///
/// This imports the most frequently used types: the simulation and
/// plugin builders, the context, core ids and time, the event traits,
/// and the property manager.
pub mod prelude {
    // Core ids, time, and errors
    pub use nucleus_core::{
        ContractError, ErrorCode, LabelDimension, LabelKey, PlanKey, Planner, PluginId,
        PropertyId, ScenarioId, Time,
    };

    // Kernel surface
    pub use nucleus_engine::{
        Checkpoint, Context, DataManager, Event, EventLabeler, OutputBuffer, Plugin,
        PluginBuilder, PluginContext, PluginData, Simulation, SimulationBuilder, SimulationState,
    };

    // Property storage
    pub use nucleus_store::{PropertyDefinition, PropertyKind, PropertyManager, PropertyValue};

    // Experiments
    pub use nucleus_experiment::{Experiment, ReportRow, ReportWriter};
}
