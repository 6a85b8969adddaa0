//! Core types for the Nucleus discrete-event simulation kernel.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental vocabulary used throughout the Nucleus workspace:
//! typed ids, simulation time, planner categories, label routing keys,
//! and the kernel's single validation-failure error kind.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod planner;
pub mod time;

pub use error::{ContractError, ErrorCode};
pub use id::{LabelDimension, LabelKey, PlanKey, PluginId, PropertyId, ScenarioId};
pub use planner::Planner;
pub use time::Time;
