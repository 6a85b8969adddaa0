//! Multi-scenario experiment execution for Nucleus.
//!
//! An [`Experiment`] runs independent scenario replications, each on
//! its own worker thread with its own simulation instance, and
//! aggregates the typed [`ReportRow`] output into one tab-delimited
//! report with all writes serialized through a single
//! [`ReportWriter`]. [`retain_completed`] supports resuming a partially
//! finished experiment without duplicating rows.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod report;
pub mod runner;

pub use error::ExperimentError;
pub use report::{retain_completed, ReportRow, ReportWriter};
pub use runner::{Experiment, ScenarioFactory};
