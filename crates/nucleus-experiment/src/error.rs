//! Experiment-level error types.

use std::fmt;
use std::io;

use nucleus_core::{ContractError, ScenarioId};

/// Errors that can occur while running an experiment or writing its
/// report.
#[derive(Debug)]
pub enum ExperimentError {
    /// An I/O error occurred while writing or filtering a report.
    Io(io::Error),
    /// A scenario's simulation rejected a call or failed a callback.
    Scenario {
        /// The scenario whose run failed.
        scenario: ScenarioId,
        /// The underlying kernel error.
        source: ContractError,
    },
    /// A report row carried the wrong number of fields.
    ColumnMismatch {
        /// Columns declared when the writer was created.
        expected: usize,
        /// Fields in the offending row.
        found: usize,
    },
    /// A report line could not be parsed during resume filtering.
    MalformedRow {
        /// 1-based line number within the report.
        line: usize,
    },
    /// A worker thread disconnected before delivering its results.
    WorkerLost,
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "report I/O error: {e}"),
            Self::Scenario { scenario, source } => {
                write!(f, "scenario {scenario} failed: {source}")
            }
            Self::ColumnMismatch { expected, found } => {
                write!(f, "report row has {found} fields, writer declares {expected} columns")
            }
            Self::MalformedRow { line } => {
                write!(f, "report line {line} has no parseable scenario id")
            }
            Self::WorkerLost => write!(f, "a scenario worker disconnected before finishing"),
        }
    }
}

impl std::error::Error for ExperimentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Scenario { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for ExperimentError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
