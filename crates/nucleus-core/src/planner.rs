//! Plan origin categories.

use std::fmt;

/// The category of component that scheduled a plan.
///
/// Recorded on every queued plan and preserved across checkpoint/resume.
/// The scheduler's tie-break is a single global arrival sequence shared by
/// all categories, so equal-time plans execute in scheduling order
/// regardless of who scheduled them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Planner {
    /// Scheduled by actor-level logic (handlers, top-level callers).
    Actor,
    /// Scheduled by a data manager.
    DataManager,
    /// Scheduled by a report consumer.
    Report,
}

impl fmt::Display for Planner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor => write!(f, "actor"),
            Self::DataManager => write!(f, "data-manager"),
            Self::Report => write!(f, "report"),
        }
    }
}
