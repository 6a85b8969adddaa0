//! Strongly-typed identifiers used across the kernel.
//!
//! Every id is an unsigned newtype, so the "no negative ids" invariant is
//! a compile-time guarantee rather than a runtime check. Entity indices
//! into property containers are plain `usize` values for the same reason.

use std::fmt;

/// Identifies a plugin within a simulation.
///
/// Plugin ids are declared statically by plugin authors and used by the
/// orchestrator to resolve dependency order. Two plugins in the same
/// simulation must not share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(pub &'static str);

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a property within a property manager.
///
/// Properties are defined at runtime and assigned ids by the defining
/// plugin. `PropertyId(n)` is stable for the lifetime of a run and across
/// checkpoint/resume boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub u32);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PropertyId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Cancellation key for a scheduled plan.
///
/// Plans registered with a key can be cancelled before execution via
/// `cancel_plan`. Keys are caller-chosen; at most one not-yet-executed
/// plan may hold a given key at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanKey(pub u64);

impl fmt::Display for PlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PlanKey {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies one labeler family on an event type.
///
/// A labeler registered under a dimension derives routing keys for that
/// dimension; subscribers filter on `(dimension, key)` pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelDimension(pub u32);

impl fmt::Display for LabelDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LabelDimension {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A routing key derived from an event or entity state.
///
/// Labelers map domain state (a region id, a property value, a group
/// membership) onto these integer keys so dispatch can index subscribers
/// instead of scanning them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelKey(pub u64);

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LabelKey {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies one scenario (replication) within an experiment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScenarioId(pub u32);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ScenarioId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
