//! Simulation time.

use std::fmt;

/// A point on the simulation clock.
///
/// Simulation time is a continuous `f64`; it has no relationship to
/// wall-clock time. The kernel orders plans by `(Time, arrival sequence)`, so
/// `Time` carries a total order via [`f64::total_cmp`].
///
/// Plan times must be finite — the scheduler rejects NaN and infinite
/// times at `add_plan`, so ordinary comparisons on queued times never see
/// the exotic `total_cmp` cases.
#[derive(Clone, Copy, Debug)]
pub struct Time(pub f64);

impl Time {
    /// The clock value at the start of an uninterrupted run.
    pub const START: Time = Time(0.0);

    /// Whether this is a usable plan time (finite, not NaN).
    pub fn is_valid_plan_time(self) -> bool {
        self.0.is_finite()
    }
}

// Equality follows `total_cmp` so the `PartialEq`/`Eq`/`Ord` trio stays
// coherent on the exotic values (`NAN == NAN`, `0.0 != -0.0`).
impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for Time {
    fn from(v: f64) -> Self {
        Self(v)
    }
}
