//! Time-ordered plan queue with deterministic tie-breaking.
//!
//! [`PlanQueue`] holds deferred callbacks ("plans") ordered by the
//! composite key `(time, arrival_seq)`. The arrival sequence is a
//! monotonic counter assigned at insertion, so equal-time plans execute
//! in the order they were scheduled — the property that makes two runs
//! with the same inputs, or one run split by pause/resume boundaries,
//! bit-identical.
//!
//! Keyed cancellation is lazy: a cancelled plan leaves a tombstone in
//! the heap that [`pop()`](PlanQueue::pop) skips, rather than paying for
//! heap surgery at cancel time.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;

use nucleus_core::{ContractError, ErrorCode, PlanKey, Planner, Time};

use crate::context::Context;

/// The deferred callback carried by a plan.
///
/// Callbacks must not capture data-manager handles; cross-manager access
/// goes through [`Context::data_manager`] so that resumed runs rebuild
/// the same reference graph.
pub type PlanCallback = Box<dyn FnOnce(&mut Context) -> Result<(), ContractError>>;

/// A plan popped from, or exported out of, the queue.
///
/// Export preserves the arrival sequence so a restored queue continues
/// the identical total order.
pub struct ScheduledPlan {
    /// Scheduled execution time.
    pub time: Time,
    /// Who scheduled the plan.
    pub planner: Planner,
    /// Cancellation key, if the plan was keyed.
    pub key: Option<PlanKey>,
    /// Arrival sequence assigned at original insertion.
    pub arrival_seq: u64,
    /// The opaque plan payload.
    pub(crate) callback: PlanCallback,
}

impl fmt::Debug for ScheduledPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledPlan")
            .field("time", &self.time)
            .field("planner", &self.planner)
            .field("key", &self.key)
            .field("arrival_seq", &self.arrival_seq)
            .finish_non_exhaustive()
    }
}

/// Heap entry. Ordering is reversed so the `BinaryHeap` max-heap yields
/// the smallest `(time, arrival_seq)` first.
struct QueuedPlan {
    time: Time,
    arrival_seq: u64,
    planner: Planner,
    key: Option<PlanKey>,
    callback: PlanCallback,
}

impl PartialEq for QueuedPlan {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.arrival_seq == other.arrival_seq
    }
}

impl Eq for QueuedPlan {}

impl PartialOrd for QueuedPlan {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedPlan {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.arrival_seq.cmp(&self.arrival_seq))
    }
}

/// Time-ordered queue of deferred plans.
pub struct PlanQueue {
    heap: BinaryHeap<QueuedPlan>,
    /// Active keys → arrival sequence of the plan holding the key.
    keyed: HashMap<PlanKey, u64>,
    /// Arrival sequences of cancelled plans still sitting in the heap.
    cancelled: HashSet<u64>,
    next_seq: u64,
    live: usize,
}

impl PlanQueue {
    /// An empty queue starting at arrival sequence zero.
    pub fn new() -> Self {
        Self::with_sequence(0)
    }

    /// An empty queue whose next arrival sequence is `next_seq`.
    ///
    /// Used on resume so plans added after the pause continue the total
    /// order the paused run established.
    pub(crate) fn with_sequence(next_seq: u64) -> Self {
        Self {
            heap: BinaryHeap::new(),
            keyed: HashMap::new(),
            cancelled: HashSet::new(),
            next_seq,
            live: 0,
        }
    }

    /// Add a plan.
    ///
    /// `clock` is the current simulation time; plans may not be
    /// scheduled in the past.
    ///
    /// # Errors
    ///
    /// `NON_FINITE_PLAN_TIME` for NaN/infinite times, `PAST_PLAN_TIME`
    /// if `time < clock`, `DUPLICATE_PLAN_KEY` if an active plan
    /// already holds `key`. Nothing is enqueued on rejection.
    pub fn add(
        &mut self,
        clock: Time,
        time: Time,
        planner: Planner,
        key: Option<PlanKey>,
        callback: PlanCallback,
    ) -> Result<(), ContractError> {
        if !time.is_valid_plan_time() {
            return Err(ContractError::with_detail(
                ErrorCode::NonFinitePlanTime,
                format!("time {time}"),
            ));
        }
        if time < clock {
            return Err(ContractError::with_detail(
                ErrorCode::PastPlanTime,
                format!("time {time} < clock {clock}"),
            ));
        }
        if let Some(key) = key {
            if self.keyed.contains_key(&key) {
                return Err(ContractError::with_detail(
                    ErrorCode::DuplicatePlanKey,
                    format!("key {key}"),
                ));
            }
        }

        let arrival_seq = self.next_seq;
        self.next_seq += 1;
        if let Some(key) = key {
            self.keyed.insert(key, arrival_seq);
        }
        self.heap.push(QueuedPlan {
            time,
            arrival_seq,
            planner,
            key,
            callback,
        });
        self.live += 1;
        Ok(())
    }

    /// Cancel the not-yet-executed plan holding `key`.
    ///
    /// No-op if the key is absent (never scheduled, already executed,
    /// or already cancelled).
    pub fn cancel(&mut self, key: PlanKey) {
        if let Some(arrival_seq) = self.keyed.remove(&key) {
            self.cancelled.insert(arrival_seq);
            self.live -= 1;
        }
    }

    /// Pop the plan with the smallest `(time, arrival_seq)`.
    pub fn pop(&mut self) -> Option<ScheduledPlan> {
        while let Some(plan) = self.heap.pop() {
            if self.cancelled.remove(&plan.arrival_seq) {
                continue;
            }
            if let Some(key) = plan.key {
                self.keyed.remove(&key);
            }
            self.live -= 1;
            return Some(ScheduledPlan {
                time: plan.time,
                planner: plan.planner,
                key: plan.key,
                arrival_seq: plan.arrival_seq,
                callback: plan.callback,
            });
        }
        None
    }

    /// The time of the next live plan, without popping it.
    ///
    /// Takes `&mut self` because cancelled tombstones encountered at the
    /// top of the heap are discarded on the way.
    pub fn peek_time(&mut self) -> Option<Time> {
        loop {
            let top = self.heap.peek()?;
            if self.cancelled.contains(&top.arrival_seq) {
                let plan = self.heap.pop().expect("peeked entry exists");
                self.cancelled.remove(&plan.arrival_seq);
                continue;
            }
            return Some(top.time);
        }
    }

    /// Number of live (not cancelled) plans.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no live plans remain.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The arrival sequence the next added plan will receive.
    pub fn next_sequence(&self) -> u64 {
        self.next_seq
    }

    /// Drain the queue into `(time, arrival_seq)` order for checkpointing,
    /// together with the arrival-sequence counter.
    pub(crate) fn export(mut self) -> (Vec<ScheduledPlan>, u64) {
        let next_seq = self.next_seq;
        let mut plans = Vec::with_capacity(self.live);
        while let Some(plan) = self.pop() {
            plans.push(plan);
        }
        (plans, next_seq)
    }

    /// Rebuild a queue from a checkpoint snapshot.
    ///
    /// Restored plans keep their original arrival sequences; freshly
    /// added plans continue from `next_seq`.
    pub(crate) fn restore(plans: Vec<ScheduledPlan>, next_seq: u64) -> Self {
        let mut queue = Self::with_sequence(next_seq);
        for plan in plans {
            if let Some(key) = plan.key {
                queue.keyed.insert(key, plan.arrival_seq);
            }
            queue.heap.push(QueuedPlan {
                time: plan.time,
                arrival_seq: plan.arrival_seq,
                planner: plan.planner,
                key: plan.key,
                callback: plan.callback,
            });
            queue.live += 1;
        }
        queue
    }
}

impl Default for PlanQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> PlanCallback {
        Box::new(|_| Ok(()))
    }

    fn add(queue: &mut PlanQueue, time: f64) {
        queue
            .add(Time::START, Time(time), Planner::Actor, None, noop())
            .unwrap();
    }

    #[test]
    fn pops_in_time_order() {
        let mut queue = PlanQueue::new();
        add(&mut queue, 3.0);
        add(&mut queue, 1.0);
        add(&mut queue, 2.0);
        let times: Vec<f64> = std::iter::from_fn(|| queue.pop().map(|p| p.time.0)).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn equal_times_break_ties_by_insertion() {
        let mut queue = PlanQueue::new();
        for _ in 0..5 {
            add(&mut queue, 2.0);
        }
        let seqs: Vec<u64> =
            std::iter::from_fn(|| queue.pop().map(|p| p.arrival_seq)).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cross_planner_ties_use_the_same_sequence() {
        let mut queue = PlanQueue::new();
        queue
            .add(Time::START, Time(1.0), Planner::DataManager, None, noop())
            .unwrap();
        queue
            .add(Time::START, Time(1.0), Planner::Actor, None, noop())
            .unwrap();
        assert_eq!(queue.pop().unwrap().planner, Planner::DataManager);
        assert_eq!(queue.pop().unwrap().planner, Planner::Actor);
    }

    #[test]
    fn past_time_rejected_without_enqueue() {
        let mut queue = PlanQueue::new();
        let err = queue
            .add(Time(5.0), Time(4.0), Planner::Actor, None, noop())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PastPlanTime);
        assert!(queue.is_empty());
        assert_eq!(queue.next_sequence(), 0);
    }

    #[test]
    fn non_finite_time_rejected() {
        let mut queue = PlanQueue::new();
        for bad in [f64::NAN, f64::INFINITY] {
            let err = queue
                .add(Time::START, Time(bad), Planner::Actor, None, noop())
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::NonFinitePlanTime);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_keyed_plan_never_pops() {
        let mut queue = PlanQueue::new();
        add(&mut queue, 1.0);
        queue
            .add(
                Time::START,
                Time(2.0),
                Planner::Actor,
                Some(PlanKey(7)),
                noop(),
            )
            .unwrap();
        add(&mut queue, 3.0);
        queue.cancel(PlanKey(7));
        assert_eq!(queue.len(), 2);
        let times: Vec<f64> = std::iter::from_fn(|| queue.pop().map(|p| p.time.0)).collect();
        assert_eq!(times, vec![1.0, 3.0]);
    }

    #[test]
    fn cancel_is_noop_for_executed_or_absent_keys() {
        let mut queue = PlanQueue::new();
        queue
            .add(
                Time::START,
                Time(1.0),
                Planner::Actor,
                Some(PlanKey(1)),
                noop(),
            )
            .unwrap();
        assert!(queue.pop().is_some());
        queue.cancel(PlanKey(1));
        queue.cancel(PlanKey(99));
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_key_rejected_until_released() {
        let mut queue = PlanQueue::new();
        queue
            .add(
                Time::START,
                Time(1.0),
                Planner::Actor,
                Some(PlanKey(1)),
                noop(),
            )
            .unwrap();
        let err = queue
            .add(
                Time::START,
                Time(2.0),
                Planner::Actor,
                Some(PlanKey(1)),
                noop(),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicatePlanKey);
        // Executing the holder releases the key.
        queue.pop().unwrap();
        queue
            .add(
                Time::START,
                Time(2.0),
                Planner::Actor,
                Some(PlanKey(1)),
                noop(),
            )
            .unwrap();
    }

    #[test]
    fn peek_skips_cancelled_tombstones() {
        let mut queue = PlanQueue::new();
        queue
            .add(
                Time::START,
                Time(1.0),
                Planner::Actor,
                Some(PlanKey(1)),
                noop(),
            )
            .unwrap();
        add(&mut queue, 2.0);
        queue.cancel(PlanKey(1));
        assert_eq!(queue.peek_time(), Some(Time(2.0)));
    }

    #[test]
    fn export_restore_preserves_order_and_sequence() {
        let mut queue = PlanQueue::new();
        add(&mut queue, 2.0);
        add(&mut queue, 1.0);
        add(&mut queue, 2.0);
        let (plans, next_seq) = queue.export();
        assert_eq!(next_seq, 3);
        assert_eq!(
            plans.iter().map(|p| p.arrival_seq).collect::<Vec<_>>(),
            vec![1, 0, 2]
        );

        let mut restored = PlanQueue::restore(plans, next_seq);
        assert_eq!(restored.next_sequence(), 3);
        add(&mut restored, 2.0);
        // The new plan (seq 3) sorts after the restored equal-time plans.
        let seqs: Vec<u64> =
            std::iter::from_fn(|| restored.pop().map(|p| p.arrival_seq)).collect();
        assert_eq!(seqs, vec![1, 0, 2, 3]);
    }

    // ── proptest ───────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn drain_is_sorted_by_time_then_arrival(
                times in prop::collection::vec(0u32..20, 1..64),
            ) {
                let mut queue = PlanQueue::new();
                for t in &times {
                    queue
                        .add(Time::START, Time(f64::from(*t)), Planner::Actor, None, Box::new(|_| Ok(())))
                        .unwrap();
                }
                let mut drained = Vec::new();
                while let Some(plan) = queue.pop() {
                    drained.push((plan.time, plan.arrival_seq));
                }
                prop_assert_eq!(drained.len(), times.len());
                for window in drained.windows(2) {
                    prop_assert!(window[0] < window[1], "order violated: {:?}", window);
                }
            }
        }
    }
}
