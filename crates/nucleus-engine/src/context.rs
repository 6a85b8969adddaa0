//! The simulation context: clock, plan queue, event channels, data
//! managers, and the output buffer, behind one mutable handle.
//!
//! Every plan callback and event handler receives `&mut Context` and
//! drives all state change through it. A context is single-threaded by
//! construction; reentrancy happens through the queue (a handler adds
//! plans or releases further events synchronously) rather than through
//! nested mutable borrows.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use nucleus_core::{
    ContractError, ErrorCode, LabelDimension, LabelKey, PlanKey, Planner, PluginId, Time,
};
use smallvec::SmallVec;

use crate::dispatch::{Dispatcher, Event, EventLabeler, HandlerFn};
use crate::output::OutputBuffer;
use crate::plugin::{DataManager, PluginData};
use crate::scheduler::{PlanCallback, PlanQueue, ScheduledPlan};

struct ManagerEntry {
    /// `Rc<RefCell<T>>` behind `dyn Any`, for typed retrieval.
    typed: Rc<dyn Any>,
    /// The same cell as a trait object, for lifecycle calls.
    dynamic: Rc<RefCell<dyn DataManager>>,
    plugin: PluginId,
    initialized: bool,
}

/// The mutable view of a running simulation.
pub struct Context {
    clock: Time,
    queue: PlanQueue,
    dispatcher: Dispatcher,
    managers: IndexMap<TypeId, ManagerEntry>,
    output: OutputBuffer,
    halted: bool,
    registration_open: bool,
}

impl Context {
    pub(crate) fn new(start_time: Time) -> Self {
        Self {
            clock: start_time,
            queue: PlanQueue::new(),
            dispatcher: Dispatcher::new(),
            managers: IndexMap::new(),
            output: OutputBuffer::new(),
            halted: false,
            registration_open: true,
        }
    }

    // ── Clock ──────────────────────────────────────────────────────

    /// The current simulation time.
    pub fn time(&self) -> Time {
        self.clock
    }

    pub(crate) fn set_clock(&mut self, time: Time) {
        debug_assert!(time >= self.clock, "clock never moves backward");
        self.clock = time;
    }

    // ── Plans ──────────────────────────────────────────────────────

    /// Schedule a plan in the [`Planner::Actor`] category.
    ///
    /// # Errors
    ///
    /// `NON_FINITE_PLAN_TIME` or `PAST_PLAN_TIME` on an invalid time.
    pub fn add_plan(
        &mut self,
        time: Time,
        callback: impl FnOnce(&mut Context) -> Result<(), ContractError> + 'static,
    ) -> Result<(), ContractError> {
        self.schedule_plan(Planner::Actor, time, None, Box::new(callback))
    }

    /// Schedule a cancellable plan in the [`Planner::Actor`] category.
    ///
    /// # Errors
    ///
    /// As [`add_plan`](Self::add_plan), plus `DUPLICATE_PLAN_KEY` if an
    /// active plan already holds `key`.
    pub fn add_keyed_plan(
        &mut self,
        time: Time,
        key: PlanKey,
        callback: impl FnOnce(&mut Context) -> Result<(), ContractError> + 'static,
    ) -> Result<(), ContractError> {
        self.schedule_plan(Planner::Actor, time, Some(key), Box::new(callback))
    }

    /// Schedule a plan under an explicit planner category.
    ///
    /// # Errors
    ///
    /// Rejects non-finite times, times before the current clock, and
    /// duplicate active keys. Nothing is enqueued on rejection.
    pub fn schedule_plan(
        &mut self,
        planner: Planner,
        time: Time,
        key: Option<PlanKey>,
        callback: PlanCallback,
    ) -> Result<(), ContractError> {
        self.queue.add(self.clock, time, planner, key, callback)
    }

    /// Cancel a not-yet-executed keyed plan. No-op for absent or
    /// already-executed keys.
    pub fn cancel_plan(&mut self, key: PlanKey) {
        self.queue.cancel(key);
    }

    /// Request a cooperative halt, observed before the next plan pops.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Whether a halt has been requested.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of plans still queued.
    pub fn plan_count(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn peek_plan_time(&mut self) -> Option<Time> {
        self.queue.peek_time()
    }

    pub(crate) fn pop_plan(&mut self) -> Option<ScheduledPlan> {
        self.queue.pop()
    }

    pub(crate) fn export_plans(&mut self) -> (Vec<ScheduledPlan>, u64) {
        std::mem::take(&mut self.queue).export()
    }

    pub(crate) fn restore_plans(&mut self, plans: Vec<ScheduledPlan>, next_seq: u64) {
        self.queue = PlanQueue::restore(plans, next_seq);
    }

    // ── Events ─────────────────────────────────────────────────────

    /// Subscribe a handler to every release of `E`.
    ///
    /// # Errors
    ///
    /// `REGISTRATION_CLOSED` outside plugin initialization.
    pub fn subscribe_to_event<E: Event>(
        &mut self,
        handler: impl Fn(&mut Context, &E) -> Result<(), ContractError> + 'static,
    ) -> Result<(), ContractError> {
        self.check_registration_open()?;
        self.dispatcher.subscribe::<E>(Rc::new(handler));
        Ok(())
    }

    /// Subscribe a handler to releases of `E` whose current label on
    /// `dimension` equals `key`.
    ///
    /// # Errors
    ///
    /// `REGISTRATION_CLOSED` outside plugin initialization.
    pub fn subscribe_to_labeled_event<E: Event>(
        &mut self,
        dimension: LabelDimension,
        key: LabelKey,
        handler: impl Fn(&mut Context, &E) -> Result<(), ContractError> + 'static,
    ) -> Result<(), ContractError> {
        self.check_registration_open()?;
        self.dispatcher
            .subscribe_labeled::<E>(dimension, key, Rc::new(handler));
        Ok(())
    }

    /// Register a labeler for `E`.
    ///
    /// # Errors
    ///
    /// `REGISTRATION_CLOSED` outside plugin initialization,
    /// `DUPLICATE_EVENT_LABELER` if the dimension is already served.
    pub fn add_event_labeler<E: Event>(
        &mut self,
        labeler: impl EventLabeler<E>,
    ) -> Result<(), ContractError> {
        self.check_registration_open()?;
        self.dispatcher.add_labeler::<E>(Rc::new(labeler))
    }

    /// Release an event to all matching subscribers, synchronously and
    /// in subscription order.
    ///
    /// For every labeler registered on `E`, the current label is
    /// computed from post-mutation state and the handlers subscribed to
    /// that exact `(dimension, key)` are merged with the unlabeled
    /// handlers by subscription sequence. Handlers may reenter the
    /// context (schedule plans, release further events).
    ///
    /// # Errors
    ///
    /// The first handler error aborts the release and propagates.
    pub fn release_event<E: Event>(&mut self, event: E) -> Result<(), ContractError> {
        let mut matched: SmallVec<[(u64, HandlerFn<E>); 8]> = SmallVec::new();
        let labelers: SmallVec<[Rc<dyn EventLabeler<E>>; 2]> = match self.dispatcher.channel::<E>()
        {
            Some(channel) => {
                matched.extend(
                    channel
                        .unlabeled
                        .iter()
                        .map(|s| (s.seq, Rc::clone(&s.handler))),
                );
                channel.labelers.iter().cloned().collect()
            }
            None => return Ok(()),
        };
        for labeler in labelers {
            let label = labeler.current_label(self, &event);
            if let Some(channel) = self.dispatcher.channel::<E>() {
                if let Some(subs) = channel.labeled.get(&(labeler.dimension(), label)) {
                    matched.extend(subs.iter().map(|s| (s.seq, Rc::clone(&s.handler))));
                }
            }
        }
        matched.sort_unstable_by_key(|(seq, _)| *seq);

        for (_, handler) in matched {
            handler(self, &event)?;
        }
        Ok(())
    }

    /// The current (post-mutation) label of `event` on `dimension`, if
    /// a labeler is registered for it.
    pub fn current_label<E: Event>(&self, dimension: LabelDimension, event: &E) -> Option<LabelKey> {
        self.dispatcher
            .labeler::<E>(dimension)
            .map(|l| l.current_label(self, event))
    }

    /// The label `event` carried immediately before its effect, if a
    /// labeler is registered for `dimension`.
    pub fn past_label<E: Event>(&self, dimension: LabelDimension, event: &E) -> Option<LabelKey> {
        self.dispatcher
            .labeler::<E>(dimension)
            .map(|l| l.past_label(self, event))
    }

    // ── Output ─────────────────────────────────────────────────────

    /// Release a typed output item for retrieval after the run.
    pub fn release_output<T: Any>(&mut self, item: T) {
        self.output.release(item);
    }

    pub(crate) fn into_output(self) -> OutputBuffer {
        self.output
    }

    // ── Data managers ──────────────────────────────────────────────

    /// Retrieve the initialized data manager of type `T`.
    ///
    /// The returned handle is for the duration of one callback; holding
    /// it across callbacks defeats resume reconstruction and is never
    /// necessary.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_DATA_MANAGER` if `T` was never registered or is not yet
    /// initialized.
    pub fn data_manager<T: DataManager>(&self) -> Result<Rc<RefCell<T>>, ContractError> {
        let entry = self
            .managers
            .get(&TypeId::of::<T>())
            .filter(|e| e.initialized)
            .ok_or_else(|| {
                ContractError::with_detail(
                    ErrorCode::UnknownDataManager,
                    std::any::type_name::<T>(),
                )
            })?;
        Rc::clone(&entry.typed).downcast::<RefCell<T>>().map_err(|_| {
            ContractError::with_detail(ErrorCode::UnknownDataManager, std::any::type_name::<T>())
        })
    }

    pub(crate) fn register_manager<T: DataManager>(
        &mut self,
        plugin: PluginId,
        manager: T,
    ) -> Result<(), ContractError> {
        let type_id = TypeId::of::<T>();
        if self.managers.contains_key(&type_id) {
            return Err(ContractError::with_detail(
                ErrorCode::DuplicateDataManager,
                std::any::type_name::<T>(),
            ));
        }
        let cell = Rc::new(RefCell::new(manager));
        let typed: Rc<dyn Any> = cell.clone();
        let dynamic: Rc<RefCell<dyn DataManager>> = cell;
        self.managers.insert(
            type_id,
            ManagerEntry {
                typed,
                dynamic,
                plugin,
                initialized: false,
            },
        );
        Ok(())
    }

    /// Uninitialized managers in registration order.
    pub(crate) fn pending_managers(&self) -> Vec<(TypeId, Rc<RefCell<dyn DataManager>>)> {
        self.managers
            .iter()
            .filter(|(_, e)| !e.initialized)
            .map(|(tid, e)| (*tid, Rc::clone(&e.dynamic)))
            .collect()
    }

    pub(crate) fn mark_initialized(&mut self, type_id: TypeId) {
        if let Some(entry) = self.managers.get_mut(&type_id) {
            entry.initialized = true;
        }
    }

    /// A checkpoint snapshot from every initialized manager, in
    /// registration order.
    pub(crate) fn manager_snapshots(&self) -> Vec<(PluginId, Box<dyn PluginData>)> {
        self.managers
            .values()
            .filter(|e| e.initialized)
            .map(|e| (e.plugin, e.dynamic.borrow().checkpoint(self)))
            .collect()
    }

    // ── Registration window ────────────────────────────────────────

    pub(crate) fn close_registration(&mut self) {
        self.registration_open = false;
    }

    fn check_registration_open(&self) -> Result<(), ContractError> {
        if self.registration_open {
            Ok(())
        } else {
            Err(ErrorCode::RegistrationClosed.into())
        }
    }
}
