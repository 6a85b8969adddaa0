//! Typed publish/subscribe event dispatch with label-indexed routing.
//!
//! Subscribers register against an event type, optionally filtered to a
//! `(dimension, key)` label. Labelers derive routing keys from the event
//! and current entity state, so dispatch indexes the exact subscriber
//! buckets instead of scanning every subscription.
//!
//! Invocation order is subscription order: every subscription carries a
//! global sequence number, and the labeled and unlabeled matches for one
//! release are merged by that sequence before any handler runs.

use std::any::{Any, TypeId};
use std::rc::Rc;

use indexmap::IndexMap;
use nucleus_core::{ContractError, ErrorCode, LabelDimension, LabelKey};

use crate::context::Context;

/// Marker trait for event types.
///
/// Events are immutable records describing a state transition, carrying
/// before/after values where relevant. They are created by a data-manager
/// mutation *after* the mutation is applied, so handlers always observe
/// post-transition state ("mutation precedes dispatch").
pub trait Event: 'static {}

/// Derives routing keys for one dimension of an event type.
///
/// `current_label` computes the key from the already-mutated state;
/// `past_label` recomputes what the key was immediately before the
/// event's effect. The two must be consistent: for every entity affected
/// by an event, the past and current keys differ exactly when the
/// entity's routing key actually changed.
pub trait EventLabeler<E: Event>: 'static {
    /// The dimension this labeler serves.
    fn dimension(&self) -> LabelDimension;

    /// The routing key derived from current (post-mutation) state.
    fn current_label(&self, ctx: &Context, event: &E) -> LabelKey;

    /// The routing key as it was immediately before the event's effect.
    fn past_label(&self, ctx: &Context, event: &E) -> LabelKey;
}

pub(crate) type HandlerFn<E> = Rc<dyn Fn(&mut Context, &E) -> Result<(), ContractError>>;

pub(crate) struct Subscription<E> {
    pub(crate) seq: u64,
    pub(crate) handler: HandlerFn<E>,
}

/// All subscriptions and labelers for one event type.
pub(crate) struct EventChannel<E: Event> {
    pub(crate) unlabeled: Vec<Subscription<E>>,
    pub(crate) labeled: IndexMap<(LabelDimension, LabelKey), Vec<Subscription<E>>>,
    pub(crate) labelers: Vec<Rc<dyn EventLabeler<E>>>,
}

impl<E: Event> EventChannel<E> {
    fn new() -> Self {
        Self {
            unlabeled: Vec::new(),
            labeled: IndexMap::new(),
            labelers: Vec::new(),
        }
    }
}

/// Type-keyed registry of event channels.
pub(crate) struct Dispatcher {
    channels: IndexMap<TypeId, Box<dyn Any>>,
    next_seq: u64,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self {
            channels: IndexMap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn channel<E: Event>(&self) -> Option<&EventChannel<E>> {
        self.channels
            .get(&TypeId::of::<E>())
            .map(|b| b.downcast_ref().expect("channel keyed by event type"))
    }

    fn channel_mut<E: Event>(&mut self) -> &mut EventChannel<E> {
        self.channels
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(EventChannel::<E>::new()))
            .downcast_mut()
            .expect("channel keyed by event type")
    }

    /// Register an unfiltered handler for `E`.
    pub(crate) fn subscribe<E: Event>(&mut self, handler: HandlerFn<E>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.channel_mut::<E>()
            .unlabeled
            .push(Subscription { seq, handler });
    }

    /// Register a handler for `E` filtered to one label.
    pub(crate) fn subscribe_labeled<E: Event>(
        &mut self,
        dimension: LabelDimension,
        key: LabelKey,
        handler: HandlerFn<E>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.channel_mut::<E>()
            .labeled
            .entry((dimension, key))
            .or_default()
            .push(Subscription { seq, handler });
    }

    /// Register a labeler for `E`.
    ///
    /// # Errors
    ///
    /// `DUPLICATE_EVENT_LABELER` if a labeler for the same dimension is
    /// already registered on this event type.
    pub(crate) fn add_labeler<E: Event>(
        &mut self,
        labeler: Rc<dyn EventLabeler<E>>,
    ) -> Result<(), ContractError> {
        let channel = self.channel_mut::<E>();
        let dimension = labeler.dimension();
        if channel.labelers.iter().any(|l| l.dimension() == dimension) {
            return Err(ContractError::with_detail(
                ErrorCode::DuplicateEventLabeler,
                format!("dimension {dimension}"),
            ));
        }
        channel.labelers.push(labeler);
        Ok(())
    }

    /// The labeler for `E` on `dimension`, if one is registered.
    pub(crate) fn labeler<E: Event>(
        &self,
        dimension: LabelDimension,
    ) -> Option<Rc<dyn EventLabeler<E>>> {
        let channel = self.channel::<E>()?;
        channel
            .labelers
            .iter()
            .find(|l| l.dimension() == dimension)
            .cloned()
    }
}
