//! Test utilities and mock plugins for Nucleus development.
//!
//! Provides the [`PropertyUpdateEvent`] family used throughout the
//! kernel's integration tests, labelers for it, and reusable plugin
//! fixtures ([`TogglePlugin`](fixtures::toggle_plugin),
//! [`StormPlugin`](fixtures::storm_plugin)) exercising scheduling,
//! dispatch, and checkpoint/resume.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use nucleus_core::{LabelDimension, LabelKey, PropertyId};
use nucleus_engine::{Context, Event, EventLabeler};
use nucleus_store::PropertyValue;

/// Dimension served by [`PropertyIdLabeler`].
pub const PROPERTY_DIMENSION: LabelDimension = LabelDimension(1);

/// Dimension served by [`ValueLabeler`].
pub const VALUE_DIMENSION: LabelDimension = LabelDimension(2);

/// Released after every property mutation in the test plugins, carrying
/// before/after values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyUpdateEvent {
    pub property: PropertyId,
    pub entity: usize,
    pub previous: PropertyValue,
    pub current: PropertyValue,
}

impl Event for PropertyUpdateEvent {}

/// Routes property updates by property id. Past and current labels
/// coincide: a mutation never moves a value between properties.
pub struct PropertyIdLabeler;

impl EventLabeler<PropertyUpdateEvent> for PropertyIdLabeler {
    fn dimension(&self) -> LabelDimension {
        PROPERTY_DIMENSION
    }

    fn current_label(&self, _ctx: &Context, event: &PropertyUpdateEvent) -> LabelKey {
        LabelKey(u64::from(event.property.0))
    }

    fn past_label(&self, _ctx: &Context, event: &PropertyUpdateEvent) -> LabelKey {
        LabelKey(u64::from(event.property.0))
    }
}

/// Routes property updates by a coarse key over the value itself, so
/// past and current labels differ exactly when the routing key changed.
///
/// Booleans map to 0/1, integers to their parity, floating kinds to 0.
pub struct ValueLabeler;

fn value_key(value: PropertyValue) -> LabelKey {
    match value {
        PropertyValue::Bool(b) => LabelKey(u64::from(b)),
        PropertyValue::Int(i) => LabelKey(i.rem_euclid(2) as u64),
        PropertyValue::Float(_) | PropertyValue::Double(_) => LabelKey(0),
    }
}

impl EventLabeler<PropertyUpdateEvent> for ValueLabeler {
    fn dimension(&self) -> LabelDimension {
        VALUE_DIMENSION
    }

    fn current_label(&self, _ctx: &Context, event: &PropertyUpdateEvent) -> LabelKey {
        value_key(event.current)
    }

    fn past_label(&self, _ctx: &Context, event: &PropertyUpdateEvent) -> LabelKey {
        value_key(event.previous)
    }
}
