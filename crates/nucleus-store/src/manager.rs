//! Definition-validated property table over the scalar containers.

use std::fmt;

use indexmap::IndexMap;
use nucleus_core::{ContractError, ErrorCode, PropertyId, Time};

use crate::boolean::BoolStore;
use crate::definition::{PropertyDefinition, PropertyKind, PropertyValue, PropertyValueRecord};
use crate::numeric::{DoubleStore, FloatStore, IntStore};

/// Kind-dispatched container slot.
#[derive(Clone, Debug)]
enum Slot {
    Bool(BoolStore),
    Int(IntStore),
    Float(FloatStore),
    Double(DoubleStore),
}

impl Slot {
    fn from_definition(
        definition: &PropertyDefinition,
        id_count: usize,
    ) -> Result<Self, ContractError> {
        let ids = 0..id_count;
        match definition.kind() {
            PropertyKind::Bool => Ok(Self::Bool(BoolStore::from_definition(definition, ids)?)),
            PropertyKind::Int => Ok(Self::Int(IntStore::from_definition(definition, ids)?)),
            PropertyKind::Float => Ok(Self::Float(FloatStore::from_definition(definition, ids)?)),
            PropertyKind::Double => {
                Ok(Self::Double(DoubleStore::from_definition(definition, ids)?))
            }
            PropertyKind::Object => Err(ContractError::with_detail(
                ErrorCode::IncompatibleDefinition,
                "object properties are compile-time typed; use ObjectStore directly",
            )),
        }
    }

    fn get(&self, id: usize) -> PropertyValue {
        match self {
            Self::Bool(store) => PropertyValue::Bool(store.get(id)),
            Self::Int(store) => PropertyValue::Int(store.get(id)),
            Self::Float(store) => PropertyValue::Float(store.get(id)),
            Self::Double(store) => PropertyValue::Double(store.get(id)),
        }
    }

    /// Caller has already validated the value kind.
    fn set(&mut self, id: usize, value: PropertyValue) {
        match (self, value) {
            (Self::Bool(store), PropertyValue::Bool(v)) => store.set(id, v),
            (Self::Int(store), PropertyValue::Int(v)) => store.set(id, v),
            (Self::Float(store), PropertyValue::Float(v)) => store.set(id, v),
            (Self::Double(store), PropertyValue::Double(v)) => store.set(id, v),
            _ => unreachable!("value kind validated before storage"),
        }
    }

    fn increment_capacity(&mut self, additional: usize) {
        match self {
            Self::Bool(store) => store.increment_capacity(additional),
            Self::Int(store) => store.increment_capacity(additional),
            Self::Float(store) => store.increment_capacity(additional),
            Self::Double(store) => store.increment_capacity(additional),
        }
    }
}

#[derive(Clone, Debug)]
struct PropertyRecord {
    definition: PropertyDefinition,
    slot: Slot,
    /// Assignment times, present when time tracking is enabled.
    assignment_times: Option<DoubleStore>,
}

/// A table of dynamically-defined properties over a shared id space.
///
/// The manager validates every definition and write against the kernel
/// contract (validation order: unknown property, unknown entity,
/// immutability, value kind) before touching any container, so rejected
/// calls leave all observable state unchanged.
///
/// Iteration and [`fmt::Display`] follow definition order, which makes
/// the string representation deterministic; run-continuity tests compare
/// these strings across pause/resume boundaries.
#[derive(Clone, Debug, Default)]
pub struct PropertyManager {
    properties: IndexMap<PropertyId, PropertyRecord>,
    id_count: usize,
    track_assignment_times: bool,
}

impl PropertyManager {
    /// An empty manager without assignment-time tracking.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty manager that records the simulation time of every
    /// assignment.
    pub fn with_time_tracking() -> Self {
        Self {
            track_assignment_times: true,
            ..Self::default()
        }
    }

    /// Number of ids currently managed.
    pub fn id_count(&self) -> usize {
        self.id_count
    }

    /// Whether assignment times are recorded.
    pub fn tracks_assignment_times(&self) -> bool {
        self.track_assignment_times
    }

    /// Allocate the next id.
    ///
    /// # Errors
    ///
    /// `INSUFFICIENT_PROPERTY_VALUE_ASSIGNMENT` if any no-default
    /// property is defined — such ids need explicit values via
    /// [`add_id_with`](Self::add_id_with).
    pub fn add_id(&mut self) -> Result<usize, ContractError> {
        self.add_id_with(&[], Time::START)
    }

    /// Allocate the next id, assigning the given initial values.
    ///
    /// Initial assignment is permitted for immutable properties — it is
    /// the one write an immutable property accepts per id.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_PROPERTY_ID` for a value naming an undefined property,
    /// `INCOMPATIBLE_VALUE` for a kind mismatch, and
    /// `INSUFFICIENT_PROPERTY_VALUE_ASSIGNMENT` if a no-default property
    /// is left without a value.
    pub fn add_id_with(
        &mut self,
        values: &[(PropertyId, PropertyValue)],
        time: Time,
    ) -> Result<usize, ContractError> {
        for (property, value) in values {
            let record = self.record(*property)?;
            check_kind(&record.definition, *value)?;
        }
        for (property, record) in &self.properties {
            let needs_value = record.definition.default().is_none();
            if needs_value && !values.iter().any(|(p, _)| p == property) {
                return Err(ContractError::with_detail(
                    ErrorCode::InsufficientPropertyValueAssignment,
                    format!("property {property} has no default"),
                ));
            }
        }

        let id = self.id_count;
        self.id_count += 1;
        for (property, value) in values {
            let track = self.track_assignment_times;
            let record = self
                .properties
                .get_mut(property)
                .expect("validated before mutation");
            record.slot.set(id, *value);
            if track {
                if let Some(times) = &mut record.assignment_times {
                    times.set(id, time.0);
                }
            }
        }
        Ok(id)
    }

    /// Define a new property.
    ///
    /// `initial` assigns explicit values to existing ids at definition
    /// time. If the definition has no default, `initial` must cover
    /// every existing id.
    ///
    /// # Errors
    ///
    /// `DUPLICATE_PROPERTY_DEFINITION` if `property` is already defined,
    /// `INCOMPATIBLE_DEFINITION` for an object-kind definition,
    /// `UNKNOWN_ENTITY_ID` / `INCOMPATIBLE_VALUE` for bad initial
    /// entries, and `INSUFFICIENT_PROPERTY_VALUE_ASSIGNMENT` for
    /// missing no-default coverage.
    pub fn define_property(
        &mut self,
        property: PropertyId,
        definition: PropertyDefinition,
        initial: &[(usize, PropertyValue)],
        time: Time,
    ) -> Result<(), ContractError> {
        if self.properties.contains_key(&property) {
            return Err(ContractError::with_detail(
                ErrorCode::DuplicatePropertyDefinition,
                format!("property {property}"),
            ));
        }
        for (id, value) in initial {
            if *id >= self.id_count {
                return Err(ContractError::with_detail(
                    ErrorCode::UnknownEntityId,
                    format!("id {id}"),
                ));
            }
            check_kind(&definition, *value)?;
        }
        if definition.default().is_none() {
            for id in 0..self.id_count {
                if !initial.iter().any(|(i, _)| *i == id) {
                    return Err(ContractError::with_detail(
                        ErrorCode::InsufficientPropertyValueAssignment,
                        format!("id {id} has no value for property {property}"),
                    ));
                }
            }
        }

        let mut slot = Slot::from_definition(&definition, self.id_count)?;
        let mut assignment_times = self
            .track_assignment_times
            .then(|| DoubleStore::new(0.0, self.id_count));
        for (id, value) in initial {
            slot.set(*id, *value);
            if let Some(times) = &mut assignment_times {
                times.set(*id, time.0);
            }
        }
        self.properties.insert(
            property,
            PropertyRecord {
                definition,
                slot,
                assignment_times,
            },
        );
        Ok(())
    }

    /// The definition of `property`.
    pub fn definition(&self, property: PropertyId) -> Result<&PropertyDefinition, ContractError> {
        self.record(property).map(|r| &r.definition)
    }

    /// Ids of all defined properties, in definition order.
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.properties.keys().copied()
    }

    /// The current value of `property` for `id`.
    ///
    /// Unset ids read the declared default.
    pub fn value(&self, property: PropertyId, id: usize) -> Result<PropertyValue, ContractError> {
        let record = self.record(property)?;
        if id >= self.id_count {
            return Err(ContractError::with_detail(
                ErrorCode::UnknownEntityId,
                format!("id {id}"),
            ));
        }
        Ok(record.slot.get(id))
    }

    /// The current value of `property` for `id`, with its assignment time.
    ///
    /// # Errors
    ///
    /// `ASSIGNMENT_TIME_NOT_TRACKED` if the manager was not constructed
    /// with time tracking.
    pub fn value_record(
        &self,
        property: PropertyId,
        id: usize,
    ) -> Result<PropertyValueRecord, ContractError> {
        let value = self.value(property, id)?;
        let record = self.record(property)?;
        let times = record
            .assignment_times
            .as_ref()
            .ok_or(ContractError::new(ErrorCode::AssignmentTimeNotTracked))?;
        Ok(PropertyValueRecord {
            value,
            time: Time(times.get(id)),
        })
    }

    /// Assign `value` to `property` for `id` at simulation time `time`.
    ///
    /// # Errors
    ///
    /// In validation order: `UNKNOWN_PROPERTY_ID`, `UNKNOWN_ENTITY_ID`,
    /// `IMMUTABLE_VALUE`, `INCOMPATIBLE_VALUE`. No state changes on
    /// rejection.
    pub fn set_value(
        &mut self,
        property: PropertyId,
        id: usize,
        value: PropertyValue,
        time: Time,
    ) -> Result<(), ContractError> {
        let record = self.record(property)?;
        if id >= self.id_count {
            return Err(ContractError::with_detail(
                ErrorCode::UnknownEntityId,
                format!("id {id}"),
            ));
        }
        if !record.definition.is_mutable() {
            return Err(ContractError::with_detail(
                ErrorCode::ImmutableValue,
                format!("property {property}"),
            ));
        }
        check_kind(&record.definition, value)?;

        let track = self.track_assignment_times;
        let record = self
            .properties
            .get_mut(&property)
            .expect("validated before mutation");
        record.slot.set(id, value);
        if track {
            if let Some(times) = &mut record.assignment_times {
                times.set(id, time.0);
            }
        }
        Ok(())
    }

    /// Signal that `id` may later be reused.
    ///
    /// Lazy with respect to content: subsequent reads still return the
    /// last assigned value.
    pub fn remove_id(&mut self, id: usize) -> Result<(), ContractError> {
        if id >= self.id_count {
            return Err(ContractError::with_detail(
                ErrorCode::UnknownEntityId,
                format!("id {id}"),
            ));
        }
        Ok(())
    }

    /// Extend every container's capacity by `additional` slots.
    pub fn increment_capacity(&mut self, additional: usize) {
        for record in self.properties.values_mut() {
            record.slot.increment_capacity(additional);
            if let Some(times) = &mut record.assignment_times {
                times.increment_capacity(additional);
            }
        }
    }

    fn record(&self, property: PropertyId) -> Result<&PropertyRecord, ContractError> {
        self.properties.get(&property).ok_or_else(|| {
            ContractError::with_detail(ErrorCode::UnknownPropertyId, format!("property {property}"))
        })
    }
}

fn check_kind(
    definition: &PropertyDefinition,
    value: PropertyValue,
) -> Result<(), ContractError> {
    if value.kind() != definition.kind() {
        return Err(ContractError::with_detail(
            ErrorCode::IncompatibleValue,
            format!("expected {}, got {}", definition.kind(), value.kind()),
        ));
    }
    Ok(())
}

impl fmt::Display for PropertyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyManager[ids={}", self.id_count)?;
        for (property, record) in &self.properties {
            write!(f, "; p{}:{}=[", property, record.definition.kind())?;
            for id in 0..self.id_count {
                if id > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", record.slot.get(id))?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
