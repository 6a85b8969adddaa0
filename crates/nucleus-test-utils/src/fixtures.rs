//! Reusable plugin fixtures.
//!
//! Two standard plugins for kernel validation:
//!
//! - [`toggle_plugin`] — flips a boolean property on a fixed schedule,
//!   releasing a [`PropertyUpdateEvent`] per flip. Its data snapshot
//!   carries the property values, so checkpoint/resume identity can be
//!   asserted on the rebuilt [`PropertyManager`]'s string form.
//! - [`storm_plugin`] — schedules a seeded burst of plans at random
//!   times and logs execution order, for continuity tests that need
//!   dense equal-time collisions.
//!
//! Both snapshot types use copy-on-write builders: `build` shares the
//! underlying state, and the first mutation after a build clones it.

use std::any::Any;
use std::rc::Rc;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use nucleus_core::{ContractError, PluginId, PropertyId, Time};
use nucleus_engine::{Context, DataManager, Plugin, PluginData};
use nucleus_store::{PropertyDefinition, PropertyManager, PropertyValue};

use crate::PropertyUpdateEvent;

pub const TOGGLE_PLUGIN: PluginId = PluginId("nucleus.test.toggle");
pub const STORM_PLUGIN: PluginId = PluginId("nucleus.test.storm");
pub const RECORDING_PLUGIN: PluginId = PluginId("nucleus.test.recording");

/// The boolean property the toggle plugin flips.
pub const TOGGLE_PROPERTY: PropertyId = PropertyId(1);

// ── Toggle plugin ──────────────────────────────────────────────────

#[derive(Clone)]
struct ToggleInner {
    entity_count: usize,
    plan_count: u32,
    values: Vec<bool>,
    plans_scheduled: bool,
}

/// Snapshot of the toggle manager: property values plus whether the
/// toggle plans were already scheduled (so a resumed run does not
/// schedule them again on top of the restored queue).
#[derive(Clone)]
pub struct ToggleData {
    inner: Rc<ToggleInner>,
}

impl ToggleData {
    pub fn builder(entity_count: usize, plan_count: u32) -> ToggleDataBuilder {
        ToggleDataBuilder {
            inner: Rc::new(ToggleInner {
                entity_count,
                plan_count,
                values: vec![false; entity_count],
                plans_scheduled: false,
            }),
        }
    }

    pub fn entity_count(&self) -> usize {
        self.inner.entity_count
    }

    pub fn plan_count(&self) -> u32 {
        self.inner.plan_count
    }

    pub fn value(&self, entity: usize) -> bool {
        self.inner.values[entity]
    }

    pub fn plans_scheduled(&self) -> bool {
        self.inner.plans_scheduled
    }
}

impl PluginData for ToggleData {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Copy-on-write builder for [`ToggleData`]: mutating after a `build`
/// clones the shared state instead of aliasing it.
pub struct ToggleDataBuilder {
    inner: Rc<ToggleInner>,
}

impl ToggleDataBuilder {
    pub fn set_value(mut self, entity: usize, value: bool) -> Self {
        Rc::make_mut(&mut self.inner).values[entity] = value;
        self
    }

    pub fn plans_scheduled(mut self, scheduled: bool) -> Self {
        Rc::make_mut(&mut self.inner).plans_scheduled = scheduled;
        self
    }

    pub fn build(&self) -> ToggleData {
        ToggleData {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Owns the toggled boolean property, backed by a [`PropertyManager`].
pub struct ToggleManager {
    properties: PropertyManager,
    plan_count: u32,
    plans_scheduled: bool,
}

impl ToggleManager {
    pub fn new(data: &ToggleData) -> Result<Self, ContractError> {
        let mut properties = PropertyManager::new();
        for _ in 0..data.entity_count() {
            properties.add_id()?;
        }
        let initial: Vec<(usize, PropertyValue)> = (0..data.entity_count())
            .filter(|&id| data.value(id))
            .map(|id| (id, PropertyValue::Bool(true)))
            .collect();
        properties.define_property(
            TOGGLE_PROPERTY,
            PropertyDefinition::bool_with_default(false),
            &initial,
            Time::START,
        )?;
        Ok(Self {
            properties,
            plan_count: data.plan_count(),
            plans_scheduled: data.plans_scheduled(),
        })
    }

    /// Flip `entity`'s value, returning `(previous, current)`.
    pub fn toggle(
        &mut self,
        entity: usize,
        time: Time,
    ) -> Result<(PropertyValue, PropertyValue), ContractError> {
        let previous = self.properties.value(TOGGLE_PROPERTY, entity)?;
        let current = match previous {
            PropertyValue::Bool(b) => PropertyValue::Bool(!b),
            other => other,
        };
        self.properties.set_value(TOGGLE_PROPERTY, entity, current, time)?;
        Ok((previous, current))
    }

    /// The backing property manager, for string-identity assertions.
    pub fn properties(&self) -> &PropertyManager {
        &self.properties
    }
}

impl DataManager for ToggleManager {
    fn init(&mut self, ctx: &mut Context) -> Result<(), ContractError> {
        if self.plans_scheduled {
            return Ok(());
        }
        let entity_count = self.properties.id_count();
        for i in 0..self.plan_count {
            let entity = i as usize % entity_count;
            ctx.add_plan(Time(f64::from(i)), move |ctx| {
                let manager = ctx.data_manager::<ToggleManager>()?;
                let time = ctx.time();
                let (previous, current) = manager.borrow_mut().toggle(entity, time)?;
                ctx.release_event(PropertyUpdateEvent {
                    property: TOGGLE_PROPERTY,
                    entity,
                    previous,
                    current,
                })
            })?;
        }
        self.plans_scheduled = true;
        Ok(())
    }

    fn checkpoint(&self, _ctx: &Context) -> Box<dyn PluginData> {
        let entity_count = self.properties.id_count();
        let mut builder = ToggleData::builder(entity_count, self.plan_count)
            .plans_scheduled(self.plans_scheduled);
        for id in 0..entity_count {
            if let Ok(PropertyValue::Bool(true)) = self.properties.value(TOGGLE_PROPERTY, id) {
                builder = builder.set_value(id, true);
            }
        }
        Box::new(builder.build())
    }
}

/// A plugin flipping [`TOGGLE_PROPERTY`] across `entity_count` entities
/// with `plan_count` plans at times `0, 1, 2, ...`.
pub fn toggle_plugin(data: ToggleData) -> Plugin {
    Plugin::builder(TOGGLE_PLUGIN)
        .with_data(data)
        .with_initializer(|p| {
            let data = p
                .plugin_data::<ToggleData>()
                .expect("toggle plugin carries ToggleData")
                .clone();
            let manager = ToggleManager::new(&data)?;
            p.add_data_manager(manager)
        })
        .build()
}

// ── Recording plugin ───────────────────────────────────────────────

/// Snapshot of a [`RecordingManager`]'s observations.
#[derive(Clone)]
pub struct RecordingData {
    pub observations: Vec<(Time, String)>,
}

impl PluginData for RecordingData {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Accumulates `(time, description)` observations. Tests look it up
/// through the context and record from handlers, then assert on the
/// observation list directly or through its checkpoint snapshot.
#[derive(Default)]
pub struct RecordingManager {
    observations: Vec<(Time, String)>,
}

impl RecordingManager {
    pub fn record(&mut self, time: Time, description: impl Into<String>) {
        self.observations.push((time, description.into()));
    }

    pub fn observations(&self) -> &[(Time, String)] {
        &self.observations
    }
}

impl DataManager for RecordingManager {
    fn init(&mut self, _ctx: &mut Context) -> Result<(), ContractError> {
        Ok(())
    }

    fn checkpoint(&self, _ctx: &Context) -> Box<dyn PluginData> {
        Box::new(RecordingData {
            observations: self.observations.clone(),
        })
    }
}

/// A plugin registering a [`RecordingManager`], restoring observations
/// from a checkpoint snapshot when resuming.
pub fn recording_plugin() -> Plugin {
    Plugin::builder(RECORDING_PLUGIN)
        .with_initializer(|p| {
            let observations = p
                .plugin_data::<RecordingData>()
                .map(|d| d.observations.clone())
                .unwrap_or_default();
            p.add_data_manager(RecordingManager { observations })
        })
        .build()
}

// ── Storm plugin ───────────────────────────────────────────────────

#[derive(Clone)]
struct StormInner {
    seed: u64,
    plan_count: u32,
    horizon: f64,
    log: Vec<String>,
    plans_scheduled: bool,
}

/// Snapshot of the storm manager: seed, schedule shape, and the
/// execution log accumulated so far.
#[derive(Clone)]
pub struct StormData {
    inner: Rc<StormInner>,
}

impl StormData {
    /// A fresh storm: `plan_count` plans at seeded random times in
    /// `[0, horizon)`.
    pub fn new(seed: u64, plan_count: u32, horizon: f64) -> Self {
        Self {
            inner: Rc::new(StormInner {
                seed,
                plan_count,
                horizon,
                log: Vec::new(),
                plans_scheduled: false,
            }),
        }
    }

    pub fn log(&self) -> &[String] {
        &self.inner.log
    }
}

impl PluginData for StormData {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Logs every plan execution; the log order is the drain order, so
/// comparing logs across segmented and uninterrupted runs checks the
/// full `(time, arrival)` total order.
pub struct StormManager {
    seed: u64,
    plan_count: u32,
    horizon: f64,
    log: Vec<String>,
    plans_scheduled: bool,
}

impl StormManager {
    pub fn new(data: &StormData) -> Self {
        Self {
            seed: data.inner.seed,
            plan_count: data.inner.plan_count,
            horizon: data.inner.horizon,
            log: data.inner.log.clone(),
            plans_scheduled: data.inner.plans_scheduled,
        }
    }

    pub fn record(&mut self, line: String) {
        self.log.push(line);
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }
}

impl DataManager for StormManager {
    fn init(&mut self, ctx: &mut Context) -> Result<(), ContractError> {
        if self.plans_scheduled {
            return Ok(());
        }
        // Coarse time grid to force equal-time collisions, which the
        // arrival sequence must then order deterministically.
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for i in 0..self.plan_count {
            let slot = (rng.gen::<f64>() * self.horizon).floor();
            ctx.add_plan(Time(slot), move |ctx| {
                let manager = ctx.data_manager::<StormManager>()?;
                let now = ctx.time();
                manager.borrow_mut().record(format!("{i}@{now}"));
                Ok(())
            })?;
        }
        self.plans_scheduled = true;
        Ok(())
    }

    fn checkpoint(&self, _ctx: &Context) -> Box<dyn PluginData> {
        Box::new(StormData {
            inner: Rc::new(StormInner {
                seed: self.seed,
                plan_count: self.plan_count,
                horizon: self.horizon,
                log: self.log.clone(),
                plans_scheduled: self.plans_scheduled,
            }),
        })
    }
}

/// A plugin scheduling a seeded burst of logging plans.
pub fn storm_plugin(data: StormData) -> Plugin {
    Plugin::builder(STORM_PLUGIN)
        .with_data(data)
        .with_initializer(|p| {
            let data = p
                .plugin_data::<StormData>()
                .expect("storm plugin carries StormData")
                .clone();
            p.add_data_manager(StormManager::new(&data))
        })
        .build()
}
