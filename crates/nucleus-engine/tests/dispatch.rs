//! Integration test: labeled event dispatch through a full simulation.
//!
//! Covers label-filtered delivery (a subscriber filtered to one
//! property sees exactly the mutations of that property), past/current
//! label computation around a value change, merged invocation order,
//! and the registration window closing after plugin initialization.

use std::cell::RefCell;
use std::rc::Rc;

use nucleus_core::{ContractError, ErrorCode, LabelKey, PluginId, PropertyId, Time};
use nucleus_engine::{Context, DataManager, Plugin, PluginData, Simulation};
use nucleus_store::{PropertyDefinition, PropertyManager, PropertyValue};
use nucleus_test_utils::{
    PropertyIdLabeler, PropertyUpdateEvent, ValueLabeler, PROPERTY_DIMENSION, VALUE_DIMENSION,
};

const P1: PropertyId = PropertyId(1);
const P2: PropertyId = PropertyId(2);

struct PairData;

impl PluginData for PairData {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// One entity with two boolean properties, both mutated in one plan.
struct PairManager {
    properties: PropertyManager,
}

impl PairManager {
    fn new() -> Result<Self, ContractError> {
        let mut properties = PropertyManager::new();
        properties.add_id()?;
        properties.define_property(
            P1,
            PropertyDefinition::bool_with_default(false),
            &[],
            Time::START,
        )?;
        properties.define_property(
            P2,
            PropertyDefinition::bool_with_default(false),
            &[],
            Time::START,
        )?;
        Ok(Self { properties })
    }

    fn set(
        &mut self,
        property: PropertyId,
        value: bool,
        time: Time,
    ) -> Result<PropertyUpdateEvent, ContractError> {
        let previous = self.properties.value(property, 0)?;
        let current = PropertyValue::Bool(value);
        self.properties.set_value(property, 0, current, time)?;
        Ok(PropertyUpdateEvent {
            property,
            entity: 0,
            previous,
            current,
        })
    }
}

impl DataManager for PairManager {
    fn init(&mut self, ctx: &mut Context) -> Result<(), ContractError> {
        ctx.add_plan(Time(1.0), |ctx| {
            let manager = ctx.data_manager::<PairManager>()?;
            let time = ctx.time();
            let first = manager.borrow_mut().set(P1, true, time)?;
            ctx.release_event(first)?;
            let second = manager.borrow_mut().set(P2, true, time)?;
            ctx.release_event(second)
        })
    }

    fn checkpoint(&self, _ctx: &Context) -> Box<dyn PluginData> {
        Box::new(PairData)
    }
}

fn pair_plugin() -> Plugin {
    Plugin::builder(PluginId("nucleus.test.pair"))
        .with_initializer(|p| p.add_data_manager(PairManager::new()?))
        .build()
}

fn observer_plugin(
    init: impl Fn(&mut Context) -> Result<(), ContractError> + 'static,
) -> Plugin {
    Plugin::builder(PluginId("nucleus.test.observer"))
        .with_initializer(move |p| init(p))
        .build()
}

#[test]
fn label_filtered_subscriber_sees_only_its_property() {
    let seen: Rc<RefCell<Vec<PropertyId>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_in = Rc::clone(&seen);
    let observer = observer_plugin(move |ctx| {
        ctx.add_event_labeler(PropertyIdLabeler)?;
        let seen = Rc::clone(&seen_in);
        ctx.subscribe_to_labeled_event::<PropertyUpdateEvent>(
            PROPERTY_DIMENSION,
            LabelKey(u64::from(P1.0)),
            move |_ctx, event| {
                seen.borrow_mut().push(event.property);
                Ok(())
            },
        )
    });
    Simulation::builder()
        .add_plugin(pair_plugin())
        .add_plugin(observer)
        .build()
        .execute()
        .expect("run executes");
    assert_eq!(*seen.borrow(), vec![P1]);
}

#[test]
fn past_and_current_labels_differ_exactly_on_value_change() {
    let labels: Rc<RefCell<Vec<(Option<LabelKey>, Option<LabelKey>)>>> =
        Rc::new(RefCell::new(Vec::new()));
    let labels_in = Rc::clone(&labels);
    let observer = observer_plugin(move |ctx| {
        ctx.add_event_labeler(ValueLabeler)?;
        let labels = Rc::clone(&labels_in);
        ctx.subscribe_to_event::<PropertyUpdateEvent>(move |ctx, event| {
            labels.borrow_mut().push((
                ctx.past_label(VALUE_DIMENSION, event),
                ctx.current_label(VALUE_DIMENSION, event),
            ));
            Ok(())
        })
    });
    Simulation::builder()
        .add_plugin(pair_plugin())
        .add_plugin(observer)
        .build()
        .execute()
        .expect("run executes");
    // Both mutations flip false -> true, so the past key is 0 and the
    // current key is 1 on each observation.
    assert_eq!(
        *labels.borrow(),
        vec![
            (Some(LabelKey(0)), Some(LabelKey(1))),
            (Some(LabelKey(0)), Some(LabelKey(1))),
        ]
    );
}

#[test]
fn labeled_and_unlabeled_handlers_merge_in_subscription_order() {
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let order_in = Rc::clone(&order);
    let observer = observer_plugin(move |ctx| {
        ctx.add_event_labeler(PropertyIdLabeler)?;
        let a = Rc::clone(&order_in);
        ctx.subscribe_to_event::<PropertyUpdateEvent>(move |_ctx, _e| {
            a.borrow_mut().push("unlabeled-first");
            Ok(())
        })?;
        let b = Rc::clone(&order_in);
        ctx.subscribe_to_labeled_event::<PropertyUpdateEvent>(
            PROPERTY_DIMENSION,
            LabelKey(u64::from(P1.0)),
            move |_ctx, _e| {
                b.borrow_mut().push("labeled");
                Ok(())
            },
        )?;
        let c = Rc::clone(&order_in);
        ctx.subscribe_to_event::<PropertyUpdateEvent>(move |_ctx, _e| {
            c.borrow_mut().push("unlabeled-second");
            Ok(())
        })
    });
    Simulation::builder()
        .add_plugin(pair_plugin())
        .add_plugin(observer)
        .build()
        .execute()
        .expect("run executes");
    // The P1 release matches all three; the P2 release skips the
    // labeled subscription.
    assert_eq!(
        *order.borrow(),
        vec![
            "unlabeled-first",
            "labeled",
            "unlabeled-second",
            "unlabeled-first",
            "unlabeled-second",
        ]
    );
}

#[test]
fn subscribing_after_initialization_is_rejected() {
    let plugin = Plugin::builder(PluginId("nucleus.test.late"))
        .with_initializer(|p| {
            p.add_plan(Time(1.0), |ctx| {
                ctx.subscribe_to_event::<PropertyUpdateEvent>(|_ctx, _e| Ok(()))
            })
        })
        .build();
    let err = Simulation::builder()
        .add_plugin(plugin)
        .build()
        .execute()
        .expect_err("late subscription is rejected");
    assert_eq!(err.code, ErrorCode::RegistrationClosed);
}

#[test]
fn duplicate_labeler_dimension_is_rejected() {
    let observer = observer_plugin(|ctx| {
        ctx.add_event_labeler(PropertyIdLabeler)?;
        ctx.add_event_labeler(PropertyIdLabeler)
    });
    let err = Simulation::builder()
        .add_plugin(observer)
        .build()
        .execute()
        .expect_err("second labeler on the same dimension is rejected");
    assert_eq!(err.code, ErrorCode::DuplicateEventLabeler);
}
