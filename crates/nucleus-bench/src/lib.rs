//! Benchmark profiles and utilities for the Nucleus kernel.
//!
//! Provides pre-built workloads for benchmarking:
//!
//! - [`storm_simulation`]: a seeded plan storm exercising the full
//!   drain loop.
//! - [`seeded_times`]: deterministic plan-time generation.
//! - [`populated_manager`]: a property manager with boolean and integer
//!   properties over N entities.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use nucleus_core::{PropertyId, Time};
use nucleus_engine::Simulation;
use nucleus_store::{PropertyDefinition, PropertyManager};
use nucleus_test_utils::fixtures::{storm_plugin, StormData};

/// The boolean property of [`populated_manager`].
pub const FLAG: PropertyId = PropertyId(1);
/// The integer property of [`populated_manager`].
pub const COUNT: PropertyId = PropertyId(2);

/// A ready-to-execute simulation scheduling `plan_count` seeded plans
/// over `[0, horizon)`.
pub fn storm_simulation(seed: u64, plan_count: u32, horizon: f64) -> Simulation {
    Simulation::builder()
        .add_plugin(storm_plugin(StormData::new(seed, plan_count, horizon)))
        .build()
}

/// `count` deterministic plan times in `[0, horizon)`.
pub fn seeded_times(seed: u64, count: usize, horizon: f64) -> Vec<Time> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| Time((rng.gen::<f64>() * horizon).floor()))
        .collect()
}

/// A property manager with `ids` entities, a default-false boolean
/// property, and a default-zero integer property.
pub fn populated_manager(ids: usize) -> PropertyManager {
    let mut manager = PropertyManager::new();
    for _ in 0..ids {
        manager
            .add_id()
            .expect("fresh manager accepts ids");
    }
    manager
        .define_property(
            FLAG,
            PropertyDefinition::bool_with_default(false),
            &[],
            Time::START,
        )
        .expect("fresh property id");
    manager
        .define_property(
            COUNT,
            PropertyDefinition::int_with_default(0),
            &[],
            Time::START,
        )
        .expect("fresh property id");
    manager
}
