//! Integration test: run continuity across pause/resume boundaries.
//!
//! A run split into N checkpoint/resume segments must end in exactly
//! the state an uninterrupted run ends in: same property values, same
//! plan execution order, same serialized property-manager form. The
//! arrival-sequence counter carried through the checkpoint is what
//! keeps equal-time ties ordered across the boundary.

use nucleus_core::{ContractError, PluginId, Time};
use nucleus_engine::{
    Checkpoint, Context, DataManager, OutputBuffer, Plugin, PluginData, Simulation,
};
use nucleus_test_utils::fixtures::{
    recording_plugin, storm_plugin, toggle_plugin, RecordingData, RecordingManager, StormData,
    ToggleData, ToggleManager, RECORDING_PLUGIN,
};
use nucleus_test_utils::PropertyUpdateEvent;

fn take_checkpoint(output: &mut OutputBuffer) -> Checkpoint {
    let mut checkpoints = output.take::<Checkpoint>();
    assert_eq!(checkpoints.len(), 1, "one checkpoint per terminated run");
    checkpoints.pop().expect("asserted non-empty")
}

fn toggle_manager_string(checkpoint: &Checkpoint) -> String {
    let data = checkpoint
        .plugins()
        .iter()
        .find_map(|p| p.data::<ToggleData>())
        .expect("toggle data survives the checkpoint");
    let manager = ToggleManager::new(data).expect("snapshot rebuilds");
    manager.properties().to_string()
}

fn storm_log(checkpoint: &Checkpoint) -> Vec<String> {
    checkpoint
        .plugins()
        .iter()
        .find_map(|p| p.data::<StormData>())
        .expect("storm data survives the checkpoint")
        .log()
        .to_vec()
}

#[test]
fn fifty_toggles_identical_across_segment_counts() {
    let mut renditions = Vec::new();
    for segments in [1u32, 5, 10] {
        let data = ToggleData::builder(3, 50).build();
        let mut checkpoint: Option<Checkpoint> = None;
        for i in 1..=segments {
            let mut builder = Simulation::builder().record_state(true);
            builder = match checkpoint.take() {
                Some(cp) => builder.resume_from(cp),
                None => builder.add_plugin(toggle_plugin(data.clone())),
            };
            if i < segments {
                builder = builder.with_halt_time(Time(50.0 * f64::from(i) / f64::from(segments)));
            }
            let mut output = builder.build().execute().expect("segment executes");
            checkpoint = Some(take_checkpoint(&mut output));
        }
        let final_cp = checkpoint.expect("at least one segment");
        renditions.push(toggle_manager_string(&final_cp));
    }
    assert_eq!(renditions[0], renditions[1]);
    assert_eq!(renditions[0], renditions[2]);
    // 50 plans over 3 entities: entity 0 and 1 flip 17 times, entity 2
    // flips 16, so the final pattern is [true, true, false].
    assert!(renditions[0].contains("[true,true,false]"), "{}", renditions[0]);
}

#[test]
fn seeded_storm_log_identical_across_segment_counts() {
    let uninterrupted = {
        let mut output = Simulation::builder()
            .add_plugin(storm_plugin(StormData::new(42, 200, 20.0)))
            .record_state(true)
            .build()
            .execute()
            .expect("run executes");
        storm_log(&take_checkpoint(&mut output))
    };
    assert_eq!(uninterrupted.len(), 200);

    for segments in [5u32, 10] {
        let mut checkpoint: Option<Checkpoint> = None;
        for i in 1..=segments {
            let mut builder = Simulation::builder().record_state(true);
            builder = match checkpoint.take() {
                Some(cp) => builder.resume_from(cp),
                None => builder.add_plugin(storm_plugin(StormData::new(42, 200, 20.0))),
            };
            if i < segments {
                builder = builder.with_halt_time(Time(20.0 * f64::from(i) / f64::from(segments)));
            }
            let mut output = builder.build().execute().expect("segment executes");
            checkpoint = Some(take_checkpoint(&mut output));
        }
        let log = storm_log(&checkpoint.expect("at least one segment"));
        assert_eq!(log, uninterrupted, "{segments}-segment run diverged");
    }
}

// ── Recorded observations across the boundary ──────────────────────

/// Subscribes to toggle events and writes one observation per event
/// into the [`RecordingManager`].
fn scribe_plugin() -> Plugin {
    Plugin::builder(PluginId("nucleus.test.scribe"))
        .with_dependency(RECORDING_PLUGIN)
        .with_initializer(|p| {
            p.subscribe_to_event::<PropertyUpdateEvent>(|ctx, event| {
                let recorder = ctx.data_manager::<RecordingManager>()?;
                let time = ctx.time();
                recorder
                    .borrow_mut()
                    .record(time, format!("{}={}", event.entity, event.current));
                Ok(())
            })
        })
        .build()
}

fn recorded_log(checkpoint: &Checkpoint) -> Vec<(Time, String)> {
    checkpoint
        .plugins()
        .iter()
        .find_map(|p| p.data::<RecordingData>())
        .expect("recording data survives the checkpoint")
        .observations
        .clone()
}

#[test]
fn recorded_observations_accumulate_across_resume() {
    let run = |segments: u32| {
        let mut checkpoint: Option<Checkpoint> = None;
        for i in 1..=segments {
            let mut builder = Simulation::builder().record_state(true);
            builder = match checkpoint.take() {
                Some(cp) => builder.resume_from(cp),
                None => builder
                    .add_plugin(toggle_plugin(ToggleData::builder(2, 12).build()))
                    .add_plugin(recording_plugin())
                    .add_plugin(scribe_plugin()),
            };
            if i < segments {
                builder = builder.with_halt_time(Time(12.0 * f64::from(i) / f64::from(segments)));
            }
            let mut output = builder.build().execute().expect("segment executes");
            checkpoint = Some(take_checkpoint(&mut output));
        }
        recorded_log(&checkpoint.expect("at least one segment"))
    };

    let uninterrupted = run(1);
    assert_eq!(uninterrupted.len(), 12);
    assert_eq!(uninterrupted[0], (Time(0.0), "0=true".to_string()));
    assert_eq!(run(3), uninterrupted);
}

// ── Arrival order across the boundary ──────────────────────────────

struct SeqData {
    log: Vec<String>,
    plans_scheduled: bool,
}

impl PluginData for SeqData {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Schedules two plans at the same time plus an earlier plan that adds
/// a third equal-time plan at runtime.
struct SeqManager {
    log: Vec<String>,
    plans_scheduled: bool,
}

impl SeqManager {
    fn record(&mut self, line: &str) {
        self.log.push(line.to_string());
    }
}

impl DataManager for SeqManager {
    fn init(&mut self, ctx: &mut Context) -> Result<(), ContractError> {
        if self.plans_scheduled {
            return Ok(());
        }
        ctx.add_plan(Time(5.0), |ctx| {
            ctx.data_manager::<SeqManager>()?.borrow_mut().record("first");
            Ok(())
        })?;
        ctx.add_plan(Time(5.0), |ctx| {
            ctx.data_manager::<SeqManager>()?.borrow_mut().record("second");
            Ok(())
        })?;
        ctx.add_plan(Time(3.0), |ctx| {
            // Added after the two time-5 plans, so it must run third
            // even when scheduling happens in a later segment.
            ctx.add_plan(Time(5.0), |ctx| {
                ctx.data_manager::<SeqManager>()?.borrow_mut().record("third");
                Ok(())
            })
        })?;
        self.plans_scheduled = true;
        Ok(())
    }

    fn checkpoint(&self, _ctx: &Context) -> Box<dyn PluginData> {
        Box::new(SeqData {
            log: self.log.clone(),
            plans_scheduled: self.plans_scheduled,
        })
    }
}

fn seq_plugin() -> Plugin {
    Plugin::builder(PluginId("nucleus.test.seq"))
        .with_initializer(|p| {
            let (log, plans_scheduled) = match p.plugin_data::<SeqData>() {
                Some(data) => (data.log.clone(), data.plans_scheduled),
                None => (Vec::new(), false),
            };
            p.add_data_manager(SeqManager {
                log,
                plans_scheduled,
            })
        })
        .build()
}

#[test]
fn equal_time_plans_keep_arrival_order_across_resume() {
    // Halt between the runtime scheduling at time 3 and the shared
    // time-5 slot, so the third plan is added in a resumed segment.
    let mut output = Simulation::builder()
        .add_plugin(seq_plugin())
        .with_halt_time(Time(4.0))
        .record_state(true)
        .build()
        .execute()
        .expect("first segment executes");
    let checkpoint = take_checkpoint(&mut output);
    assert_eq!(checkpoint.state().start_time(), Time(4.0));

    let mut output = Simulation::builder()
        .resume_from(checkpoint)
        .record_state(true)
        .build()
        .execute()
        .expect("second segment executes");
    let final_cp = take_checkpoint(&mut output);
    let data = final_cp
        .plugins()
        .iter()
        .find_map(|p| p.data::<SeqData>())
        .expect("seq data survives");
    assert_eq!(data.log, vec!["first", "second", "third"]);
}

#[test]
fn plan_into_the_past_is_fatal_and_schedules_nothing() {
    let plugin = Plugin::builder(PluginId("nucleus.test.past"))
        .with_initializer(|p| {
            p.add_plan(Time(5.0), |ctx| ctx.add_plan(Time(1.0), |_| Ok(())))
        })
        .build();
    let err = Simulation::builder()
        .add_plugin(plugin)
        .build()
        .execute()
        .expect_err("past-time plan is simulation-fatal");
    assert_eq!(err.code, nucleus_core::ErrorCode::PastPlanTime);
}
