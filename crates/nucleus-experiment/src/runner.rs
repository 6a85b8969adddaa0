//! The multi-scenario experiment runner.
//!
//! Each scenario replication runs a fully independent [`Simulation`] on
//! a worker thread; the only shared state is the `Arc`-wrapped scenario
//! factory, which is called on the worker so the non-`Send` simulation
//! never crosses a thread boundary. Report rows travel back over a
//! crossbeam channel and are written from the calling thread, sorted by
//! scenario id so the report content is independent of worker timing.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use nucleus_core::{ContractError, ScenarioId};
use nucleus_engine::Simulation;

use crate::error::ExperimentError;
use crate::report::{ReportRow, ReportWriter};

/// Builds the simulation for one scenario. Called once per scenario,
/// on the worker thread that will execute it.
pub type ScenarioFactory =
    dyn Fn(ScenarioId) -> Result<Simulation, ContractError> + Send + Sync;

/// A set of scenario replications sharing one report.
pub struct Experiment {
    scenario_count: u32,
    threads: usize,
}

impl Experiment {
    /// An experiment over scenarios `0..scenario_count`, defaulting to
    /// one worker thread.
    pub fn new(scenario_count: u32) -> Self {
        Self {
            scenario_count,
            threads: 1,
        }
    }

    /// Set the worker thread count (clamped to at least 1).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Run every scenario and write the collected [`ReportRow`]s.
    ///
    /// Rows are grouped by scenario and written in ascending scenario
    /// order regardless of which worker finished first.
    ///
    /// # Errors
    ///
    /// The lowest-numbered failing scenario's error, or a report write
    /// failure. All workers run to completion either way.
    pub fn execute<W: Write>(
        &self,
        factory: Arc<ScenarioFactory>,
        writer: &mut ReportWriter<W>,
    ) -> Result<(), ExperimentError> {
        let (work_tx, work_rx) = crossbeam_channel::unbounded::<ScenarioId>();
        for id in 0..self.scenario_count {
            work_tx
                .send(ScenarioId(id))
                .expect("receiver held on this thread");
        }
        drop(work_tx);

        type ScenarioResult = (ScenarioId, Result<Vec<ReportRow>, ContractError>);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<ScenarioResult>();

        thread::scope(|scope| {
            for _ in 0..self.threads {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let factory = Arc::clone(&factory);
                scope.spawn(move || {
                    for scenario in work_rx {
                        let outcome = factory(scenario)
                            .and_then(Simulation::execute)
                            .map(|mut output| output.take::<ReportRow>());
                        if result_tx.send((scenario, outcome)).is_err() {
                            return;
                        }
                    }
                });
            }
            drop(result_tx);

            let mut results: Vec<ScenarioResult> = Vec::with_capacity(self.scenario_count as usize);
            for _ in 0..self.scenario_count {
                match result_rx.recv() {
                    Ok(result) => results.push(result),
                    Err(_) => return Err(ExperimentError::WorkerLost),
                }
            }
            results.sort_by_key(|(scenario, _)| *scenario);

            for (scenario, outcome) in results {
                let rows = outcome.map_err(|source| ExperimentError::Scenario {
                    scenario,
                    source,
                })?;
                for row in &rows {
                    writer.write_row(scenario, row)?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nucleus_core::{PluginId, Time};
    use nucleus_engine::Plugin;

    fn counting_scenario(scenario: ScenarioId) -> Result<Simulation, ContractError> {
        let plugin = Plugin::builder(PluginId("nucleus.test.count"))
            .with_initializer(move |p| {
                p.add_plan(Time(1.0), move |ctx| {
                    let time = ctx.time();
                    ctx.release_output(ReportRow::new([
                        format!("{time}"),
                        format!("{}", scenario.0 * 10),
                    ]));
                    Ok(())
                })
            })
            .build();
        Ok(Simulation::builder().add_plugin(plugin).build())
    }

    #[test]
    fn rows_arrive_sorted_by_scenario_regardless_of_threads() {
        for threads in [1usize, 4] {
            let mut writer = ReportWriter::new(Vec::new(), ["time", "value"]);
            Experiment::new(4)
                .with_threads(threads)
                .execute(Arc::new(counting_scenario), &mut writer)
                .unwrap();
            let text = String::from_utf8(writer.finish().unwrap()).unwrap();
            assert_eq!(
                text,
                "scenario\ttime\tvalue\n0\t1\t0\n1\t1\t10\n2\t1\t20\n3\t1\t30\n"
            );
        }
    }

    #[test]
    fn failing_scenario_surfaces_with_its_id() {
        let factory = |scenario: ScenarioId| -> Result<Simulation, ContractError> {
            let plugin = Plugin::builder(PluginId("nucleus.test.fail"))
                .with_initializer(move |p| {
                    p.add_plan(Time(2.0), move |ctx| {
                        if scenario == ScenarioId(1) {
                            // Scheduling into the past is simulation-fatal.
                            ctx.add_plan(Time(1.0), |_| Ok(()))
                        } else {
                            Ok(())
                        }
                    })
                })
                .build();
            Ok(Simulation::builder().add_plugin(plugin).build())
        };
        let mut writer = ReportWriter::new(Vec::new(), ["time"]);
        let err = Experiment::new(3)
            .execute(Arc::new(factory), &mut writer)
            .unwrap_err();
        match err {
            ExperimentError::Scenario { scenario, source } => {
                assert_eq!(scenario, ScenarioId(1));
                assert_eq!(source.code, nucleus_core::ErrorCode::PastPlanTime);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
