//! The timestepping loop, dump cadence and spin-up cycles.

use super::recorder::{NullObserver, StepObserver, StepRecord};
use super::{Model, ModelStatus};
use crate::component::Category;
use crate::domain::{DateTime, TimeDomain};
use crate::dump::DumpTag;
use crate::error::{CouplingError, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Alternative time domain; must cover the model's period with the same step.
    pub timedomain: Option<TimeDomain>,
    /// Snapshot cadence in model time; a positive multiple of the step.
    pub dumping_frequency: Option<Duration>,
    /// Overwrite a single dump file per component instead of one per snapshot.
    pub overwrite_dump: bool,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self { timedomain: None, dumping_frequency: None, overwrite_dump: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Steps run per cycle.
    pub steps: usize,
    pub cycles: u32,
    pub start: DateTime,
    pub end: DateTime,
    /// Dump files written, each listed once. An overwritten file (`Latest`,
    /// or one spin-up cycle's file) holds only its last snapshot.
    pub dumps: Vec<PathBuf>,
}

impl Model {
    pub fn simulate(&mut self, options: SimulateOptions) -> Result<RunSummary> {
        self.simulate_with(options, &mut NullObserver)
    }

    /// Runs every step of the time domain, reporting each component step to `observer`.
    pub fn simulate_with(&mut self, options: SimulateOptions, observer: &mut dyn StepObserver) -> Result<RunSummary> {
        self.ensure_validated()?;
        let reference = self.timedomain().clone();
        let window = match options.timedomain {
            None => reference,
            Some(td) => {
                if !td.spans_same_period_as(&reference) {
                    return Err(CouplingError::Configuration(format!(
                        "simulation period [{}, {}] differs from the model's [{}, {}]",
                        td.first(),
                        td.last(),
                        reference.first(),
                        reference.last()
                    )));
                }
                if td.step_seconds() != reference.step_seconds() {
                    return Err(CouplingError::Configuration(format!(
                        "simulation step of {}s differs from the components' {}s",
                        td.step_seconds(),
                        reference.step_seconds()
                    )));
                }
                td
            }
        };
        let every = dump_interval(options.dumping_frequency, &window)?;
        let overwrite = options.overwrite_dump;

        info!(
            model = %self.settings.identifier,
            steps = window.step_count(),
            start = %window.first(),
            end = %window.last(),
            "simulation starting"
        );
        let dumps = self.guarded(|model| {
            model.run_window(&window, every, &|dt| if overwrite { DumpTag::Latest } else { DumpTag::At(dt) }, &mut *observer)
        })?;
        info!(model = %self.settings.identifier, dumps = dumps.len(), "simulation completed");

        Ok(RunSummary { steps: window.step_count(), cycles: 1, start: window.first(), end: window.last(), dumps })
    }

    pub fn spin_up(
        &mut self,
        start: DateTime,
        end: DateTime,
        cycles: u32,
        dumping_frequency: Option<Duration>,
    ) -> Result<RunSummary> {
        self.spin_up_with(start, end, cycles, dumping_frequency, &mut NullObserver)
    }

    /// Runs `[start, end)` `cycles` times; each cycle starts from the states the previous one ended with.
    pub fn spin_up_with(
        &mut self,
        start: DateTime,
        end: DateTime,
        cycles: u32,
        dumping_frequency: Option<Duration>,
        observer: &mut dyn StepObserver,
    ) -> Result<RunSummary> {
        self.ensure_validated()?;
        if cycles == 0 {
            return Err(CouplingError::Configuration("spin-up needs at least one cycle".into()));
        }
        let window = self.timedomain().window(&start, &end)?;
        let every = dump_interval(dumping_frequency, &window)?;

        let mut dumps = Vec::new();
        for cycle in 1..=cycles {
            info!(model = %self.settings.identifier, cycle, cycles, %start, %end, "spin-up cycle starting");
            let written = self.guarded(|model| model.run_window(&window, every, &|_| DumpTag::SpinUp(cycle), &mut *observer))?;
            dumps.extend(written);
        }
        info!(model = %self.settings.identifier, cycles, "spin-up completed");

        Ok(RunSummary { steps: window.step_count(), cycles, start, end, dumps })
    }

    fn ensure_validated(&mut self) -> Result<()> {
        if self.status == ModelStatus::Unvalidated {
            self.validate()?;
        }
        Ok(())
    }

    fn guarded<T>(&mut self, run: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.status = ModelStatus::Running;
        let result = run(self);
        self.status = if result.is_ok() { ModelStatus::Completed } else { ModelStatus::Failed };
        result
    }

    /// Steps through every step of `window`, which lies on the model's time domain.
    fn run_window(
        &mut self,
        window: &TimeDomain,
        dump_every: Option<i64>,
        tag: &dyn Fn(DateTime) -> DumpTag,
        observer: &mut dyn StepObserver,
    ) -> Result<Vec<PathBuf>> {
        let offset = self.timedomain().index_of_instant(window.instant(0)).ok_or_else(|| {
            CouplingError::Configuration(format!("{} is not a timestamp of the model", window.first()))
        })?;
        let mut dumps = Vec::new();

        for k in 0..window.step_count() {
            let index = offset + k;
            let datetime = window.datetime(k);
            for category in Category::ORDER {
                let pos = category.position();
                let outputs = {
                    let inwards = self.exchanger.gather(self.plan.inwards(category));
                    self.components[pos].step(index, &inwards)?
                };
                observer.observe(&StepRecord {
                    category,
                    index,
                    datetime,
                    names: self.components[pos].outwards(),
                    values: &outputs,
                })?;
                self.exchanger.store(self.plan.outwards(category), outputs);
            }
            debug!(step = index, %datetime, "step completed");

            if let Some(every) = dump_every {
                let elapsed = window.instant(k + 1) - window.instant(0);
                if elapsed % every == 0 {
                    let at = window.datetime(k + 1);
                    for path in self.write_dumps(at, tag(at))? {
                        if !dumps.contains(&path) {
                            dumps.push(path);
                        }
                    }
                }
            }
        }
        Ok(dumps)
    }
}

/// Seconds between snapshots, checked against the step of `window`.
fn dump_interval(frequency: Option<Duration>, window: &TimeDomain) -> Result<Option<i64>> {
    let Some(frequency) = frequency else {
        return Ok(None);
    };
    let step = window.step_seconds();
    let secs = frequency.as_secs() as i64;
    if frequency.subsec_nanos() != 0 || secs == 0 || secs % step != 0 {
        return Err(CouplingError::Configuration(format!(
            "dumping frequency {:?} is not a positive multiple of the {}s step",
            frequency, step
        )));
    }
    Ok(Some(secs))
}
