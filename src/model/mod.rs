//! The model: three components bound on shared domains, run in a fixed order.

mod recorder;
mod run;

pub use recorder::{MemoryRecorder, NullObserver, RecordedStep, StepObserver, StepRecord};
pub use run::{RunSummary, SimulateOptions};

use crate::component::{Category, Component};
use crate::config::{ComponentBlueprint, ModelBlueprint, ModelSettings, SpaceSummary, TimeSummary};
use crate::display::describe;
use crate::domain::{DateTime, SpaceDomain, TimeDomain};
use crate::dump::{self, dump_file_name, Dump, DumpTag, DUMP_VERSION};
use crate::error::{CouplingError, Result};
use crate::exchange::{ExchangePlan, Exchanger};
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Unvalidated,
    Validated,
    Running,
    Completed,
    Failed,
}

#[derive(Debug)]
pub struct Model {
    settings: ModelSettings,
    components: [Component; 3],
    plan: ExchangePlan,
    exchanger: Exchanger,
    status: ModelStatus,
}

impl Model {
    /// Binds one component per category and validates them together.
    pub fn new(
        settings: ModelSettings,
        surfacelayer: Component,
        subsurface: Component,
        openwater: Component,
    ) -> Result<Self> {
        settings.validate()?;
        let components = [surfacelayer, subsurface, openwater];
        for (component, expected) in components.iter().zip(Category::ORDER) {
            if component.category() != expected {
                return Err(CouplingError::Configuration(format!(
                    "the {} slot was given a {} component",
                    expected,
                    component.category()
                )));
            }
        }
        let mut model = Self {
            settings,
            components,
            plan: ExchangePlan::default(),
            exchanger: Exchanger::default(),
            status: ModelStatus::Unvalidated,
        };
        model.validate()?;
        Ok(model)
    }

    /// Cross-checks domains and resolves the exchange plan. All problems are
    /// logged; the first one is returned.
    pub fn validate(&mut self) -> Result<()> {
        match Validator::new(&self.components).validate() {
            Ok(plan) => {
                self.exchanger = Exchanger::new(&plan.registry, self.components[0].shape());
                self.plan = plan;
                self.status = ModelStatus::Validated;
                info!(model = %self.settings.identifier, slots = self.exchanger.len(), "model validated");
                Ok(())
            }
            Err(errors) => {
                for err in &errors {
                    warn!(model = %self.settings.identifier, component = %err.component, "{}", err.message);
                }
                Err(errors
                    .into_iter()
                    .next()
                    .map(CouplingError::from)
                    .unwrap_or_else(|| CouplingError::Configuration("validation failed".into())))
            }
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn identifier(&self) -> &str {
        &self.settings.identifier
    }

    pub fn status(&self) -> ModelStatus {
        self.status
    }

    pub fn component(&self, category: Category) -> &Component {
        &self.components[category.position()]
    }

    pub fn components(&self) -> &[Component; 3] {
        &self.components
    }

    pub fn exchange_plan(&self) -> &ExchangePlan {
        &self.plan
    }

    /// The time domain all components share.
    pub fn timedomain(&self) -> &TimeDomain {
        self.components[0].timedomain()
    }

    pub fn spacedomain(&self) -> &SpaceDomain {
        self.components[0].spacedomain()
    }

    /// Latest value of a transferred field.
    pub fn transfer(&self, name: &str) -> Option<&crate::store::Field> {
        self.plan.registry.lookup(name).map(|slot| self.exchanger.get(slot))
    }

    /// Returns every component and the exchanger to their uninitialised state.
    pub fn reset_states(&mut self) {
        self.components.iter_mut().for_each(Component::reset_states);
        self.exchanger.reset();
    }

    /// Restores all components, and the transfers they produce, from the dumps
    /// in `directory` taken at `at`, or from the latest ones.
    pub fn initialise_states_from_dump(&mut self, directory: &Path, at: Option<&DateTime>) -> Result<()> {
        let identifier = self.settings.identifier.clone();
        let mut chosen = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let category = component.category();
            let dumps = dump::find_dumps(directory, &identifier, category)?;
            let (path, dump) = dump::select_dump(dumps, at).ok_or_else(|| {
                CouplingError::Dump(format!(
                    "no dump{} for the {} component of model '{}' in '{}'",
                    at.map(|dt| format!(" at {}", dt)).unwrap_or_default(),
                    category,
                    identifier,
                    directory.display()
                ))
            })?;
            component.check_dump(&dump)?;
            if let Some(missing) = component.outwards().iter().find(|f| {
                dump.outwards.get(f.name).map(|v| v.shape()) != Some(component.shape())
            }) {
                return Err(CouplingError::Dump(format!(
                    "'{}' lacks a valid '{}' outward for the {} component",
                    path.display(),
                    missing.name,
                    category
                )));
            }
            chosen.push(dump);
        }

        let timestamp = chosen[0].timestamp;
        if chosen.iter().any(|d| d.timestamp != timestamp) {
            return Err(CouplingError::Dump(format!(
                "dumps of model '{}' in '{}' were not taken at the same time",
                identifier,
                directory.display()
            )));
        }
        if self.timedomain().index_of(&timestamp).is_none() {
            warn!(model = %identifier, %timestamp, "restored dump is not on the model's time domain");
        }

        for (component, dump) in self.components.iter_mut().zip(&chosen) {
            component.initialise_states_from_dump(dump)?;
            for (info, &slot) in component.outwards().iter().zip(self.plan.outwards(component.category())) {
                if let Some(field) = dump.outwards.get(info.name) {
                    self.exchanger.set(slot, field.clone());
                }
            }
        }
        info!(model = %identifier, %timestamp, "states restored from dumps");
        Ok(())
    }

    /// Writes one dump per component into the saving directory.
    fn write_dumps(&self, timestamp: DateTime, tag: DumpTag) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let category = component.category();
            let dump = Dump {
                version: DUMP_VERSION,
                model: self.settings.identifier.clone(),
                category,
                kind: component.kind().name().to_string(),
                calendar: component.timedomain().calendar(),
                timestamp,
                states: component.states().iter().map(|(n, h)| (n.to_string(), h.clone())).collect(),
                outwards: component
                    .outwards()
                    .iter()
                    .zip(self.plan.outwards(category))
                    .map(|(f, &slot)| (f.name.to_string(), self.exchanger.get(slot).clone()))
                    .collect(),
            };
            let path = self
                .settings
                .saving_directory
                .join(dump_file_name(&self.settings.identifier, category, tag));
            dump.write_atomic(&path)?;
            paths.push(path);
        }
        info!(model = %self.settings.identifier, %timestamp, files = paths.len(), "dumps written");
        Ok(paths)
    }

    pub fn blueprint(&self) -> ModelBlueprint {
        ModelBlueprint {
            identifier: self.settings.identifier.clone(),
            config_directory: self.settings.config_directory.clone(),
            saving_directory: self.settings.saving_directory.clone(),
            components: self
                .components
                .iter()
                .map(|c| {
                    let td = c.timedomain();
                    ComponentBlueprint {
                        category: c.category(),
                        kind: c.kind().name().to_string(),
                        inwards: c.inwards().iter().map(|f| f.name.to_string()).collect(),
                        outwards: c.outwards().iter().map(|f| f.name.to_string()).collect(),
                        parameters: c.parameters().clone(),
                        constants: c.constants().clone(),
                        timedomain: TimeSummary {
                            start: td.first(),
                            end: td.last(),
                            step_seconds: td.step_seconds(),
                            calendar: td.calendar(),
                            units: td.units().to_string(),
                        },
                        spacedomain: SpaceSummary {
                            kind: *c.spacedomain().kind(),
                            shape: c.shape().to_vec(),
                        },
                    }
                })
                .collect(),
        }
    }

    pub fn describe(&self) -> String {
        describe::describe_model(self)
    }
}
