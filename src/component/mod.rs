//! Components: a category, its domains, its data and the behaviour that fills its outwards.

pub mod definition;
pub mod openwater;
pub mod process;
pub mod subsurface;
pub mod surfacelayer;

pub use definition::{Category, ComponentDefinition, ConstantInfo, FieldInfo};
pub use process::{Parameter, Process, ProcessContext, StepInputs};

use crate::data::{units, DataSet};
use crate::domain::{SpaceDomain, TimeDomain};
use crate::dump::Dump;
use crate::error::{CouplingError, Result};
use crate::store::{Field, Shape, StateStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// What produces a component's outwards.
#[derive(Debug)]
pub enum ComponentKind {
    /// Science code.
    Process(Box<dyn Process>),
    /// Outwards read verbatim from the dataset.
    Data,
    /// Outwards are zero everywhere.
    Null,
}

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Process(p) => p.definition().name,
            ComponentKind::Data => "data",
            ComponentKind::Null => "null",
        }
    }
}

#[derive(Debug)]
pub struct Component {
    category: Category,
    kind: ComponentKind,
    timedomain: TimeDomain,
    spacedomain: SpaceDomain,
    shape: Shape,
    dataset: Arc<DataSet>,
    parameters: BTreeMap<String, Parameter>,
    constants: BTreeMap<String, f64>,
    inwards: Vec<FieldInfo>,
    outwards: Vec<FieldInfo>,
    states: StateStore,
    initialised: bool,
}

impl Component {
    /// Binds a process to its domains, data, parameters and constant overrides.
    pub fn new<P: Process + 'static>(
        process: P,
        timedomain: TimeDomain,
        spacedomain: SpaceDomain,
        dataset: Arc<DataSet>,
        parameters: BTreeMap<String, Parameter>,
        constants: BTreeMap<String, f64>,
    ) -> Result<Self> {
        let def = process.definition();
        let shape = spacedomain.shape();
        let category = def.category;

        if def.solver_history == 0 {
            return Err(CouplingError::Configuration(format!(
                "{} process '{}' must keep at least one step of state history",
                category, def.name
            )));
        }
        check_parameters(def, &parameters, &shape)?;
        let constants = resolve_constants(def, constants)?;
        check_dataset(category, &dataset, def.driving_data, def.ancillary_data, &timedomain, &shape)?;

        Ok(Self {
            category,
            kind: ComponentKind::Process(Box::new(process)),
            states: StateStore::zeros(def.states.iter().map(|s| s.name), &shape, def.solver_history),
            timedomain,
            spacedomain,
            shape,
            dataset,
            parameters,
            constants,
            inwards: def.inwards.to_vec(),
            outwards: def.outwards.to_vec(),
            initialised: false,
        })
    }

    /// A component whose outwards are read from `dataset` at each step.
    pub fn data(
        category: Category,
        timedomain: TimeDomain,
        spacedomain: SpaceDomain,
        dataset: Arc<DataSet>,
    ) -> Result<Self> {
        let shape = spacedomain.shape();
        check_dataset(category, &dataset, category.outwards(), &[], &timedomain, &shape)?;
        Ok(Self::passive(category, ComponentKind::Data, timedomain, spacedomain, dataset))
    }

    /// A component whose outwards are all zero.
    pub fn null(category: Category, timedomain: TimeDomain, spacedomain: SpaceDomain) -> Self {
        Self::passive(category, ComponentKind::Null, timedomain, spacedomain, Arc::new(DataSet::new()))
    }

    fn passive(
        category: Category,
        kind: ComponentKind,
        timedomain: TimeDomain,
        spacedomain: SpaceDomain,
        dataset: Arc<DataSet>,
    ) -> Self {
        Self {
            category,
            kind,
            shape: spacedomain.shape(),
            timedomain,
            spacedomain,
            dataset,
            parameters: BTreeMap::new(),
            constants: BTreeMap::new(),
            inwards: Vec::new(),
            outwards: category.outwards().to_vec(),
            states: StateStore::default(),
            initialised: false,
        }
    }

    pub fn category(&self) -> Category { self.category }
    pub fn kind(&self) -> &ComponentKind { &self.kind }
    pub fn timedomain(&self) -> &TimeDomain { &self.timedomain }
    pub fn spacedomain(&self) -> &SpaceDomain { &self.spacedomain }
    pub fn shape(&self) -> &Shape { &self.shape }
    pub fn dataset(&self) -> &Arc<DataSet> { &self.dataset }
    pub fn parameters(&self) -> &BTreeMap<String, Parameter> { &self.parameters }
    pub fn constants(&self) -> &BTreeMap<String, f64> { &self.constants }
    pub fn inwards(&self) -> &[FieldInfo] { &self.inwards }
    pub fn outwards(&self) -> &[FieldInfo] { &self.outwards }
    pub fn states(&self) -> &StateStore { &self.states }
    pub fn is_initialised(&self) -> bool { self.initialised }

    fn history_depth(&self) -> usize {
        match &self.kind {
            ComponentKind::Process(p) => p.definition().solver_history,
            _ => 0,
        }
    }

    fn context(&self) -> ProcessContext<'_> {
        ProcessContext {
            shape: &self.shape,
            timestep: self.timedomain.step_seconds() as f64,
            parameters: &self.parameters,
            constants: &self.constants,
        }
    }

    /// Zeroes every state and lets the process seed its lagged slots.
    pub fn initialise_states(&mut self) -> Result<()> {
        let depth = self.history_depth();
        let names: Vec<String> = self.states.names().map(str::to_string).collect();
        let mut states = StateStore::zeros(names.iter().map(String::as_str), &self.shape, depth);
        if let ComponentKind::Process(p) = &self.kind {
            p.initialise(&self.context(), &mut states)?;
        }
        self.states = states;
        self.initialised = true;
        debug!(component = %self.category, kind = self.kind.name(), "states initialised");
        Ok(())
    }

    /// Drops any state; the next step initialises afresh.
    pub fn reset_states(&mut self) {
        let names: Vec<String> = self.states.names().map(str::to_string).collect();
        self.states = StateStore::zeros(names.iter().map(String::as_str), &self.shape, self.history_depth());
        self.initialised = false;
    }

    /// Advances one step. `inwards` follow the order of [`Component::inwards`];
    /// the result follows [`Component::outwards`].
    pub fn step(&mut self, timestep_index: usize, inwards: &[&Field]) -> Result<Vec<Field>> {
        if timestep_index >= self.timedomain.step_count() {
            return Err(CouplingError::Configuration(format!(
                "step {} is outside the {} steps of the {} component",
                timestep_index,
                self.timedomain.step_count(),
                self.category
            )));
        }
        if inwards.len() != self.inwards.len() {
            return Err(CouplingError::Configuration(format!(
                "{} component expects {} inwards, got {}",
                self.category,
                self.inwards.len(),
                inwards.len()
            )));
        }
        if let Some((info, field)) = self.inwards.iter().zip(inwards).find(|(_, f)| f.shape() != &self.shape) {
            return Err(CouplingError::Data(format!(
                "inward '{}' has shape {:?}, {} component expects {:?}",
                info.name,
                field.shape().as_slice(),
                self.category,
                self.shape.as_slice()
            )));
        }
        if !self.initialised {
            self.initialise_states()?;
        }

        let datetime = self.timedomain.datetime(timestep_index);
        match &self.kind {
            ComponentKind::Null => Ok(self.outwards.iter().map(|_| Field::zeros(&self.shape)).collect()),
            ComponentKind::Data => self
                .outwards
                .iter()
                .map(|f| self.dataset.get(f.name, &datetime).cloned())
                .collect(),
            ComponentKind::Process(process) => {
                let def = process.definition();
                let driving = def
                    .driving_data
                    .iter()
                    .map(|f| Ok((f.name, self.dataset.get(f.name, &datetime)?)))
                    .collect::<Result<Vec<_>>>()?;
                let ancillary = def
                    .ancillary_data
                    .iter()
                    .map(|f| Ok((f.name, self.dataset.get(f.name, &datetime)?)))
                    .collect::<Result<Vec<_>>>()?;
                let inputs = StepInputs {
                    index: timestep_index,
                    datetime,
                    inward_names: &self.inwards,
                    inwards,
                    driving,
                    ancillary,
                };
                let ctx = ProcessContext {
                    shape: &self.shape,
                    timestep: self.timedomain.step_seconds() as f64,
                    parameters: &self.parameters,
                    constants: &self.constants,
                };
                let outputs = process.run(&ctx, &inputs, &mut self.states)?;

                if outputs.len() != self.outwards.len() || outputs.iter().any(|f| f.shape() != &self.shape) {
                    return Err(CouplingError::Configuration(format!(
                        "{} process '{}' returned {} fields, {} of shape {:?} were declared",
                        self.category,
                        def.name,
                        outputs.len(),
                        self.outwards.len(),
                        self.shape.as_slice()
                    )));
                }
                self.states.rotate();
                Ok(outputs)
            }
        }
    }

    /// Checks that `dump` fits this component without changing anything.
    pub fn check_dump(&self, dump: &Dump) -> Result<()> {
        if dump.category != self.category {
            return Err(CouplingError::Dump(format!(
                "dump belongs to the {} component, not {}",
                dump.category, self.category
            )));
        }
        if dump.calendar != self.timedomain.calendar() {
            return Err(CouplingError::Dump(format!(
                "dump calendar '{}' differs from the {} component's '{}'",
                dump.calendar,
                self.category,
                self.timedomain.calendar()
            )));
        }
        let expected: BTreeSet<&str> = self.states.names().collect();
        let found: BTreeSet<&str> = dump.states.keys().map(String::as_str).collect();
        if expected != found {
            return Err(CouplingError::Dump(format!(
                "{} component states {:?} do not match dumped states {:?}",
                self.category, expected, found
            )));
        }
        let depth = self.history_depth();
        for (name, history) in &dump.states {
            if history.depth() != depth || history.slots().any(|f| f.shape() != &self.shape) {
                return Err(CouplingError::Dump(format!(
                    "state '{}' was dumped with history {} and shape {:?}, the {} component needs history {} and shape {:?}",
                    name,
                    history.depth(),
                    history.shape().as_slice(),
                    self.category,
                    depth,
                    self.shape.as_slice()
                )));
            }
        }
        Ok(())
    }

    /// Replaces all states with those held in `dump`.
    pub fn initialise_states_from_dump(&mut self, dump: &Dump) -> Result<()> {
        self.check_dump(dump)?;
        self.states = StateStore::from(dump.states.clone());
        self.initialised = true;
        debug!(component = %self.category, timestamp = %dump.timestamp, "states restored from dump");
        Ok(())
    }
}

fn check_parameters(
    def: &ComponentDefinition,
    parameters: &BTreeMap<String, Parameter>,
    shape: &Shape,
) -> Result<()> {
    for info in def.parameters {
        match parameters.get(info.name) {
            None => {
                return Err(CouplingError::Configuration(format!(
                    "{} process '{}' requires parameter '{}' [{}]",
                    def.category, def.name, info.name, info.units
                )))
            }
            Some(Parameter::Field(f)) if f.shape() != shape => {
                return Err(CouplingError::Configuration(format!(
                    "parameter '{}' has shape {:?}, the grid is {:?}",
                    info.name,
                    f.shape().as_slice(),
                    shape.as_slice()
                )))
            }
            Some(p) if p.values().any(|v| !v.is_finite()) => {
                return Err(CouplingError::Configuration(format!(
                    "parameter '{}' holds non-finite values",
                    info.name
                )))
            }
            Some(_) => {}
        }
    }
    if let Some(unknown) = parameters.keys().find(|k| !def.parameters.iter().any(|p| p.name == k.as_str())) {
        return Err(CouplingError::Configuration(format!(
            "{} process '{}' has no parameter named '{}'",
            def.category, def.name, unknown
        )));
    }
    Ok(())
}

fn resolve_constants(def: &ComponentDefinition, overrides: BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>> {
    if let Some(unknown) = overrides.keys().find(|k| !def.constants.iter().any(|c| c.name == k.as_str())) {
        return Err(CouplingError::Configuration(format!(
            "{} process '{}' has no constant named '{}'",
            def.category, def.name, unknown
        )));
    }
    def.constants
        .iter()
        .map(|c| {
            overrides
                .get(c.name)
                .copied()
                .or(c.default)
                .map(|v| (c.name.to_string(), v))
                .ok_or_else(|| {
                    CouplingError::Configuration(format!(
                        "{} process '{}' requires constant '{}' [{}]",
                        def.category, def.name, c.name, c.units
                    ))
                })
        })
        .collect()
}

/// Driving variables must cover every simulated instant; ancillary ones must be static.
fn check_dataset(
    category: Category,
    dataset: &DataSet,
    driving: &[FieldInfo],
    ancillary: &[FieldInfo],
    timedomain: &TimeDomain,
    shape: &Shape,
) -> Result<()> {
    for info in driving.iter().chain(ancillary) {
        let variable = dataset.variable(info.name).ok_or_else(|| {
            CouplingError::Data(format!(
                "no data '{}' available in the dataset for the {} component",
                info.name, category
            ))
        })?;
        if !units::equivalent(variable.units(), info.units) {
            return Err(CouplingError::Data(format!(
                "units of variable '{}' are '{}', the {} component expects '{}'",
                info.name,
                variable.units(),
                category,
                info.units
            )));
        }
        if variable.shape() != shape {
            return Err(CouplingError::Data(format!(
                "variable '{}' has shape {:?}, the {} component grid is {:?}",
                info.name,
                variable.shape().as_slice(),
                category,
                shape.as_slice()
            )));
        }
    }

    for info in driving {
        let Some(td) = dataset.variable(info.name).and_then(|v| v.timedomain()) else {
            return Err(CouplingError::Data(format!(
                "variable '{}' is static but the {} component needs it along time",
                info.name, category
            )));
        };
        if td.calendar() != timedomain.calendar() {
            return Err(CouplingError::Data(format!(
                "variable '{}' uses the '{}' calendar, the {} component uses '{}'",
                info.name,
                td.calendar(),
                category,
                timedomain.calendar()
            )));
        }
        // The last timestamp closes the final step and needs no data.
        if let Some(i) = (0..timedomain.step_count()).find(|&i| td.index_of_instant(timedomain.instant(i)).is_none()) {
            return Err(CouplingError::Data(format!(
                "variable '{}' has no value at {} required by the {} component",
                info.name,
                timedomain.datetime(i),
                category
            )));
        }
    }

    for info in ancillary {
        if dataset.variable(info.name).is_some_and(|v| !v.is_static()) {
            return Err(CouplingError::Data(format!(
                "ancillary variable '{}' must not vary along time",
                info.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
