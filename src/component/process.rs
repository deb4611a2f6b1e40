//! The extension point for science: a `Process` turns inwards and data into outwards.

use super::definition::{ComponentDefinition, FieldInfo};
use crate::domain::DateTime;
use crate::error::{CouplingError, Result};
use crate::store::{Field, Shape, StateStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A parameter value: uniform, or one value per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    Scalar(f64),
    Field(Field),
}

impl Parameter {
    #[inline(always)]
    pub fn at(&self, cell: usize) -> f64 {
        match self {
            Parameter::Scalar(v) => *v,
            Parameter::Field(f) => f.values()[cell],
        }
    }

    pub fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Parameter::Scalar(v) => Box::new(std::iter::once(*v)),
            Parameter::Field(f) => Box::new(f.values().iter().copied()),
        }
    }
}

impl From<f64> for Parameter {
    fn from(v: f64) -> Self {
        Parameter::Scalar(v)
    }
}

impl From<Field> for Parameter {
    fn from(f: Field) -> Self {
        Parameter::Field(f)
    }
}

/// Values fixed for the lifetime of a component.
pub struct ProcessContext<'a> {
    pub shape: &'a Shape,
    /// Length of one step, in seconds.
    pub timestep: f64,
    pub(crate) parameters: &'a BTreeMap<String, Parameter>,
    pub(crate) constants: &'a BTreeMap<String, f64>,
}

impl<'a> ProcessContext<'a> {
    pub fn cell_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn parameter(&self, name: &str) -> Result<&'a Parameter> {
        self.parameters
            .get(name)
            .ok_or_else(|| CouplingError::Configuration(format!("no parameter named '{}'", name)))
    }

    pub fn constant(&self, name: &str) -> Result<f64> {
        self.constants
            .get(name)
            .copied()
            .ok_or_else(|| CouplingError::Configuration(format!("no constant named '{}'", name)))
    }
}

/// Everything that varies from one step to the next.
pub struct StepInputs<'a> {
    pub index: usize,
    pub datetime: DateTime,
    pub(crate) inward_names: &'a [FieldInfo],
    pub(crate) inwards: &'a [&'a Field],
    pub(crate) driving: Vec<(&'static str, &'a Field)>,
    pub(crate) ancillary: Vec<(&'static str, &'a Field)>,
}

impl<'a> StepInputs<'a> {
    pub fn inward(&self, name: &str) -> Result<&'a Field> {
        self.inward_names
            .iter()
            .position(|f| f.name == name)
            .map(|i| self.inwards[i])
            .ok_or_else(|| CouplingError::Configuration(format!("no inward named '{}'", name)))
    }

    pub fn driving(&self, name: &str) -> Result<&'a Field> {
        lookup(&self.driving, name, "driving data")
    }

    pub fn ancillary(&self, name: &str) -> Result<&'a Field> {
        lookup(&self.ancillary, name, "ancillary data")
    }
}

fn lookup<'a>(pairs: &[(&'static str, &'a Field)], name: &str, what: &str) -> Result<&'a Field> {
    pairs
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
        .ok_or_else(|| CouplingError::Configuration(format!("no {} named '{}'", what, name)))
}

/// Science code plugged into a component.
///
/// `run` writes the current slot of each state (slot 0) and returns one field
/// per declared outward, in declaration order. State history is rotated by
/// the component after `run` returns.
pub trait Process: fmt::Debug + Send + Sync {
    fn definition(&self) -> &'static ComponentDefinition;

    /// Seeds lagged state slots before the first step. States start at zero otherwise.
    fn initialise(&self, _ctx: &ProcessContext<'_>, _states: &mut StateStore) -> Result<()> {
        Ok(())
    }

    fn run(&self, ctx: &ProcessContext<'_>, inputs: &StepInputs<'_>, states: &mut StateStore) -> Result<Vec<Field>>;
}
