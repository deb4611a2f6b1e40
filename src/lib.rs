// Core of a modular hydrological modelling framework.
// A `Model` binds one component per compartment (surface layer, sub-surface,
// open water) on a shared time and space domain, runs them in a fixed order
// each step while routing exchanged fields between them, and writes restart
// dumps on request.

pub mod component;
pub mod compute;
pub mod config;
pub mod data;
pub mod display;
pub mod domain;
pub mod dump;
pub mod error;
pub mod exchange;
pub mod model;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use component::{Category, Component, ComponentKind, Parameter, Process};
pub use config::{ModelBlueprint, ModelSettings};
pub use data::{DataSet, Variable};
pub use domain::{Calendar, CellLocation, DateTime, GridExtent, SpaceDomain, TimeDomain};
pub use error::{CouplingError, Result};
pub use model::{MemoryRecorder, Model, ModelStatus, RunSummary, SimulateOptions, StepObserver};
pub use store::Field;
