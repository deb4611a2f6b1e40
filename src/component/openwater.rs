//! A linear reservoir routing scheme.

use super::definition::{Category, ComponentDefinition, FieldInfo};
use super::process::{Process, ProcessContext, StepInputs};
use crate::error::{CouplingError, Result};
use crate::store::{Field, StateStore};
use rayon::prelude::*;

const FLUX: &str = "kg m-2 s-1";

static DEFINITION: ComponentDefinition = ComponentDefinition {
    category: Category::OpenWater,
    name: "linear_reservoir",
    inwards: &[FieldInfo::new("evaporation_openwater", FLUX), FieldInfo::new("runoff", FLUX)],
    outwards: &[FieldInfo::new("discharge", FLUX)],
    driving_data: &[],
    ancillary_data: &[],
    parameters: &[FieldInfo::new("residence_time", "s")],
    constants: &[],
    states: &[FieldInfo::new("river_store", "kg m-2")],
    solver_history: 1,
};

/// Each cell releases a fixed fraction `dt / residence_time` of its store per step.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearReservoir;

impl Process for LinearReservoir {
    fn definition(&self) -> &'static ComponentDefinition {
        &DEFINITION
    }

    fn initialise(&self, ctx: &ProcessContext<'_>, _states: &mut StateStore) -> Result<()> {
        let residence = ctx.parameter("residence_time")?;
        if residence.values().any(|v| v <= 0.0) {
            return Err(CouplingError::Configuration("residence_time must be positive".into()));
        }
        Ok(())
    }

    fn run(&self, ctx: &ProcessContext<'_>, inputs: &StepInputs<'_>, states: &mut StateStore) -> Result<Vec<Field>> {
        let dt = ctx.timestep;
        let residence = ctx.parameter("residence_time")?;
        let evaporation = inputs.inward("evaporation_openwater")?.values();
        let runoff = inputs.inward("runoff")?.values();

        let history = states.get_mut("river_store")?;
        let previous = history.previous().values();
        let (store, discharge): (Vec<f64>, Vec<f64>) = (0..ctx.cell_count())
            .into_par_iter()
            .map(|i| {
                let store = (previous[i] + (runoff[i] - evaporation[i]) * dt).max(0.0);
                let released = store * (dt / residence.at(i)).min(1.0);
                (store - released, released / dt)
            })
            .unzip();

        history.current_mut().values_mut().copy_from_slice(&store);
        Ok(vec![Field::from_vec(ctx.shape.clone(), discharge)?])
    }
}
