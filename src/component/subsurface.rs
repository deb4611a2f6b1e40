//! A single-layer soil bucket with gravity drainage.

use super::definition::{Category, ComponentDefinition, ConstantInfo, FieldInfo};
use super::process::{Process, ProcessContext, StepInputs};
use crate::compute::kernel;
use crate::error::{CouplingError, Result};
use crate::store::{Field, StateStore};
use rayon::prelude::*;

const FLUX: &str = "kg m-2 s-1";

static DEFINITION: ComponentDefinition = ComponentDefinition {
    category: Category::SubSurface,
    name: "soil_bucket",
    inwards: &[
        FieldInfo::new("throughfall", FLUX),
        FieldInfo::new("snowmelt", FLUX),
        FieldInfo::new("transpiration", FLUX),
        FieldInfo::new("evaporation_soil_surface", FLUX),
        FieldInfo::new("evaporation_ponded_water", FLUX),
    ],
    outwards: &[FieldInfo::new("runoff", FLUX), FieldInfo::new("soil_water_stress", "1")],
    driving_data: &[],
    ancillary_data: &[],
    parameters: &[FieldInfo::new("saturated_hydraulic_conductivity", FLUX)],
    constants: &[
        ConstantInfo::new("soil_capacity", "kg m-2", Some(300.0)),
        ConstantInfo::new("initial_saturation", "1", Some(0.5)),
    ],
    states: &[FieldInfo::new("soil_moisture", "kg m-2")],
    solver_history: 1,
};

/// Net surface input fills the bucket; any excess over capacity runs off at
/// once, and the rest drains at a rate proportional to saturation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoilBucket;

impl Process for SoilBucket {
    fn definition(&self) -> &'static ComponentDefinition {
        &DEFINITION
    }

    fn initialise(&self, ctx: &ProcessContext<'_>, states: &mut StateStore) -> Result<()> {
        let capacity = soil_capacity(ctx)?;
        let seed = capacity * ctx.constant("initial_saturation")?.clamp(0.0, 1.0);
        states.get_mut("soil_moisture")?.previous_mut().fill(seed);
        Ok(())
    }

    fn run(&self, ctx: &ProcessContext<'_>, inputs: &StepInputs<'_>, states: &mut StateStore) -> Result<Vec<Field>> {
        let dt = ctx.timestep;
        let capacity = soil_capacity(ctx)?;
        let ksat = ctx.parameter("saturated_hydraulic_conductivity")?;

        let mut infiltration = vec![0.0; ctx.cell_count()];
        kernel::weighted_sum(
            &mut infiltration,
            &[
                (1.0, inputs.inward("throughfall")?.values()),
                (1.0, inputs.inward("snowmelt")?.values()),
                (-1.0, inputs.inward("transpiration")?.values()),
                (-1.0, inputs.inward("evaporation_soil_surface")?.values()),
                (-1.0, inputs.inward("evaporation_ponded_water")?.values()),
            ],
        );

        let history = states.get_mut("soil_moisture")?;
        let mut moisture = vec![0.0; ctx.cell_count()];
        kernel::weighted_sum(&mut moisture, &[(1.0, history.previous().values()), (dt, &infiltration)]);
        kernel::clamp_min(&mut moisture, 0.0);

        let (runoff, stress): (Vec<f64>, Vec<f64>) = moisture
            .par_iter_mut()
            .enumerate()
            .map(|(i, theta)| {
                let surplus = (*theta - capacity).max(0.0);
                *theta -= surplus;
                let drainage = (ksat.at(i).max(0.0) * *theta / capacity).min(*theta / dt);
                *theta -= drainage * dt;
                (surplus / dt + drainage, (1.0 - *theta / capacity).clamp(0.0, 1.0))
            })
            .unzip();

        history.current_mut().values_mut().copy_from_slice(&moisture);
        Ok(vec![
            Field::from_vec(ctx.shape.clone(), runoff)?,
            Field::from_vec(ctx.shape.clone(), stress)?,
        ])
    }
}

fn soil_capacity(ctx: &ProcessContext<'_>) -> Result<f64> {
    let capacity = ctx.constant("soil_capacity")?;
    if capacity <= 0.0 {
        return Err(CouplingError::Configuration(format!(
            "soil_capacity must be positive, got {}",
            capacity
        )));
    }
    Ok(capacity)
}
