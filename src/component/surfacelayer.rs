//! A canopy interception and degree-day snow scheme.

use super::definition::{Category, ComponentDefinition, ConstantInfo, FieldInfo};
use super::process::{Process, ProcessContext, StepInputs};
use crate::error::Result;
use crate::store::{Field, StateStore};
use rayon::prelude::*;

const FLUX: &str = "kg m-2 s-1";

static DEFINITION: ComponentDefinition = ComponentDefinition {
    category: Category::SurfaceLayer,
    name: "canopy_snow",
    inwards: &[FieldInfo::new("soil_water_stress", "1")],
    outwards: &[
        FieldInfo::new("throughfall", FLUX),
        FieldInfo::new("snowmelt", FLUX),
        FieldInfo::new("transpiration", FLUX),
        FieldInfo::new("evaporation_soil_surface", FLUX),
        FieldInfo::new("evaporation_ponded_water", FLUX),
        FieldInfo::new("evaporation_openwater", FLUX),
    ],
    driving_data: &[
        FieldInfo::new("rainfall", FLUX),
        FieldInfo::new("snowfall", FLUX),
        FieldInfo::new("air_temperature", "K"),
    ],
    ancillary_data: &[FieldInfo::new("vegetation_fraction", "1")],
    parameters: &[FieldInfo::new("evaporation_coefficient", "kg m-2 s-1 K-1")],
    constants: &[
        ConstantInfo::new("canopy_capacity", "kg m-2", Some(0.5)),
        ConstantInfo::new("melting_point", "K", Some(273.15)),
        ConstantInfo::new("degree_day_factor", "kg m-2 s-1 K-1", Some(3.0e-5)),
    ],
    states: &[FieldInfo::new("canopy_store", "kg m-2"), FieldInfo::new("snowpack", "kg m-2")],
    solver_history: 1,
};

/// Vegetation intercepts rain up to a fixed capacity; snow accumulates and
/// melts in proportion to degrees above freezing. Potential evaporation
/// scales with the same temperature excess and is limited by soil water stress.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanopySnow;

struct Cell {
    canopy: f64,
    snowpack: f64,
    fluxes: [f64; 6],
}

impl Process for CanopySnow {
    fn definition(&self) -> &'static ComponentDefinition {
        &DEFINITION
    }

    fn run(&self, ctx: &ProcessContext<'_>, inputs: &StepInputs<'_>, states: &mut StateStore) -> Result<Vec<Field>> {
        let dt = ctx.timestep;
        let capacity = ctx.constant("canopy_capacity")?;
        let melting_point = ctx.constant("melting_point")?;
        let ddf = ctx.constant("degree_day_factor")?;
        let coefficient = ctx.parameter("evaporation_coefficient")?;

        let rain = inputs.driving("rainfall")?.values();
        let snow = inputs.driving("snowfall")?.values();
        let temperature = inputs.driving("air_temperature")?.values();
        let vegetation = inputs.ancillary("vegetation_fraction")?.values();
        let stress = inputs.inward("soil_water_stress")?.values();

        let canopy_prev = states.get("canopy_store")?.previous().values();
        let snow_prev = states.get("snowpack")?.previous().values();

        let cells: Vec<Cell> = (0..ctx.cell_count())
            .into_par_iter()
            .map(|i| {
                let veg = vegetation[i].clamp(0.0, 1.0);
                let excess = (temperature[i] - melting_point).max(0.0);
                let pet = coefficient.at(i) * excess;
                let available = 1.0 - stress[i].clamp(0.0, 1.0);

                let mut canopy = canopy_prev[i] + rain[i] * veg * dt;
                let drainage = (canopy - capacity).max(0.0);
                canopy -= drainage;
                let throughfall = rain[i] * (1.0 - veg) + drainage / dt;

                let mut snowpack = snow_prev[i] + snow[i] * dt;
                let melt = (ddf * excess).min(snowpack / dt);
                snowpack -= melt * dt;

                Cell {
                    canopy,
                    snowpack,
                    fluxes: [
                        throughfall,
                        melt,
                        pet * veg * available,
                        pet * (1.0 - veg) * available,
                        0.1 * pet * (1.0 - veg),
                        pet,
                    ],
                }
            })
            .collect();

        let current = states.get_mut("canopy_store")?.current_mut().values_mut();
        for (slot, cell) in current.iter_mut().zip(&cells) {
            *slot = cell.canopy;
        }
        let current = states.get_mut("snowpack")?.current_mut().values_mut();
        for (slot, cell) in current.iter_mut().zip(&cells) {
            *slot = cell.snowpack;
        }

        (0..DEFINITION.outwards.len())
            .map(|k| Field::from_vec(ctx.shape.clone(), cells.iter().map(|c| c.fluxes[k]).collect()))
            .collect()
    }
}
