//! Shared fixtures for unit tests.

use crate::component::openwater::LinearReservoir;
use crate::component::subsurface::SoilBucket;
use crate::component::surfacelayer::CanopySnow;
use crate::component::{Category, Component, Parameter};
use crate::config::ModelSettings;
use crate::data::{DataSet, Variable};
use crate::domain::{Calendar, DateTime, GridExtent, SpaceDomain, TimeDomain};
use crate::model::Model;
use crate::store::{Field, Shape};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const DAY: Duration = Duration::from_secs(86_400);

/// Daily steps from 2019-01-01.
pub(crate) fn timedomain(steps: i32) -> TimeDomain {
    TimeDomain::from_start_end_step(
        DateTime::ymd(2019, 1, 1),
        day(1 + steps),
        DAY,
        Calendar::Standard,
        "days since 2019-01-01 00:00:00Z",
    )
    .unwrap()
}

/// January 2019 only.
pub(crate) fn day(d: i32) -> DateTime {
    DateTime::ymd(2019, 1, d as u32)
}

/// A 2 x 3 latitude-longitude grid.
pub(crate) fn spacedomain() -> SpaceDomain {
    SpaceDomain::from_extent_and_resolution(&GridExtent::new((51.0, 53.0), (-2.0, 1.0), 1.0, 1.0)).unwrap()
}

fn pattern(shape: &Shape, k: usize, scale: f64, offset: f64) -> Field {
    let n: usize = shape.iter().product();
    let values = (0..n).map(|i| offset + scale * (1.0 + ((k * 7 + i * 3) % 5) as f64 / 4.0)).collect();
    Field::from_vec(shape.clone(), values).unwrap()
}

fn series(name: &str, units: &str, td: &TimeDomain, shape: &Shape, scale: f64, offset: f64) -> Variable {
    let values = (0..td.len()).map(|k| pattern(shape, k, scale, offset)).collect();
    Variable::driving(name, units, td.clone(), values).unwrap()
}

/// Driving data for every process, plus every category outward for data components.
pub(crate) fn dataset(td: &TimeDomain, sd: &SpaceDomain) -> Arc<DataSet> {
    let shape = sd.shape();
    let mut ds = DataSet::new()
        .with(series("rainfall", "kg m-2 s-1", td, &shape, 3e-5, 0.0))
        .with(series("snowfall", "kg m-2 s-1", td, &shape, 1e-5, 0.0))
        .with(series("air_temperature", "K", td, &shape, 2.0, 270.0))
        .with(Variable::ancillary("vegetation_fraction", "1", Field::filled(&shape, 0.6)));
    for category in Category::ORDER {
        for field in category.outwards() {
            let scale = if field.units == "1" { 0.1 } else { 1e-6 };
            ds.insert(series(field.name, field.units, td, &shape, scale, 0.0));
        }
    }
    Arc::new(ds)
}

/// `'c'` for the example process, `'d'` for data, `'n'` for null.
pub(crate) fn component(kind: char, category: Category, td: &TimeDomain, sd: &SpaceDomain, ds: &Arc<DataSet>) -> Component {
    let params = |name: &str, v: f64| BTreeMap::from([(name.to_string(), Parameter::from(v))]);
    match (kind, category) {
        ('c', Category::SurfaceLayer) => Component::new(
            CanopySnow,
            td.clone(),
            sd.clone(),
            ds.clone(),
            params("evaporation_coefficient", 2e-6),
            BTreeMap::new(),
        )
        .unwrap(),
        ('c', Category::SubSurface) => Component::new(
            SoilBucket,
            td.clone(),
            sd.clone(),
            ds.clone(),
            params("saturated_hydraulic_conductivity", 1e-4),
            BTreeMap::new(),
        )
        .unwrap(),
        ('c', Category::OpenWater) => Component::new(
            LinearReservoir,
            td.clone(),
            sd.clone(),
            ds.clone(),
            params("residence_time", 432_000.0),
            BTreeMap::new(),
        )
        .unwrap(),
        ('d', _) => Component::data(category, td.clone(), sd.clone(), ds.clone()).unwrap(),
        _ => Component::null(category, td.clone(), sd.clone()),
    }
}

pub(crate) fn model(kinds: [char; 3], steps: i32, saving: &Path) -> Model {
    let td = timedomain(steps);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let [sl, ss, ow] = Category::ORDER.map(|c| component(kinds[c.position()], c, &td, &sd, &ds));
    Model::new(ModelSettings::new("test").with_saving_directory(saving), sl, ss, ow).unwrap()
}
