use super::openwater::LinearReservoir;
use super::subsurface::SoilBucket;
use super::surfacelayer::CanopySnow;
use super::*;
use crate::data::Variable;
use crate::domain::{Calendar, DateTime};
use crate::dump::DUMP_VERSION;
use crate::testing::{component, dataset, spacedomain, timedomain, DAY};
use rstest::rstest;

fn zeros_for(c: &Component) -> Vec<Field> {
    c.inwards().iter().map(|_| Field::zeros(c.shape())).collect()
}

fn step_with_zeros(c: &mut Component, index: usize) -> Result<Vec<Field>> {
    let inwards = zeros_for(c);
    let refs: Vec<&Field> = inwards.iter().collect();
    c.step(index, &refs)
}

#[test]
fn test_null_component_yields_zeros() {
    let mut c = Component::null(Category::SubSurface, timedomain(3), spacedomain());
    assert!(c.inwards().is_empty());
    let out = c.step(0, &[]).unwrap();
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|f| f.values().iter().all(|&v| v == 0.0)));
}

#[test]
fn test_data_component_replays_dataset() {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let mut c = Component::data(Category::OpenWater, td.clone(), sd, ds.clone()).unwrap();
    let out = c.step(2, &[]).unwrap();
    assert_eq!(&out[0], ds.get("discharge", &td.datetime(2)).unwrap());
}

#[test]
fn test_data_component_requires_its_outwards() {
    let td = timedomain(3);
    let sd = spacedomain();
    let res = Component::data(Category::OpenWater, td, sd, Arc::new(DataSet::new()));
    assert!(matches!(res, Err(CouplingError::Data(msg)) if msg.contains("discharge")));
}

#[test]
fn test_missing_parameter_is_configuration_error() {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let res = Component::new(SoilBucket, td, sd, ds, BTreeMap::new(), BTreeMap::new());
    assert!(matches!(res, Err(CouplingError::Configuration(msg)) if msg.contains("saturated_hydraulic_conductivity")));
}

#[rstest]
#[case::unknown_parameter(&[("residence_time", 1e5), ("porosity", 0.3)], &[])]
#[case::unknown_constant(&[("residence_time", 1e5)], &[("gravity", 9.81)])]
fn test_unknown_names_are_rejected(#[case] params: &[(&str, f64)], #[case] consts: &[(&str, f64)]) {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let parameters = params.iter().map(|&(k, v)| (k.to_string(), Parameter::from(v))).collect();
    let constants = consts.iter().map(|&(k, v)| (k.to_string(), v)).collect();
    let res = Component::new(LinearReservoir, td, sd, ds, parameters, constants);
    assert!(matches!(res, Err(CouplingError::Configuration(_))));
}

#[test]
fn test_parameter_field_must_match_grid() {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let wrong = Field::zeros(&smallvec::smallvec![3, 2]);
    let parameters = BTreeMap::from([("residence_time".to_string(), Parameter::Field(wrong))]);
    let res = Component::new(LinearReservoir, td, sd, ds, parameters, BTreeMap::new());
    assert!(matches!(res, Err(CouplingError::Configuration(_))));
}

#[test]
fn test_constant_override_and_defaults() {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let parameters = BTreeMap::from([("saturated_hydraulic_conductivity".to_string(), Parameter::from(1e-4))]);
    let constants = BTreeMap::from([("soil_capacity".to_string(), 150.0)]);
    let c = Component::new(SoilBucket, td, sd, ds, parameters, constants).unwrap();
    assert_eq!(c.constants()["soil_capacity"], 150.0);
    assert_eq!(c.constants()["initial_saturation"], 0.5);
}

#[test]
fn test_driving_units_must_match() {
    let td = timedomain(3);
    let sd = spacedomain();
    let shape = sd.shape();
    let values = (0..td.len()).map(|_| Field::zeros(&shape)).collect::<Vec<_>>();
    let mut ds = (*dataset(&td, &sd)).clone();
    ds.insert(Variable::driving("air_temperature", "degC", td.clone(), values).unwrap());
    let parameters = BTreeMap::from([("evaporation_coefficient".to_string(), Parameter::from(1e-6))]);
    let res = Component::new(CanopySnow, td, sd, Arc::new(ds), parameters, BTreeMap::new());
    assert!(matches!(res, Err(CouplingError::Data(msg)) if msg.contains("air_temperature")));
}

#[test]
fn test_driving_data_needs_no_value_at_last_timestamp() {
    let td = timedomain(4);
    let sd = spacedomain();
    let shorter = timedomain(3);
    let ds = dataset(&shorter, &sd);
    assert!(Component::data(Category::OpenWater, td.clone(), sd.clone(), ds).is_ok());

    let ds = dataset(&timedomain(2), &sd);
    assert!(matches!(Component::data(Category::OpenWater, td, sd, ds), Err(CouplingError::Data(_))));
}

#[test]
fn test_driving_calendar_must_match() {
    let sd = spacedomain();
    let td = TimeDomain::from_start_end_step(
        DateTime::ymd(2019, 1, 1),
        DateTime::ymd(2019, 1, 4),
        DAY,
        Calendar::NoLeap,
        "days since 2019-01-01",
    )
    .unwrap();
    let ds = dataset(&timedomain(3), &sd);
    let res = Component::data(Category::OpenWater, td, sd, ds);
    assert!(matches!(res, Err(CouplingError::Data(msg)) if msg.contains("calendar")));
}

#[test]
fn test_step_rotates_history_and_seeds_lagged_state() {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let mut c = component('c', Category::SubSurface, &td, &sd, &ds);
    assert!(!c.is_initialised());

    step_with_zeros(&mut c, 0).unwrap();
    assert!(c.is_initialised());
    let history = c.states().get("soil_moisture").unwrap();
    assert!(history.current().values().iter().all(|&v| v == 0.0));
    // seeded at 150, then drained a little
    assert!(history.previous().values().iter().all(|&v| v > 100.0 && v < 150.0));
}

#[test]
fn test_step_index_out_of_range() {
    let mut c = Component::null(Category::OpenWater, timedomain(3), spacedomain());
    assert!(c.step(2, &[]).is_ok());
    assert!(matches!(c.step(3, &[]), Err(CouplingError::Configuration(_))));
}

#[test]
fn test_restored_states_reproduce_step() {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let mut a = component('c', Category::OpenWater, &td, &sd, &ds);
    let mut b = component('c', Category::OpenWater, &td, &sd, &ds);
    let runoff = Field::filled(a.shape(), 2e-5);
    let evap = Field::filled(a.shape(), 1e-6);

    a.step(0, &[&evap, &runoff]).unwrap();
    let dump = Dump {
        version: DUMP_VERSION,
        model: "test".into(),
        category: Category::OpenWater,
        kind: "linear_reservoir".into(),
        calendar: Calendar::Standard,
        timestamp: td.datetime(1),
        states: a.states().iter().map(|(n, h)| (n.to_string(), h.clone())).collect(),
        outwards: BTreeMap::new(),
    };
    b.initialise_states_from_dump(&dump).unwrap();
    assert_eq!(a.step(1, &[&evap, &runoff]).unwrap(), b.step(1, &[&evap, &runoff]).unwrap());
}

#[test]
fn test_dump_with_wrong_shape_is_rejected() {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let mut c = component('c', Category::OpenWater, &td, &sd, &ds);
    let bad = crate::store::StateHistory::zeros(&smallvec::smallvec![1, 1], 1);
    let dump = Dump {
        version: DUMP_VERSION,
        model: "test".into(),
        category: Category::OpenWater,
        kind: "linear_reservoir".into(),
        calendar: Calendar::Standard,
        timestamp: td.datetime(0),
        states: BTreeMap::from([("river_store".to_string(), bad)]),
        outwards: BTreeMap::new(),
    };
    assert!(matches!(c.initialise_states_from_dump(&dump), Err(CouplingError::Dump(_))));

    let renamed = Dump { states: BTreeMap::new(), ..dump };
    assert!(matches!(c.initialise_states_from_dump(&renamed), Err(CouplingError::Dump(_))));
    assert!(!c.is_initialised());
}

#[test]
fn test_dump_with_wrong_lagged_slot_is_rejected() {
    let td = timedomain(3);
    let sd = spacedomain();
    let ds = dataset(&td, &sd);
    let mut c = component('c', Category::OpenWater, &td, &sd, &ds);
    let mut history = crate::store::StateHistory::zeros(c.shape(), 1);
    *history.lag_mut(1).unwrap() = Field::zeros(&smallvec::smallvec![1]);
    let dump = Dump {
        version: DUMP_VERSION,
        model: "test".into(),
        category: Category::OpenWater,
        kind: "linear_reservoir".into(),
        calendar: Calendar::Standard,
        timestamp: td.datetime(0),
        states: BTreeMap::from([("river_store".to_string(), history)]),
        outwards: BTreeMap::new(),
    };
    assert!(matches!(c.initialise_states_from_dump(&dump), Err(CouplingError::Dump(_))));
    assert!(!c.is_initialised());
}
