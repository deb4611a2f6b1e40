//! Named gridded variables available to components as driving or ancillary data.

use crate::domain::{DateTime, TimeDomain};
use crate::error::{CouplingError, Result};
use crate::store::{Field, Shape};
use std::collections::BTreeMap;

/// A named array, either static or indexed along its own time domain.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    units: String,
    timedomain: Option<TimeDomain>,
    shape: Shape,
    values: Vec<Field>,
}

impl Variable {
    /// A time-varying variable with one field per timestamp of `timedomain`.
    pub fn driving(name: &str, units: &str, timedomain: TimeDomain, values: Vec<Field>) -> Result<Self> {
        if values.len() != timedomain.len() {
            return Err(CouplingError::Data(format!(
                "variable '{}' holds {} fields for {} timestamps",
                name,
                values.len(),
                timedomain.len()
            )));
        }
        let shape = values[0].shape().clone();
        if values.iter().any(|f| f.shape() != &shape) {
            return Err(CouplingError::Data(format!(
                "variable '{}' changes shape along time",
                name
            )));
        }
        Ok(Self { name: name.to_string(), units: units.to_string(), timedomain: Some(timedomain), shape, values })
    }

    /// A time-invariant variable.
    pub fn ancillary(name: &str, units: &str, field: Field) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            timedomain: None,
            shape: field.shape().clone(),
            values: vec![field],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn timedomain(&self) -> Option<&TimeDomain> {
        self.timedomain.as_ref()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_static(&self) -> bool {
        self.timedomain.is_none()
    }

    /// The field valid at `timestamp`. Static variables ignore the timestamp.
    pub fn at(&self, timestamp: &DateTime) -> Result<&Field> {
        let index = match &self.timedomain {
            None => 0,
            Some(td) => td.index_of(timestamp).ok_or_else(|| {
                CouplingError::Data(format!(
                    "variable '{}' has no value at {}",
                    self.name, timestamp
                ))
            })?,
        };
        Ok(&self.values[index])
    }

    /// Field at `instant` on this variable's calendar scale.
    pub fn at_instant(&self, instant: i64) -> Option<&Field> {
        match &self.timedomain {
            None => self.values.first(),
            Some(td) => td.index_of_instant(instant).map(|i| &self.values[i]),
        }
    }
}

/// Variables keyed by the field name components look them up under.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    variables: BTreeMap<String, Variable>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: Variable) -> Option<Variable> {
        self.variables.insert(variable.name.clone(), variable)
    }

    pub fn with(mut self, variable: Variable) -> Self {
        self.insert(variable);
        self
    }

    /// Renames variables from source names to the names components expect.
    /// Sources absent from the set are skipped.
    pub fn with_name_mapping(mut self, mapping: &[(&str, &str)]) -> Self {
        for &(from, to) in mapping {
            if let Some(mut variable) = self.variables.remove(from) {
                variable.name = to.to_string();
                self.variables.insert(to.to_string(), variable);
            }
        }
        self
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, field_name: &str, timestamp: &DateTime) -> Result<&Field> {
        self.variables
            .get(field_name)
            .ok_or_else(|| CouplingError::Data(format!("no variable '{}' in the dataset", field_name)))?
            .at(timestamp)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Calendar;
    use smallvec::smallvec;

    fn hourly() -> TimeDomain {
        TimeDomain::new(&[0.0, 1.0, 2.0], "hours since 2019-01-01", Calendar::Standard).unwrap()
    }

    fn rainfall() -> Variable {
        let shape: Shape = smallvec![1, 2];
        let values = (0..3).map(|k| Field::filled(&shape, k as f64)).collect();
        Variable::driving("rainfall_flux", "kg m-2 s-1", hourly(), values).unwrap()
    }

    #[test]
    fn test_get_by_timestamp() {
        let ds = DataSet::new().with(rainfall());
        let field = ds.get("rainfall_flux", &DateTime::new(2019, 1, 1, 2, 0, 0)).unwrap();
        assert_eq!(field.values(), &[2.0, 2.0]);
        assert!(matches!(
            ds.get("rainfall_flux", &DateTime::new(2019, 1, 1, 3, 0, 0)),
            Err(CouplingError::Data(_))
        ));
        assert!(matches!(ds.get("snowfall_flux", &DateTime::ymd(2019, 1, 1)), Err(CouplingError::Data(_))));
    }

    #[test]
    fn test_static_variable_ignores_time() {
        let ds = DataSet::new().with(Variable::ancillary("vegetation_fraction", "1", Field::filled(&smallvec![1, 2], 0.4)));
        let field = ds.get("vegetation_fraction", &DateTime::ymd(1900, 6, 1)).unwrap();
        assert_eq!(field.values(), &[0.4, 0.4]);
    }

    #[test]
    fn test_name_mapping() {
        let ds = DataSet::new().with(rainfall()).with_name_mapping(&[("rainfall_flux", "rainfall"), ("absent", "x")]);
        assert!(ds.contains("rainfall"));
        assert!(!ds.contains("rainfall_flux"));
        assert_eq!(ds.variable("rainfall").unwrap().name(), "rainfall");
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_driving_requires_one_field_per_timestamp() {
        let res = Variable::driving("x", "1", hourly(), vec![Field::zeros(&smallvec![1])]);
        assert!(matches!(res, Err(CouplingError::Data(_))));
    }
}
