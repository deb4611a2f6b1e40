use crate::error::{CouplingError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Grid shape, `[z?, y, x]`.
pub type Shape = SmallVec<[usize; 3]>;

/// Index of a transfer slot in the exchanger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl SlotId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// A gridded array of values, stored row-major over its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawField")]
pub struct Field {
    shape: Shape,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct RawField {
    shape: Shape,
    values: Vec<f64>,
}

impl TryFrom<RawField> for Field {
    type Error = CouplingError;

    fn try_from(raw: RawField) -> Result<Self> {
        Field::from_vec(raw.shape, raw.values)
    }
}

impl Field {
    pub fn zeros(shape: &Shape) -> Self {
        Self::filled(shape, 0.0)
    }

    pub fn filled(shape: &Shape, value: f64) -> Self {
        Self { shape: shape.clone(), values: vec![value; shape.iter().product()] }
    }

    pub fn from_vec(shape: Shape, values: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(CouplingError::Configuration(format!(
                "{} values cannot fill shape {:?}",
                values.len(),
                shape.as_slice()
            )));
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &Shape { &self.shape }
    pub fn values(&self) -> &[f64] { &self.values }
    pub fn values_mut(&mut self) -> &mut [f64] { &mut self.values }
    pub fn into_values(self) -> Vec<f64> { self.values }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn fill(&mut self, value: f64) {
        self.values.fill(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_from_vec_checks_cell_count() {
        let shape: Shape = smallvec![2, 3];
        assert!(Field::from_vec(shape.clone(), vec![0.0; 6]).is_ok());
        assert!(matches!(
            Field::from_vec(shape, vec![0.0; 5]),
            Err(CouplingError::Configuration(_))
        ));
    }

    #[test]
    fn test_deserialise_checks_cell_count() {
        let field: Field = serde_json::from_str(r#"{"shape": [2, 3], "values": [0, 1, 2, 3, 4, 5]}"#).unwrap();
        assert_eq!(field.len(), 6);
        let res = serde_json::from_str::<Field>(r#"{"shape": [2, 3], "values": [1.0]}"#);
        assert!(res.unwrap_err().to_string().contains("cannot fill shape"));
    }
}
