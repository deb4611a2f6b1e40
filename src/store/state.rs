//! Component state with a rolling history of past values.

use super::types::{Field, Shape};
use crate::error::{CouplingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Slot 0 is the value being computed this step; slot `k` is `k` steps back.
/// There is always at least one slot, and every slot has the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHistory")]
pub struct StateHistory {
    slots: VecDeque<Field>,
}

#[derive(Deserialize)]
struct RawHistory {
    slots: VecDeque<Field>,
}

impl TryFrom<RawHistory> for StateHistory {
    type Error = CouplingError;

    fn try_from(raw: RawHistory) -> Result<Self> {
        let Some(first) = raw.slots.front() else {
            return Err(CouplingError::Dump("a state history needs at least one slot".into()));
        };
        if let Some((k, slot)) = raw.slots.iter().enumerate().find(|(_, f)| f.shape() != first.shape()) {
            return Err(CouplingError::Dump(format!(
                "history slot {} has shape {:?}, slot 0 has {:?}",
                k,
                slot.shape().as_slice(),
                first.shape().as_slice()
            )));
        }
        Ok(Self { slots: raw.slots })
    }
}

impl StateHistory {
    /// `depth` lagged slots plus the current one, all zero.
    pub fn zeros(shape: &Shape, depth: usize) -> Self {
        Self { slots: (0..=depth).map(|_| Field::zeros(shape)).collect() }
    }

    pub fn depth(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    pub fn shape(&self) -> &Shape {
        self.slots[0].shape()
    }

    pub fn lag(&self, k: usize) -> Option<&Field> {
        self.slots.get(k)
    }

    pub fn lag_mut(&mut self, k: usize) -> Option<&mut Field> {
        self.slots.get_mut(k)
    }

    pub fn current(&self) -> &Field {
        &self.slots[0]
    }

    pub fn current_mut(&mut self) -> &mut Field {
        &mut self.slots[0]
    }

    /// The value at the end of the previous step.
    pub fn previous(&self) -> &Field {
        &self.slots[1]
    }

    pub fn previous_mut(&mut self) -> &mut Field {
        &mut self.slots[1]
    }

    /// Shifts every slot one step back. The oldest slot is recycled as the new,
    /// zeroed, current slot.
    pub fn rotate(&mut self) {
        if let Some(mut oldest) = self.slots.pop_back() {
            oldest.fill(0.0);
            self.slots.push_front(oldest);
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = &Field> {
        self.slots.iter()
    }
}

/// All state histories of one component, by state name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateStore {
    histories: BTreeMap<String, StateHistory>,
}

impl StateStore {
    pub fn zeros<'a>(names: impl IntoIterator<Item = &'a str>, shape: &Shape, depth: usize) -> Self {
        Self {
            histories: names
                .into_iter()
                .map(|n| (n.to_string(), StateHistory::zeros(shape, depth)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&StateHistory> {
        self.histories
            .get(name)
            .ok_or_else(|| CouplingError::Configuration(format!("no state named '{}'", name)))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut StateHistory> {
        self.histories
            .get_mut(name)
            .ok_or_else(|| CouplingError::Configuration(format!("no state named '{}'", name)))
    }

    pub fn rotate(&mut self) {
        self.histories.values_mut().for_each(StateHistory::rotate);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.histories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateHistory)> {
        self.histories.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

impl From<BTreeMap<String, StateHistory>> for StateStore {
    fn from(histories: BTreeMap<String, StateHistory>) -> Self {
        Self { histories }
    }
}

impl From<StateStore> for BTreeMap<String, StateHistory> {
    fn from(store: StateStore) -> Self {
        store.histories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_rotate_shifts_and_zeroes_current() {
        let shape: Shape = smallvec![1, 2];
        let mut history = StateHistory::zeros(&shape, 2);
        history.current_mut().fill(3.0);
        history.rotate();
        history.current_mut().fill(5.0);
        history.rotate();

        assert_eq!(history.current().values(), &[0.0, 0.0]);
        assert_eq!(history.previous().values(), &[5.0, 5.0]);
        assert_eq!(history.lag(2).unwrap().values(), &[3.0, 3.0]);
        assert_eq!(history.depth(), 2);
    }

    #[test]
    fn test_deserialise_rejects_empty_or_ragged_history() {
        let history: StateHistory = serde_json::from_str(
            r#"{"slots": [{"shape": [1, 2], "values": [0, 0]}, {"shape": [1, 2], "values": [1, 2]}]}"#,
        )
        .unwrap();
        assert_eq!(history.depth(), 1);
        assert_eq!(history.previous().values(), &[1.0, 2.0]);

        let empty = serde_json::from_str::<StateHistory>(r#"{"slots": []}"#);
        assert!(empty.unwrap_err().to_string().contains("at least one slot"));

        let ragged = serde_json::from_str::<StateHistory>(
            r#"{"slots": [{"shape": [1, 2], "values": [0, 0]}, {"shape": [1], "values": [1]}]}"#,
        );
        assert!(ragged.unwrap_err().to_string().contains("history slot 1"));
    }

    #[test]
    fn test_unknown_state_is_an_error() {
        let store = StateStore::zeros(["snowpack"], &smallvec![1], 1);
        assert!(store.get("snowpack").is_ok());
        assert!(store.get("canopy").is_err());
    }
}
