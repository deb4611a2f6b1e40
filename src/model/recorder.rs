//! Observation of component outwards as a run progresses.

use crate::component::{Category, FieldInfo};
use crate::domain::DateTime;
use crate::error::Result;
use crate::store::Field;
use std::collections::BTreeMap;

/// One component's outwards right after it stepped.
pub struct StepRecord<'a> {
    pub category: Category,
    /// Index into the model's time domain.
    pub index: usize,
    pub datetime: DateTime,
    pub(crate) names: &'a [FieldInfo],
    pub(crate) values: &'a [Field],
}

impl<'a> StepRecord<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Field> {
        self.names.iter().position(|f| f.name == name).map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'a Field)> + '_ {
        self.names.iter().map(|f| f.name).zip(self.values.iter())
    }
}

/// Called after every component step. An error aborts the run.
pub trait StepObserver {
    fn observe(&mut self, record: &StepRecord<'_>) -> Result<()>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StepObserver for NullObserver {
    fn observe(&mut self, _record: &StepRecord<'_>) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStep {
    pub category: Category,
    pub index: usize,
    pub datetime: DateTime,
    pub outwards: BTreeMap<String, Field>,
}

/// Keeps a copy of every record.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecorder {
    pub records: Vec<RecordedStep>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(&self, category: Category) -> impl Iterator<Item = &RecordedStep> {
        self.records.iter().filter(move |r| r.category == category)
    }

    /// The series of one outward across steps.
    pub fn series(&self, category: Category, name: &str) -> Vec<&Field> {
        self.of(category).filter_map(|r| r.outwards.get(name)).collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl StepObserver for MemoryRecorder {
    fn observe(&mut self, record: &StepRecord<'_>) -> Result<()> {
        self.records.push(RecordedStep {
            category: record.category,
            index: record.index,
            datetime: record.datetime,
            outwards: record.iter().map(|(n, f)| (n.to_string(), f.clone())).collect(),
        });
        Ok(())
    }
}
