use super::types::SlotId;
use crate::component::Category;
use crate::error::{CouplingError, Result};
use std::collections::HashMap;

/// Columnar table of every transfer slot: one per outward field, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    pub names: Vec<String>,
    pub units: Vec<String>,
    pub producers: Vec<Category>,

    lookup: HashMap<String, SlotId>,
}

impl SlotRegistry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.names.len() }

    /// Registers `name` as an outward of `producer`. A field may have only one producer.
    pub fn register(&mut self, name: &str, units: &str, producer: Category) -> Result<SlotId> {
        if let Some(&existing) = self.lookup.get(name) {
            return Err(CouplingError::ExchangeContract {
                component: producer,
                field: name.to_string(),
                reason: format!("already produced by the {} component", self.producers[existing.index()]),
            });
        }
        let id = SlotId::new(self.names.len());
        self.names.push(name.to_string());
        self.units.push(units.to_string());
        self.producers.push(producer);
        self.lookup.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<SlotId> {
        self.lookup.get(name).copied()
    }

    #[inline(always)]
    pub fn name(&self, id: SlotId) -> &str {
        &self.names[id.index()]
    }

    #[inline(always)]
    pub fn producer(&self, id: SlotId) -> Category {
        self.producers[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_producer_is_rejected() {
        let mut reg = SlotRegistry::new();
        let id = reg.register("runoff", "kg m-2 s-1", Category::SubSurface).unwrap();
        assert_eq!(reg.lookup("runoff"), Some(id));
        let err = reg.register("runoff", "kg m-2 s-1", Category::OpenWater).unwrap_err();
        assert!(matches!(
            err,
            CouplingError::ExchangeContract { component: Category::OpenWater, ref field, .. } if field == "runoff"
        ));
        assert_eq!(reg.count(), 1);
    }
}
