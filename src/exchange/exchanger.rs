use crate::store::{Field, Shape, SlotId, SlotRegistry};

/// Latest value of every transfer slot.
///
/// Slots start at zero, which is what a lagged consumer reads at step 0.
#[derive(Debug, Clone, Default)]
pub struct Exchanger {
    values: Vec<Field>,
}

impl Exchanger {
    pub fn new(registry: &SlotRegistry, shape: &Shape) -> Self {
        Self { values: (0..registry.count()).map(|_| Field::zeros(shape)).collect() }
    }

    #[inline(always)]
    pub fn get(&self, slot: SlotId) -> &Field {
        &self.values[slot.index()]
    }

    pub fn gather(&self, slots: &[SlotId]) -> Vec<&Field> {
        slots.iter().map(|&s| self.get(s)).collect()
    }

    /// Overwrites `slots` with `fields`, pairwise.
    pub fn store(&mut self, slots: &[SlotId], fields: Vec<Field>) {
        for (&slot, field) in slots.iter().zip(fields) {
            self.values[slot.index()] = field;
        }
    }

    pub fn set(&mut self, slot: SlotId, field: Field) {
        self.values[slot.index()] = field;
    }

    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|f| f.fill(0.0));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Category;
    use smallvec::smallvec;

    #[test]
    fn test_store_and_reset() {
        let mut reg = SlotRegistry::new();
        let a = reg.register("runoff", "kg m-2 s-1", Category::SubSurface).unwrap();
        let b = reg.register("discharge", "kg m-2 s-1", Category::OpenWater).unwrap();
        let shape: Shape = smallvec![2];
        let mut ex = Exchanger::new(&reg, &shape);
        assert_eq!(ex.get(a).values(), &[0.0, 0.0]);

        ex.store(&[b, a], vec![Field::filled(&shape, 2.0), Field::filled(&shape, 1.0)]);
        assert_eq!(ex.gather(&[a, b])[1].values(), &[2.0, 2.0]);
        ex.reset();
        assert_eq!(ex.get(b).values(), &[0.0, 0.0]);
    }
}
