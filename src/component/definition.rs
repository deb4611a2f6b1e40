//! Static descriptions of component categories and processes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three compartments of a model, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    SurfaceLayer,
    SubSurface,
    OpenWater,
}

impl Category {
    /// Fixed per-step execution order.
    pub const ORDER: [Category; 3] = [Category::SurfaceLayer, Category::SubSurface, Category::OpenWater];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SurfaceLayer => "surfacelayer",
            Category::SubSurface => "subsurface",
            Category::OpenWater => "openwater",
        }
    }

    /// Position in [`Category::ORDER`].
    pub fn position(&self) -> usize {
        match self {
            Category::SurfaceLayer => 0,
            Category::SubSurface => 1,
            Category::OpenWater => 2,
        }
    }

    /// Fields every component of this category consumes.
    pub fn inwards(&self) -> &'static [FieldInfo] {
        match self {
            Category::SurfaceLayer => SURFACELAYER_INWARDS,
            Category::SubSurface => SUBSURFACE_INWARDS,
            Category::OpenWater => OPENWATER_INWARDS,
        }
    }

    /// Fields every component of this category produces.
    pub fn outwards(&self) -> &'static [FieldInfo] {
        match self {
            Category::SurfaceLayer => SURFACELAYER_OUTWARDS,
            Category::SubSurface => SUBSURFACE_OUTWARDS,
            Category::OpenWater => OPENWATER_OUTWARDS,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named quantity with CF units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub name: &'static str,
    pub units: &'static str,
}

impl FieldInfo {
    pub const fn new(name: &'static str, units: &'static str) -> Self {
        Self { name, units }
    }
}

/// A scalar constant, optionally with a default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantInfo {
    pub name: &'static str,
    pub units: &'static str,
    pub default: Option<f64>,
}

impl ConstantInfo {
    pub const fn new(name: &'static str, units: &'static str, default: Option<f64>) -> Self {
        Self { name, units, default }
    }
}

const FLUX: &str = "kg m-2 s-1";

const SURFACELAYER_INWARDS: &[FieldInfo] = &[FieldInfo::new("soil_water_stress", "1")];
const SURFACELAYER_OUTWARDS: &[FieldInfo] = &[
    FieldInfo::new("throughfall", FLUX),
    FieldInfo::new("snowmelt", FLUX),
    FieldInfo::new("transpiration", FLUX),
    FieldInfo::new("evaporation_soil_surface", FLUX),
    FieldInfo::new("evaporation_ponded_water", FLUX),
    FieldInfo::new("evaporation_openwater", FLUX),
];

const SUBSURFACE_INWARDS: &[FieldInfo] = &[
    FieldInfo::new("throughfall", FLUX),
    FieldInfo::new("snowmelt", FLUX),
    FieldInfo::new("transpiration", FLUX),
    FieldInfo::new("evaporation_soil_surface", FLUX),
    FieldInfo::new("evaporation_ponded_water", FLUX),
];
const SUBSURFACE_OUTWARDS: &[FieldInfo] = &[
    FieldInfo::new("runoff", FLUX),
    FieldInfo::new("soil_water_stress", "1"),
];

const OPENWATER_INWARDS: &[FieldInfo] = &[
    FieldInfo::new("evaporation_openwater", FLUX),
    FieldInfo::new("runoff", FLUX),
];
const OPENWATER_OUTWARDS: &[FieldInfo] = &[FieldInfo::new("discharge", FLUX)];

/// Everything a process declares about itself.
///
/// `inwards` and `outwards` normally repeat the category interface, but a
/// process may declare extra inwards; the model then needs some other
/// component to produce them.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDefinition {
    pub category: Category,
    pub name: &'static str,
    pub inwards: &'static [FieldInfo],
    pub outwards: &'static [FieldInfo],
    pub driving_data: &'static [FieldInfo],
    pub ancillary_data: &'static [FieldInfo],
    pub parameters: &'static [FieldInfo],
    pub constants: &'static [ConstantInfo],
    pub states: &'static [FieldInfo],
    /// Number of past steps kept for each state (at least one).
    pub solver_history: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_inward_has_a_producer_in_some_category() {
        for cat in Category::ORDER {
            for inward in cat.inwards() {
                let producers: Vec<_> = Category::ORDER
                    .iter()
                    .filter(|c| c.outwards().iter().any(|o| o.name == inward.name))
                    .collect();
                assert_eq!(producers.len(), 1, "{} of {}", inward.name, cat);
            }
        }
    }

    #[test]
    fn test_order_positions() {
        for (i, cat) in Category::ORDER.iter().enumerate() {
            assert_eq!(cat.position(), i);
        }
    }
}
