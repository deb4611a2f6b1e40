//! Time and space domains shared by every component of a model.
pub mod calendar;
pub mod space;
pub mod time;

pub use calendar::{Calendar, DateTime};
pub use space::{Axis, CellLocation, GridExtent, GridKind, RotatedPole, SpaceDomain};
pub use time::{TimeDomain, TimeUnit, TimeUnits};
