//! Routing of outwards to the inwards that consume them.
pub mod exchanger;
pub mod plan;

pub use exchanger::Exchanger;
pub use plan::{ExchangePlan, Timing, Transfer};
