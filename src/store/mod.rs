//! Storage for gridded fields, transfer slots and component state.
pub mod registry;
pub mod state;
pub mod types;

pub use registry::SlotRegistry;
pub use state::{StateHistory, StateStore};
pub use types::{Field, Shape, SlotId};
