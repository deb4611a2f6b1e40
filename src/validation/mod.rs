//! Pre-run checks on a model's components.
pub mod error;
mod rules;
pub mod validator;

pub use error::{ValidationError, ValidationErrorType};
pub use validator::Validator;
