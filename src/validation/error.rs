//! Defines the error types for the validation module.
use crate::component::Category;
use crate::error::{CouplingError, Dimension};

/// The specific category of a validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorType {
    /// Two components disagree on their time domain.
    TimeMismatch,
    /// Two components disagree on their space domain.
    SpaceMismatch,
    /// A field is consumed without a producer, produced twice, or with conflicting units.
    ExchangeContract,
}

/// A structured error report from model validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The component where the error was detected.
    pub component: Category,
    /// The component it was compared against, for domain mismatches.
    pub other: Option<Category>,
    /// The field involved, for exchange contract errors.
    pub field: Option<String>,
    pub error_type: ValidationErrorType,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn mismatch(dimension: Dimension, first: Category, second: Category, message: String) -> Self {
        let error_type = match dimension {
            Dimension::Time => ValidationErrorType::TimeMismatch,
            Dimension::Space => ValidationErrorType::SpaceMismatch,
        };
        Self { component: first, other: Some(second), field: None, error_type, message }
    }

    pub(crate) fn exchange(component: Category, field: &str, message: String) -> Self {
        Self {
            component,
            other: None,
            field: Some(field.to_string()),
            error_type: ValidationErrorType::ExchangeContract,
            message,
        }
    }
}

impl From<ValidationError> for CouplingError {
    fn from(err: ValidationError) -> Self {
        match err.error_type {
            ValidationErrorType::TimeMismatch | ValidationErrorType::SpaceMismatch => {
                CouplingError::DomainMismatch {
                    first: err.component,
                    second: err.other.unwrap_or(err.component),
                    dimension: if err.error_type == ValidationErrorType::TimeMismatch {
                        Dimension::Time
                    } else {
                        Dimension::Space
                    },
                    reason: err.message,
                }
            }
            ValidationErrorType::ExchangeContract => CouplingError::ExchangeContract {
                component: err.component,
                field: err.field.unwrap_or_default(),
                reason: err.message,
            },
        }
    }
}
