//! Validation rule for space domain agreement.

use crate::component::Component;
use crate::error::Dimension;
use crate::validation::error::ValidationError;

/// Components must share their horizontal grid. A vertical axis may be held
/// by some components and not others.
pub(crate) fn validate_space(first: &Component, second: &Component) -> Option<ValidationError> {
    first
        .spacedomain()
        .difference_from(second.spacedomain(), true)
        .map(|reason| ValidationError::mismatch(Dimension::Space, first.category(), second.category(), reason))
}
