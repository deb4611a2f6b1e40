//! Validation rule for time domain agreement.

use crate::component::Component;
use crate::error::Dimension;
use crate::validation::error::ValidationError;

/// Components must step through the same instants under the same calendar.
pub(crate) fn validate_time(first: &Component, second: &Component) -> Option<ValidationError> {
    let (a, b) = (first.timedomain(), second.timedomain());
    if a.is_time_equal_to(b) {
        return None;
    }
    let reason = if a.calendar() != b.calendar() {
        format!("calendars differ ('{}' vs '{}')", a.calendar(), b.calendar())
    } else if a.len() != b.len() {
        format!("lengths differ ({} vs {} timestamps)", a.len(), b.len())
    } else if a.step_seconds() != b.step_seconds() {
        format!("steps differ ({}s vs {}s)", a.step_seconds(), b.step_seconds())
    } else {
        format!("timestamps differ (first at {} vs {})", a.first(), b.first())
    };
    Some(ValidationError::mismatch(Dimension::Time, first.category(), second.category(), reason))
}
