//! The central validator that checks a set of components can be coupled.
use super::error::ValidationError;
use super::rules::{space, time};
use crate::component::Component;
use crate::exchange::ExchangePlan;

/// Runs every rule over the three components and collects all failures
/// before reporting, so a misconfigured model shows everything wrong with it at once.
pub struct Validator<'a> {
    components: &'a [Component; 3],
}

impl<'a> Validator<'a> {
    pub fn new(components: &'a [Component; 3]) -> Self {
        Self { components }
    }

    /// # Returns
    /// - `Ok(plan)` with the resolved exchange bindings if nothing is wrong.
    /// - `Err(errors)` with every error discovered, domain mismatches first.
    pub fn validate(&self) -> Result<ExchangePlan, Vec<ValidationError>> {
        let mut errors = Vec::new();

        for i in 0..self.components.len() {
            for j in i + 1..self.components.len() {
                let (a, b) = (&self.components[i], &self.components[j]);
                errors.extend(time::validate_time(a, b));
                errors.extend(space::validate_space(a, b));
            }
        }

        match ExchangePlan::build(self.components) {
            Ok(plan) if errors.is_empty() => Ok(plan),
            Ok(_) => Err(errors),
            Err(contract) => {
                errors.extend(contract);
                Err(errors)
            }
        }
    }
}
