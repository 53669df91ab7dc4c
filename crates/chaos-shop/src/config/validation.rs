//! Semantic checks that serde cannot express.
//!
//! Validation never stops at the first problem: a config with three mistakes reports three
//! [`ValidationError`]s.

use super::schema::{LoadConfig, ShopConfig};
use crate::fault::{DelayRange, OperationKind, ScenarioSet};
use std::fmt::Display;

/// One problem, located by its dotted path in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ShopConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.catalog.actor_buffer == 0 {
        errors.push(ValidationError::new("catalog.actor_buffer", "must be at least 1"));
    }
    for (i, product) in config.catalog.products.iter().enumerate() {
        if product.name.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("catalog.products[{i}].name"),
                "must not be empty",
            ));
        }
    }

    for kind in OperationKind::ALL {
        if let Some(scenarios) = config.scenarios.get(kind) {
            let field = format!("scenarios.{}", kind.as_str().replace('-', "_"));
            errors.extend(
                ScenarioSet::check(scenarios)
                    .into_iter()
                    .map(|problem| ValidationError::new(field.clone(), problem.to_string())),
            );
        }
    }

    validate_load(&config.load, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_load(load: &LoadConfig, errors: &mut Vec<ValidationError>) {
    if load.virtual_users == 0 {
        errors.push(ValidationError::new("load.virtual_users", "must be at least 1"));
    }
    if load.iterations == 0 {
        errors.push(ValidationError::new("load.iterations", "must be at least 1"));
    }
    if load.max_quantity == 0 {
        errors.push(ValidationError::new("load.max_quantity", "must be at least 1"));
    }
    for (field, value) in [
        ("load.order_probability", load.order_probability),
        ("load.chaos_probability", load.chaos_probability),
        ("load.max_error_rate", load.max_error_rate),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::new(
                field,
                format!("{value} is outside [0, 1]"),
            ));
        }
    }
    for (field, range) in [
        ("load.think_time", load.think_time),
        ("load.iteration_pause", load.iteration_pause),
    ] {
        check_range(field, range, errors);
    }
}

fn check_range(field: &str, range: DelayRange, errors: &mut Vec<ValidationError>) {
    if !range.is_valid() {
        errors.push(ValidationError::new(
            field,
            format!("min_ms {} exceeds max_ms {}", range.min_ms, range.max_ms),
        ));
    }
}
