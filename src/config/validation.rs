//! Configuration validation.

use std::fmt;

use crate::config::schema::ServiceConfig;

/// One semantic problem found in a [`ServiceConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Checks a config, collecting every error.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError {
            field: "name",
            message: "must not be empty".to_string(),
        });
    }
    if config.env.trim().is_empty() {
        errors.push(ValidationError {
            field: "env",
            message: "must not be empty".to_string(),
        });
    }
    if config.shutdown_timeout_secs == Some(0) {
        errors.push(ValidationError {
            field: "shutdown_timeout_secs",
            message: "must be greater than zero (omit it to wait indefinitely)".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn reports_all_errors() {
        let config = ServiceConfig {
            name: " ".into(),
            env: String::new(),
            shutdown_timeout_secs: Some(0),
            ..ServiceConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "env", "shutdown_timeout_secs"]);
    }
}
