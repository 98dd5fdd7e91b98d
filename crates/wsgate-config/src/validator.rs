//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, DEFAULT_INTERVAL_MS};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error, if any, into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_session(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if !config.server.ws_path.starts_with('/') {
            result.add_error(ValidationError::new(
                "server.ws_path",
                "ws_path must start with '/'",
            ));
        }
    }

    fn validate_session(config: &Config, result: &mut ValidationResult) {
        let Some(read) = config.session.read_timeout_ms.filter(|ms| *ms > 0) else {
            return;
        };
        let ping = nonzero_or_default(config.session.ping_interval_ms);
        let write = nonzero_or_default(config.session.write_timeout_ms);
        let window = write.saturating_mul(2).saturating_add(ping);

        if read <= ping {
            result.add_warning(ValidationWarning::new(
                "session.read_timeout_ms",
                format!(
                    "read_timeout_ms ({read}) does not exceed ping_interval_ms ({ping}); \
                     idle peers may be dropped before a ping is answered"
                ),
            ));
        } else if read < window {
            result.add_warning(ValidationWarning::new(
                "session.read_timeout_ms",
                format!(
                    "read_timeout_ms ({read}) is below ping_interval_ms + 2 * write_timeout_ms ({window})"
                ),
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.level.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "Log level cannot be empty",
            ));
        }
    }
}

fn nonzero_or_default(value: Option<u64>) -> u64 {
    value.filter(|ms| *ms > 0).unwrap_or(DEFAULT_INTERVAL_MS)
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
