//! CLI-specific error types

use std::fmt;
use std::io;

use crate::dto::{DtoError, ValidationReasons};

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Input is not the JSON shape the command expects
    InvalidInput,
    /// Failure raised by the object layer, with its own code
    Dto(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SIMPLEDTO_CLI_CONFIG_ERROR",
            Self::IoError => "SIMPLEDTO_CLI_IO_ERROR",
            Self::InvalidInput => "SIMPLEDTO_CLI_INVALID_INPUT",
            Self::Dto(code) => *code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    reasons: Option<ValidationReasons>,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            reasons: None,
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field reasons of a validation failure
    pub fn reasons(&self) -> Option<&ValidationReasons> {
        self.reasons.as_ref()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<DtoError> for CliError {
    fn from(e: DtoError) -> Self {
        Self {
            code: CliErrorCode::Dto(e.code()),
            message: e.to_string(),
            reasons: e.reasons().cloned(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_input(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dto_errors_keep_code_and_reasons() {
        let reasons: ValidationReasons = [("age", "age is not a valid float")].into_iter().collect();
        let err = CliError::from(DtoError::invalid(reasons));

        assert_eq!(err.code_str(), "DTO_INVALID_DATA");
        assert_eq!(err.message(), "There was 1 validation error.");
        assert_eq!(err.reasons().unwrap().get("age"), Some("age is not a valid float"));
    }

    #[test]
    fn test_display() {
        let err = CliError::config_error("bad mode");
        assert_eq!(err.to_string(), "SIMPLEDTO_CLI_CONFIG_ERROR: bad mode");
        assert!(err.reasons().is_none());
    }
}
