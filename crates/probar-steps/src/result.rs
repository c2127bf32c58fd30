//! Result and error types for step execution.

use thiserror::Error;

/// Result type for step operations
pub type StepResult<T> = Result<T, StepError>;

/// How a failed step should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An expected text/value/state condition did not hold
    Assertion,
    /// An expected element or option could not be located, immediately or
    /// within a bounded wait
    Lookup,
    /// The browser session, the registry, or the configuration failed
    Infrastructure,
}

/// Errors that can occur while executing steps
#[derive(Debug, Error)]
pub enum StepError {
    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Element could not be found without waiting
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator that matched nothing
        locator: String,
    },

    /// Dropdown has no option with the requested visible text
    #[error("No option with visible text {text:?} in {locator}")]
    OptionNotFound {
        /// Locator of the select element
        locator: String,
        /// Visible text that was requested
        text: String,
    },

    /// Bounded wait expired
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the condition
        waited_for: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Driver/transport error
    #[error("Driver error: {message}")]
    DriverError {
        /// Error message
        message: String,
    },

    /// No registered pattern matches the step text
    #[error("Undefined step: {kind} {text}")]
    UndefinedStep {
        /// Step keyword
        kind: String,
        /// Step text
        text: String,
    },

    /// Pattern could not be compiled or duplicates an existing one
    #[error("Invalid step pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// Pattern template
        pattern: String,
        /// Error message
        message: String,
    },

    /// Handler asked for an argument the pattern did not capture
    #[error("Step argument {index} missing")]
    MissingArgument {
        /// Positional index
        index: usize,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl StepError {
    /// Shorthand for an assertion failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Shorthand for a driver failure
    pub fn driver(message: impl ToString) -> Self {
        Self::DriverError {
            message: message.to_string(),
        }
    }

    /// Classify the error for the scenario runner
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::AssertionFailed { .. } => FailureKind::Assertion,
            Self::ElementNotFound { .. } | Self::OptionNotFound { .. } | Self::Timeout { .. } => {
                FailureKind::Lookup
            }
            _ => FailureKind::Infrastructure,
        }
    }

    /// Element lookups that may still succeed on a later poll
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_kind() {
        let err = StepError::assertion("title mismatch");
        assert_eq!(err.kind(), FailureKind::Assertion);
        assert_eq!(err.to_string(), "Assertion failed: title mismatch");
    }

    #[test]
    fn test_lookup_kinds() {
        let not_found = StepError::ElementNotFound {
            locator: "#product_name".into(),
        };
        let option = StepError::OptionNotFound {
            locator: "#product_category".into(),
            text: "TOOLS".into(),
        };
        let timeout = StepError::Timeout {
            ms: 100,
            waited_for: "#flash_message".into(),
        };
        assert_eq!(not_found.kind(), FailureKind::Lookup);
        assert_eq!(option.kind(), FailureKind::Lookup);
        assert_eq!(timeout.kind(), FailureKind::Lookup);
        assert!(not_found.is_not_found());
        assert!(!timeout.is_not_found());
    }

    #[test]
    fn test_infrastructure_kind() {
        let err = StepError::driver("socket closed");
        assert_eq!(err.kind(), FailureKind::Infrastructure);
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn test_timeout_message() {
        let err = StepError::Timeout {
            ms: 2500,
            waited_for: "text of #search_results to contain \"Fido\"".into(),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 2500ms waiting for text of #search_results to contain \"Fido\""
        );
    }
}
