// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for gpusched operations
#[derive(Error, Debug, Diagnostic)]
pub enum GpuschedError {
    /// Quantity string could not be parsed
    #[error("Invalid quantity '{value}': {reason}")]
    #[diagnostic(
        code(gpusched::invalid_quantity),
        help("Use a Kubernetes quantity such as '8', '16Gi', '1500m' or '2e3'")
    )]
    InvalidQuantity {
        #[allow(unused)]
        value: String,
        #[allow(unused)]
        reason: String,
    },

    /// Invalid resource
    #[error("Invalid resource: {reason}")]
    #[diagnostic(code(gpusched::invalid_resource), help("{suggestion}"))]
    InvalidResource {
        #[allow(unused)]
        reason: String,
        #[allow(unused)]
        suggestion: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(gpusched::serialization_error),
        help("Ensure the document is valid YAML and matches the expected fields")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for gpusched core operations
pub type Result<T> = std::result::Result<T, GpuschedError>;

impl GpuschedError {
    /// Create an InvalidQuantity error
    pub fn invalid_quantity(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidResource error
    pub fn invalid_resource(reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidResource {
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }
}
