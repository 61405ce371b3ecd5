use std::fmt;

/// Result type for Metis operations
pub type Result<T> = std::result::Result<T, MetisError>;

/// Main error type for the Metis library
#[derive(Debug, Clone)]
pub enum MetisError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Empty buffer or container
    EmptyBuffer(String),

    /// Serialization/deserialization errors
    SerializationError(String),
}

impl fmt::Display for MetisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetisError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            MetisError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            MetisError::EmptyBuffer(msg) => write!(f, "Empty buffer: {}", msg),
            MetisError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for MetisError {}

// Conversion from serde_json::Error
impl From<serde_json::Error> for MetisError {
    fn from(err: serde_json::Error) -> Self {
        MetisError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl MetisError {
    pub fn dimension_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        MetisError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        MetisError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
