//! Field validation errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field that failed its declared constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Offending field name
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ValidationError::new("height", "must be greater than 0");
        assert_eq!(err.to_string(), "height: must be greater than 0");
    }
}
