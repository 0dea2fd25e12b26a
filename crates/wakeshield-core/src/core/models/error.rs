use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Unknown shield profile '{value}'. Valid profiles are: {valid}")]
    UnknownProfile { value: String, valid: String },

    #[error("Unknown coating type '{value}'. Valid coatings are: {valid}")]
    UnknownCoating { value: String, valid: String },

    #[error("Unknown wake volume type '{value}'. Valid wake types are: {valid}")]
    UnknownWake { value: String, valid: String },

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Rejects non-finite or non-positive values for a named dimension.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(
            name,
            format!("expected a positive finite number, got {}", value),
        ))
    }
}
