use crate::core::atmosphere::AtmosphereLoadError;
use crate::core::models::error::ConfigError;
use rand::distributions::WeightedError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum SamplingError {
    #[error("Standard deviation must be finite and non-negative, got {0}")]
    InvalidSigma(f64),

    #[error("Expected {expected} weights, got {found}")]
    WeightCountMismatch { expected: usize, found: usize },

    #[error("Invalid sampling weights: {0}")]
    Distribution(#[from] WeightedError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Batch size must be at least 1")]
    EmptyBatch,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Random sampling failed: {0}")]
    Sampling(#[from] SamplingError),

    #[error("Invalid atmosphere: {0}")]
    Atmosphere(#[from] AtmosphereLoadError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_engine_errors() {
        let err: EngineError = ConfigError::MissingParameter("profile").into();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("profile"));
    }

    #[test]
    fn weighted_errors_convert_into_sampling_errors() {
        let err: SamplingError = WeightedError::AllWeightsZero.into();
        assert_eq!(err, SamplingError::Distribution(WeightedError::AllWeightsZero));
        let err: EngineError = err.into();
        assert!(matches!(err, EngineError::Sampling(_)));
    }
}
