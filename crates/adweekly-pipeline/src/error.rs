use thiserror::Error;

/// Failure taxonomy for the pipeline. Only [`PipelineError::Api`] is
/// retryable; configuration failures abort the run immediately because
/// retrying cannot change their outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or invalid credentials/identifiers. Fatal, no retry.
    #[error("configuration error: {0}")]
    Config(String),

    /// Non-2xx response or network failure from an external service.
    /// Retried up to the configured limit, then fatal.
    #[error("{service} api error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn api(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Api {
            service,
            message: err.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_api_errors_are_retryable() {
        assert!(PipelineError::api("ads", "503").is_retryable());
        assert!(!PipelineError::Config("missing token".into()).is_retryable());
        assert!(!PipelineError::Internal(anyhow::anyhow!("boom")).is_retryable());
    }
}
