use thiserror::Error;

/// Errors produced while evaluating a summary
#[derive(Error, Debug)]
pub enum EvalError {
    /// Transcript or summary failed validation
    #[error("{0}")]
    InvalidInput(String),

    /// None of the requested parameters are known to the configuration
    #[error("No valid evaluation parameters were processed.")]
    NoValidParameters,

    /// Network, timeout or API failure from the LLM provider
    #[error("LLM provider error: {0}")]
    Provider(String),

    /// The LLM answered with something other than the expected JSON object
    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    /// The LLM returned a score outside of [0, 10]
    #[error("Score {0} is outside the range 0 to 10")]
    ScoreOutOfRange(f64),

    /// A single parameter could not be evaluated after all retries
    #[error("An error occurred while evaluating '{parameter}'.")]
    EvaluationFailure {
        parameter: String,
        #[source]
        source: Box<EvalError>,
    },
}

impl EvalError {
    /// Whether the failed remote step is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EvalError::Provider(_) | EvalError::MalformedResponse(_) | EvalError::ScoreOutOfRange(_)
        )
    }
}

impl From<async_openai::error::OpenAIError> for EvalError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        EvalError::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(EvalError::Provider("timeout".to_string()).is_retryable());
        assert!(EvalError::MalformedResponse("empty".to_string()).is_retryable());
        assert!(EvalError::ScoreOutOfRange(11.0).is_retryable());
        assert!(!EvalError::InvalidInput("Transcript cannot be empty.".to_string()).is_retryable());
        assert!(!EvalError::NoValidParameters.is_retryable());
    }

    #[test]
    fn test_evaluation_failure_names_parameter() {
        let err = EvalError::EvaluationFailure {
            parameter: "coverage".to_string(),
            source: Box::new(EvalError::Provider("LLM API is down".to_string())),
        };
        assert_eq!(err.to_string(), "An error occurred while evaluating 'coverage'.");
        assert!(!err.to_string().contains("LLM API is down"));
    }
}
