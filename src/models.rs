use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Lowest score a metric can carry
pub const MIN_SCORE: f64 = 0.0;
/// Highest score a metric can carry
pub const MAX_SCORE: f64 = 10.0;

/// Request body for a single evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// The full source text
    pub transcript: String,
    /// The summary to judge
    pub summary: String,
    /// Parameter names, in the order results should be reported
    #[serde(default = "default_evaluation_parameters")]
    pub evaluation_parameters: Vec<String>,
}

pub fn default_evaluation_parameters() -> Vec<String> {
    ["coverage", "clarity", "conciseness", "accuracy"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Score and explanation for one evaluated parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub score: f64,
    pub explanation: String,
}

impl MetricResult {
    /// Build a result, rejecting scores outside of [0, 10]
    pub fn new(score: f64, explanation: impl Into<String>) -> Result<Self, EvalError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(EvalError::ScoreOutOfRange(score));
        }
        Ok(Self {
            score,
            explanation: explanation.into(),
        })
    }
}

/// Final response returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// Weighted score across all evaluated parameters
    pub final_score: f64,
    /// Synthesized explanation built from each metric
    pub explanation: String,
    /// Per-parameter results, in request order
    pub metric_details: IndexMap<String, MetricResult>,
}
