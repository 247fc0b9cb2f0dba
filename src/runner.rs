use crate::config::Config;
use crate::error::EvalError;
use crate::evaluation::{Judge, ParameterEvaluator};
use crate::models::{EvaluationOutcome, EvaluationRequest, MetricResult};
use crate::scoring::{aggregate_scores, synthesize_explanation};
use crate::validation::validate_input;
use futures::future::try_join_all;
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What happened to one requested parameter
#[derive(Debug)]
pub enum ParameterOutcome {
    /// Not present in the configuration
    Skipped,
    Evaluated(MetricResult),
    /// Evaluation failed after all retries
    Failed(EvalError),
}

impl ParameterOutcome {
    /// Lift into a result, naming the parameter on failure
    fn into_result(self, name: &str) -> Result<Option<MetricResult>, EvalError> {
        match self {
            ParameterOutcome::Skipped => Ok(None),
            ParameterOutcome::Evaluated(result) => Ok(Some(result)),
            ParameterOutcome::Failed(source) => Err(EvalError::EvaluationFailure {
                parameter: name.to_string(),
                source: Box::new(source),
            }),
        }
    }
}

/// Runs one evaluation request end to end
pub struct Runner {
    config: Arc<Config>,
    evaluator: ParameterEvaluator,
}

impl Runner {
    /// Create a runner sharing the configuration and judge across requests
    pub fn new(config: Arc<Config>, judge: Arc<dyn Judge>) -> Self {
        let evaluator = ParameterEvaluator::new(judge, config.retry.policy());
        Self { config, evaluator }
    }

    /// Validate, evaluate every requested parameter concurrently, then aggregate.
    ///
    /// Any parameter failing aborts the whole request; unknown parameters are
    /// skipped.
    pub async fn run(&self, request: &EvaluationRequest) -> Result<EvaluationOutcome, EvalError> {
        let (transcript, summary) =
            validate_input(&request.transcript, &request.summary, &self.config.preprocessing)
                .inspect_err(|e| warn!(error = %e, "input validation failed"))?;

        let requested: IndexSet<&str> = request
            .evaluation_parameters
            .iter()
            .map(String::as_str)
            .collect();

        let evaluations = requested.iter().map(|name| {
            let transcript = transcript.as_str();
            let summary = summary.as_str();
            async move {
                self.dispatch(name, transcript, summary)
                    .await
                    .into_result(name)
                    .map(|result| (*name, result))
            }
        });

        let results = try_join_all(evaluations)
            .await
            .inspect_err(|e| error!(error = %e, "evaluation aborted"))?;

        let metric_details: IndexMap<String, MetricResult> = results
            .into_iter()
            .filter_map(|(name, result)| result.map(|r| (name.to_string(), r)))
            .collect();

        if metric_details.is_empty() {
            warn!(requested = ?request.evaluation_parameters, "no requested parameter is configured");
            return Err(EvalError::NoValidParameters);
        }

        info!(parameters = metric_details.len(), "aggregating scores and synthesizing explanation");

        Ok(EvaluationOutcome {
            final_score: aggregate_scores(&metric_details, &self.config.scoring_weights),
            explanation: synthesize_explanation(&metric_details),
            metric_details,
        })
    }

    /// Evaluate a single requested parameter
    async fn dispatch(&self, name: &str, transcript: &str, summary: &str) -> ParameterOutcome {
        let Some(parameter) = self.config.evaluation_parameters.get(name) else {
            warn!(parameter = %name, "requested parameter not found in configuration");
            return ParameterOutcome::Skipped;
        };

        info!(parameter = %name, "evaluating parameter");
        match self.evaluator.evaluate(transcript, summary, parameter).await {
            Ok(result) => ParameterOutcome::Evaluated(result),
            Err(e) => {
                error!(parameter = %name, error = %e, "error evaluating parameter");
                ParameterOutcome::Failed(e)
            }
        }
    }
}
