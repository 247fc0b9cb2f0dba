use crate::config::{EvaluationParameterConfig, LlmSettings};
use crate::error::EvalError;
use crate::models::MetricResult;
use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    ResponseFormat,
};
use async_openai::{Client, config::OpenAIConfig};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Fixed instruction sent ahead of every parameter prompt
pub const SYSTEM_PROMPT: &str = "You are an expert evaluator. Your response must be a single JSON object with two keys: 'score' (a float from 0.0 to 10.0) and 'explanation' (a string).";

/// A chat model that answers one system + user exchange with raw text
#[async_trait]
pub trait Judge: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, EvalError>;
}

/// Judge backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiJudge {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiJudge {
    /// Create the shared client from the LLM settings
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key()?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&settings.api_endpoint);

        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: settings.request_timeout(),
        })
    }

    /// Build the chat completion request asking for a JSON object
    fn build_request(&self, system: &str, prompt: &str) -> Result<CreateChatCompletionRequest, EvalError> {
        let system_message: ChatCompletionRequestMessage = ChatCompletionRequestSystemMessageArgs::default()
            .content(system.to_string())
            .build()?
            .into();

        let user_message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()?
            .into();

        Ok(CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([system_message, user_message])
            .temperature(self.temperature)
            .response_format(ResponseFormat::JsonObject)
            .build()?)
    }

    /// Extract the first choice's text, if any
    fn extract_content(response: CreateChatCompletionResponse) -> String {
        match response.choices.into_iter().next() {
            Some(choice) => choice.message.content.unwrap_or_default(),
            None => String::new(),
        }
    }
}

#[async_trait]
impl Judge for OpenAiJudge {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, EvalError> {
        let request = self.build_request(system, prompt)?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| EvalError::Provider(format!("request timed out after {:?}", self.timeout)))??;

        Ok(Self::extract_content(response))
    }
}

/// Judges one evaluation parameter at a time
#[derive(Clone)]
pub struct ParameterEvaluator {
    judge: Arc<dyn Judge>,
    retry: RetryPolicy,
}

impl ParameterEvaluator {
    pub fn new(judge: Arc<dyn Judge>, retry: RetryPolicy) -> Self {
        Self { judge, retry }
    }

    /// Score `summary` against `transcript` for one parameter, retrying
    /// transient and malformed responses
    pub async fn evaluate(
        &self,
        transcript: &str,
        summary: &str,
        parameter: &EvaluationParameterConfig,
    ) -> Result<MetricResult, EvalError> {
        let prompt = build_prompt(&parameter.prompt_template, transcript, summary);

        self.retry
            .run(&parameter.name, || self.evaluate_once(&prompt, &parameter.name))
            .await
    }

    async fn evaluate_once(&self, prompt: &str, name: &str) -> Result<MetricResult, EvalError> {
        info!(parameter = %name, "sending request to LLM");

        let content = self.judge.complete(SYSTEM_PROMPT, prompt).await.inspect_err(|e| {
            error!(parameter = %name, error = %e, "LLM call failed");
        })?;

        debug!(parameter = %name, raw = %content, "LLM raw response");

        parse_metric_response(&content).inspect_err(|e| {
            error!(parameter = %name, error = %e, "could not use LLM response");
        })
    }
}

/// Substitute transcript and summary into a parameter's template.
///
/// Single pass over the template: slot markers appearing inside the
/// substituted texts are never expanded.
pub fn build_prompt(template: &str, transcript: &str, summary: &str) -> String {
    let mut prompt = String::with_capacity(template.len() + transcript.len() + summary.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{transcript}") {
            prompt.push_str(transcript);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{summary}") {
            prompt.push_str(summary);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);
    prompt
}

/// Parse `{"score": <number>, "explanation": <string>}` into a metric
pub fn parse_metric_response(content: &str) -> Result<MetricResult, EvalError> {
    if content.trim().is_empty() {
        return Err(EvalError::MalformedResponse("LLM returned an empty response.".to_string()));
    }

    let parsed: Value = serde_json::from_str(content)
        .map_err(|e| EvalError::MalformedResponse(format!("Could not decode LLM JSON response: {e}")))?;

    let (Some(score), Some(explanation)) = (parsed.get("score"), parsed.get("explanation")) else {
        return Err(EvalError::MalformedResponse(
            "LLM response is missing 'score' or 'explanation' key.".to_string(),
        ));
    };

    // Some JSON-mode models quote numbers.
    let score = score
        .as_f64()
        .or_else(|| score.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .ok_or_else(|| EvalError::MalformedResponse(format!("'score' is not a number: {score}")))?;
    let explanation = explanation
        .as_str()
        .ok_or_else(|| EvalError::MalformedResponse("'explanation' is not a string".to_string()))?;

    MetricResult::new(score, explanation)
}
