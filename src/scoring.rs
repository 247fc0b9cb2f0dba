use indexmap::IndexMap;

use crate::models::MetricResult;

/// Weighted mean of the metric scores.
///
/// Only parameters with a strictly positive weight contribute. When none do,
/// the plain mean of every score is used; an empty input scores 0.
pub fn aggregate_scores(
    metric_results: &IndexMap<String, MetricResult>,
    weights: &IndexMap<String, f64>,
) -> f64 {
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    for (param, result) in metric_results {
        let weight = weights.get(param).copied().unwrap_or(0.0);
        if weight > 0.0 {
            total_score += result.score * weight;
            total_weight += weight;
        }
    }

    if total_weight > 0.0 {
        return total_score / total_weight;
    }

    if metric_results.is_empty() {
        return 0.0;
    }
    let sum: f64 = metric_results.values().map(|r| r.score).sum();
    sum / metric_results.len() as f64
}

/// One paragraph per metric under an "Overall assessment:" header
pub fn synthesize_explanation(metric_results: &IndexMap<String, MetricResult>) -> String {
    if metric_results.is_empty() {
        return "No evaluation was performed.".to_string();
    }

    let mut parts = vec!["Overall assessment:".to_string()];
    for (param, result) in metric_results {
        parts.push(format!(
            "**{} (Score: {:.1}):** {}",
            capitalize(param),
            result.score,
            result.explanation
        ));
    }

    parts.join("\n\n")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
