use crate::models::EvaluationOutcome;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print an evaluation outcome in the specified format
pub fn print_outcome(outcome: &EvaluationOutcome, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print!("{}", render_plain(outcome)),
        OutputFormat::Json => print_json(outcome),
    }
}

/// Render an outcome as a plain text report
fn render_plain(outcome: &EvaluationOutcome) -> String {
    let mut out = String::new();

    out.push_str(&format!("Final score: {:.1}\n\n", outcome.final_score));

    out.push_str(&format!("{:<15} {:<8}\n", "Parameter", "Score"));
    out.push_str(&format!("{}\n", "-".repeat(24)));
    for (name, metric) in &outcome.metric_details {
        out.push_str(&format!("{:<15} {:<8.1}\n", name, metric.score));
    }

    out.push('\n');
    out.push_str(&outcome.explanation);
    out.push('\n');
    out
}

fn print_json(outcome: &EvaluationOutcome) {
    match serde_json::to_string_pretty(outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing outcome to JSON: {}", e),
    }
}
