use crate::config::PreprocessingConfig;
use crate::error::EvalError;

/// Collapse whitespace runs into single spaces and trim the ends
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check transcript and summary against the configured limits.
///
/// Lengths are counted in characters on the raw input; the returned pair is
/// whitespace-normalized.
pub fn validate_input(
    transcript: &str,
    summary: &str,
    constraints: &PreprocessingConfig,
) -> Result<(String, String), EvalError> {
    if transcript.trim().is_empty() {
        return Err(EvalError::InvalidInput("Transcript cannot be empty.".to_string()));
    }
    if summary.trim().is_empty() {
        return Err(EvalError::InvalidInput("Summary cannot be empty.".to_string()));
    }

    if transcript.chars().count() > constraints.max_transcript_length {
        return Err(EvalError::InvalidInput(format!(
            "Transcript length exceeds the maximum of {} characters.",
            constraints.max_transcript_length
        )));
    }
    if summary.chars().count() > constraints.max_summary_length {
        return Err(EvalError::InvalidInput(format!(
            "Summary length exceeds the maximum of {} characters.",
            constraints.max_summary_length
        )));
    }

    Ok((clean_text(transcript), clean_text(summary)))
}
