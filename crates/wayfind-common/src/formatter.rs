use crate::catalog::IntentDefinition;
use crate::protocol::{ActionOutcomeRecord, AttemptRecord, AttemptResult, ExtractedRecord};

/// Longest value printed before truncation.
const MAX_VALUE_WIDTH: usize = 60;

pub fn format_attempts(attempts: &[AttemptRecord]) -> String {
    let mut output = String::new();
    for (idx, attempt) in attempts.iter().enumerate() {
        let marker = match attempt.result {
            AttemptResult::Matched => "+",
            AttemptResult::NoMatch | AttemptResult::Timeout => "-",
            AttemptResult::Error(_) => "!",
        };
        output.push_str(&format!(
            "  {} [{}] {} {:?} ({} ms) {}",
            marker,
            idx + 1,
            attempt.method,
            truncate(&attempt.value),
            attempt.duration_ms,
            attempt.result.label()
        ));
        if let AttemptResult::Error(message) = &attempt.result {
            output.push_str(&format!(": {}", message));
        }
        output.push('\n');
    }
    output
}

pub fn format_action(action: &ActionOutcomeRecord) -> String {
    match action {
        ActionOutcomeRecord::Completed { kind, data: None } => format!("{} completed\n", kind),
        ActionOutcomeRecord::Completed {
            kind,
            data: Some(record),
        } => format!("{} completed\n{}", kind, format_extracted(record)),
        ActionOutcomeRecord::Failed { kind, error } => format!("{} failed: {}\n", kind, error),
        ActionOutcomeRecord::NotAttempted { reason } => format!("no action: {}\n", reason),
    }
}

pub fn format_extracted(record: &ExtractedRecord) -> String {
    let mut output = format!("@ {}\n", record.url);
    for (field, value) in &record.metadata {
        match value {
            Some(v) => output.push_str(&format!("  {}: {:?}\n", field, truncate(v))),
            None => output.push_str(&format!("  {}: null\n", field)),
        }
    }
    for (attr, link) in &record.links {
        output.push_str(&format!("  {} -> {}\n", attr, link));
    }
    output.push_str(&format!("  words: {}\n", record.word_count));
    output
}

pub fn format_intent(intent: &IntentDefinition) -> String {
    let mut output = format!("{} ({}, {} ms)", intent.name, intent.action, intent.timeout_ms);
    if let Some(description) = &intent.description {
        output.push_str(&format!(" - {}", description));
    }
    output.push('\n');
    for (idx, strategy) in intent.strategies().iter().enumerate() {
        output.push_str(&format!(
            "  {}. {} {:?}",
            idx + 1,
            strategy.method,
            truncate(&strategy.value)
        ));
        if let Some(timeout) = strategy.timeout_ms {
            output.push_str(&format!(" ({} ms)", timeout));
        }
        output.push('\n');
    }
    for (field, selector) in &intent.metadata_selectors {
        output.push_str(&format!("  {} <- {}\n", field, selector));
    }
    output
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_WIDTH {
        value.to_string()
    } else {
        let head: String = value.chars().take(MAX_VALUE_WIDTH - 3).collect();
        format!("{}...", head)
    }
}
