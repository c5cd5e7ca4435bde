use chromiumoxide::Page;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use wayfind_engine::page::PageError;

const LOCATOR_JS: &str = include_str!("locator.js");

/// A blocking dialog or hung page must not stall a session forever.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// The page context is gone or being replaced (navigation in flight).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

fn is_closed_error(err: &str) -> bool {
    let lower = err.to_ascii_lowercase();
    lower.contains("target closed")
        || lower.contains("session closed")
        || lower.contains("channel")
        || lower.contains("receiver")
}

/// Retry an operation only while it fails with context errors.
async fn retry_on_context_error<T, E, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, String>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let err_str = e.to_string();
                if is_context_error(&err_str) {
                    tracing::debug!(
                        "{} context error (attempt {}/{}), retrying...",
                        operation_name,
                        attempt + 1,
                        MAX_CONTEXT_RETRIES
                    );
                    last_error = Some(err_str);
                    tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
                    continue;
                }
                return Err(err_str);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| format!("{} failed after retries", operation_name)))
}

pub(crate) fn classify(err: String) -> PageError {
    if is_closed_error(&err) {
        PageError::Closed
    } else {
        PageError::Protocol(err)
    }
}

#[derive(Debug, Deserialize)]
struct ScriptError {
    kind: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Ok(Value),
    Error(ScriptError),
}

async fn evaluate_once(page: &Page, script: &str) -> Result<String, String> {
    let evaluation = tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(script))
        .await
        .map_err(|_| format!("Script evaluation timed out after {:?}", EVAL_TIMEOUT))?
        .map_err(|e| e.to_string())?;
    evaluation.into_value::<String>().map_err(|e| e.to_string())
}

/// Call `window.__wayfind.<method>(args...)`, injecting the locator first if this
/// document has not seen it yet.
pub async fn call(page: &Page, method: &str, args: &[Value]) -> Result<Value, PageError> {
    let args = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let script = format!("{}\nwindow.__wayfind.{}({})", LOCATOR_JS, method, args);

    let raw = retry_on_context_error(method, || evaluate_once(page, &script))
        .await
        .map_err(classify)?;
    let reply: Reply = serde_json::from_str(&raw)
        .map_err(|e| PageError::Protocol(format!("Malformed locator reply: {}", e)))?;

    match reply {
        Reply::Ok(value) => Ok(value),
        Reply::Error(err) => Err(match err.kind.as_str() {
            "invalid" => PageError::InvalidQuery(err.message),
            "detached" => PageError::Detached(err.message),
            _ => PageError::Protocol(err.message),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_shapes() {
        let reply: Reply = serde_json::from_str(r#"{"ok":["a:1","a:2"]}"#).unwrap();
        assert!(matches!(reply, Reply::Ok(Value::Array(ref v)) if v.len() == 2));

        let reply: Reply =
            serde_json::from_str(r#"{"error":{"kind":"invalid","message":"bad"}}"#).unwrap();
        assert!(matches!(reply, Reply::Error(ScriptError { ref kind, .. }) if kind == "invalid"));
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(classify("Target closed".into()), PageError::Closed);
        assert!(matches!(
            classify("Some protocol failure".into()),
            PageError::Protocol(_)
        ));
        assert!(is_context_error("Execution context was destroyed."));
    }
}
