//! Strategy Evaluator: one bounded, cancellable wait for one strategy.

use crate::page::{ElementHandle, Page, PageError, PageHandle};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;
use wayfind_common::strategy::{StrategyDescriptor, StrategyMethod};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of evaluating one strategy. None of these are failures of the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Matched(ElementHandle),
    /// The query never returned an element within the wait.
    NoMatch,
    /// Elements were found but none became actionable within the wait.
    Timeout,
    /// The pattern could not be evaluated (malformed selector or expression).
    EvaluationError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Session aborted while waiting for an element")]
pub struct Cancelled;

enum Probe {
    Actionable(ElementHandle),
    Pending,
    Absent,
}

#[derive(Debug, Clone)]
pub struct StrategyEvaluator {
    poll_interval: Duration,
}

impl Default for StrategyEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl StrategyEvaluator {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Wait up to `timeout` for the first actionable element the strategy selects.
    ///
    /// Exactly one wait cycle per call; trying other strategies is the caller's job.
    pub async fn evaluate(
        &self,
        strategy: &StrategyDescriptor,
        handle: &PageHandle,
        timeout: Duration,
    ) -> Result<Evaluation, Cancelled> {
        let cancel = handle.cancellation();
        let deadline = Instant::now() + timeout;
        let mut saw_candidates = false;
        let mut last_error: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(Cancelled),
                outcome = tokio::time::timeout_at(deadline, probe_once(strategy, handle.page())) => outcome,
            };

            match outcome {
                // The deadline passed mid-query; classify on what earlier polls saw.
                Err(_elapsed) => return Ok(classify(saw_candidates, last_error)),
                Ok(Ok(Probe::Actionable(element))) => return Ok(Evaluation::Matched(element)),
                Ok(Ok(Probe::Pending)) => saw_candidates = true,
                Ok(Ok(Probe::Absent)) => {}
                Ok(Err(PageError::InvalidQuery(reason))) => {
                    return Ok(Evaluation::EvaluationError(reason));
                }
                Ok(Err(PageError::Closed)) => return Err(Cancelled),
                Ok(Err(e)) => {
                    debug!("Transient page error while evaluating {}: {}", strategy, e);
                    last_error = Some(e.to_string());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(classify(saw_candidates, last_error));
            }

            let nap = self.poll_interval.min(deadline - now);
            tokio::select! {
                _ = cancel.cancelled() => return Err(Cancelled),
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }
}

/// Outcome once the wait runs out without an actionable element.
fn classify(saw_candidates: bool, last_error: Option<String>) -> Evaluation {
    if saw_candidates {
        Evaluation::Timeout
    } else if let Some(reason) = last_error {
        Evaluation::EvaluationError(reason)
    } else {
        Evaluation::NoMatch
    }
}

async fn query(
    strategy: &StrategyDescriptor,
    page: &dyn Page,
) -> Result<Vec<ElementHandle>, PageError> {
    match strategy.method {
        StrategyMethod::CssSelector => page.find_by_css(&strategy.value).await,
        StrategyMethod::AriaLabel => page.find_by_accessible_name(&strategy.value).await,
        StrategyMethod::Xpath => page.find_by_xpath(&strategy.value).await,
        StrategyMethod::TextContains => page.find_by_text(&strategy.value).await,
    }
}

async fn probe_once(strategy: &StrategyDescriptor, page: &dyn Page) -> Result<Probe, PageError> {
    let candidates = query(strategy, page).await?;
    if candidates.is_empty() {
        return Ok(Probe::Absent);
    }

    // First actionable element in document order wins.
    for element in candidates {
        match page.element_state(&element).await {
            Ok(state) if state.is_actionable() => return Ok(Probe::Actionable(element)),
            Ok(_) | Err(PageError::Detached(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(Probe::Pending)
}
