//! Per-strategy success/failure statistics, for reporting.
//!
//! These numbers never reorder a resolution plan.

use super::MemoryError;
use super::document::JsonDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use wayfind_common::protocol::AttemptRecord;
use wayfind_common::strategy::StrategyId;

/// Attempts needed before a score carries full confidence.
const FULL_CONFIDENCE_ATTEMPTS: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyCounter {
    pub success: u64,
    pub fail: u64,
}

impl StrategyCounter {
    pub fn total(&self) -> u64 {
        self.success + self.fail
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyScore {
    pub success_rate: f64,
    pub confidence: f64,
    pub weighted_score: f64,
    pub total_attempts: u64,
}

impl StrategyScore {
    fn from_counter(counter: &StrategyCounter) -> Option<Self> {
        let total = counter.total();
        if total == 0 {
            return None;
        }
        let success_rate = counter.success as f64 / total as f64;
        let confidence = (total as f64 / FULL_CONFIDENCE_ATTEMPTS).min(1.0);
        Some(Self {
            success_rate,
            confidence,
            weighted_score: success_rate * confidence,
            total_attempts: total,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntentSummary {
    pub success_rate: f64,
    pub total_attempts: u64,
    pub strategies_tested: usize,
}

type Counters = BTreeMap<StrategyId, StrategyCounter>;

pub struct StrategyStats {
    document: JsonDocument<Counters>,
}

impl StrategyStats {
    pub fn in_memory() -> Self {
        Self {
            document: JsonDocument::ephemeral(),
        }
    }

    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        Ok(Self {
            document: JsonDocument::open(path).await?,
        })
    }

    /// Count every attempt: a match is a success, anything else a failure.
    pub async fn record_attempts(&self, domain: &str, intent: &str, attempts: &[AttemptRecord]) {
        if attempts.is_empty() {
            return;
        }
        self.document
            .update(domain, intent, |counters| {
                for attempt in attempts {
                    let counter = counters.entry(attempt.strategy_id()).or_default();
                    if attempt.result.is_match() {
                        counter.success += 1;
                    } else {
                        counter.fail += 1;
                    }
                }
            })
            .await;
    }

    pub async fn counters(&self, domain: &str, intent: &str) -> Counters {
        self.document.get(domain, intent).await.unwrap_or_default()
    }

    pub async fn scores(&self, domain: &str, intent: &str) -> BTreeMap<StrategyId, StrategyScore> {
        self.counters(domain, intent)
            .await
            .iter()
            .filter_map(|(id, counter)| {
                StrategyScore::from_counter(counter).map(|score| (id.clone(), score))
            })
            .collect()
    }

    /// Best strategies by weighted score, highest first.
    pub async fn top(
        &self,
        domain: &str,
        intent: &str,
        limit: usize,
    ) -> Vec<(StrategyId, StrategyScore)> {
        let mut scored: Vec<_> = self.scores(domain, intent).await.into_iter().collect();
        scored.sort_by(|a, b| {
            b.1.weighted_score
                .total_cmp(&a.1.weighted_score)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(limit);
        scored
    }

    pub async fn domain_summary(&self, domain: &str) -> BTreeMap<String, IntentSummary> {
        self.document
            .domain(domain)
            .await
            .into_iter()
            .filter_map(|(intent, counters)| {
                let success: u64 = counters.values().map(|c| c.success).sum();
                let total: u64 = counters.values().map(StrategyCounter::total).sum();
                (total > 0).then(|| {
                    (
                        intent,
                        IntentSummary {
                            success_rate: success as f64 / total as f64,
                            total_attempts: total,
                            strategies_tested: counters.len(),
                        },
                    )
                })
            })
            .collect()
    }

    pub async fn flush(&self) -> Result<(), MemoryError> {
        self.document.flush().await
    }
}
