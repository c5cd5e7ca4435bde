//! Selector Resolution Engine: turns an intent name into exactly one element.

use super::plan::ResolutionPlan;
use super::result::{ResolutionOutcome, ResolveError};
use crate::evaluator::{Evaluation, StrategyEvaluator};
use crate::memory::{AdaptiveMemory, StrategyStats};
use crate::page::PageHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wayfind_common::catalog::IntentCatalog;
use wayfind_common::protocol::{AttemptRecord, AttemptResult};
use wayfind_common::strategy::StrategyId;

pub struct ResolutionEngine {
    catalog: Arc<IntentCatalog>,
    memory: Arc<AdaptiveMemory>,
    evaluator: StrategyEvaluator,
    stats: Option<Arc<StrategyStats>>,
}

impl ResolutionEngine {
    pub fn new(catalog: Arc<IntentCatalog>, memory: Arc<AdaptiveMemory>) -> Self {
        Self {
            catalog,
            memory,
            evaluator: StrategyEvaluator::default(),
            stats: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: StrategyEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_stats(mut self, stats: Arc<StrategyStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    pub fn memory(&self) -> &AdaptiveMemory {
        &self.memory
    }

    pub async fn resolve(
        &self,
        intent: &str,
        handle: &PageHandle,
        domain: &str,
    ) -> Result<ResolutionOutcome, ResolveError> {
        self.resolve_with_timeout(intent, handle, domain, None).await
    }

    /// Resolve with every strategy's wait budget replaced by `timeout_override`.
    pub async fn resolve_with_timeout(
        &self,
        intent: &str,
        handle: &PageHandle,
        domain: &str,
        timeout_override: Option<Duration>,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let Some(definition) = self.catalog.get(intent) else {
            return Err(ResolveError::UnknownIntent {
                name: intent.to_string(),
                suggestions: self
                    .catalog
                    .suggest(intent)
                    .into_iter()
                    .map(String::from)
                    .collect(),
            });
        };

        let mut plan = ResolutionPlan::for_intent(definition, timeout_override);
        let memory_hint = self.memory_hint(domain, intent).await;
        if let Some(hint) = &memory_hint {
            if plan.promote(hint) {
                debug!("Promoted {} for {} on {}", hint, intent, domain);
            } else {
                debug!("Remembered strategy {} is no longer in the plan", hint);
            }
        }

        let mut attempts = Vec::with_capacity(plan.len());
        for planned in plan.iter() {
            let strategy = &planned.descriptor;
            let started = Instant::now();
            let evaluation = match self
                .evaluator
                .evaluate(strategy, handle, planned.timeout)
                .await
            {
                Ok(evaluation) => evaluation,
                Err(_) => {
                    info!("Resolution of {} cancelled during {}", intent, strategy);
                    return Err(ResolveError::Cancelled {
                        intent: intent.to_string(),
                        attempts,
                        memory_hint,
                    });
                }
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let (result, element) = match evaluation {
                Evaluation::Matched(element) => (AttemptResult::Matched, Some(element)),
                Evaluation::NoMatch => (AttemptResult::NoMatch, None),
                Evaluation::Timeout => (AttemptResult::Timeout, None),
                Evaluation::EvaluationError(reason) => (AttemptResult::Error(reason), None),
            };
            debug!("{} {} -> {} ({}ms)", intent, strategy, result.label(), elapsed_ms);
            attempts.push(AttemptRecord::new(strategy, elapsed_ms, result));

            if let Some(element) = element {
                info!(
                    "Resolved {} on {} via {} after {} attempt(s)",
                    intent,
                    domain,
                    strategy,
                    attempts.len()
                );
                if let Err(e) = self
                    .memory
                    .record_outcome(domain, intent, strategy, true)
                    .await
                {
                    warn!("Failed to update memory for {}/{}: {}", domain, intent, e);
                }
                self.record_stats(domain, intent, &attempts).await;
                return Ok(ResolutionOutcome {
                    intent: intent.to_string(),
                    element,
                    strategy: strategy.clone(),
                    attempts,
                    memory_hint,
                });
            }
        }

        info!(
            "All {} strategies exhausted for {} on {}",
            attempts.len(),
            intent,
            domain
        );
        self.record_stats(domain, intent, &attempts).await;
        Err(ResolveError::AllStrategiesExhausted {
            intent: intent.to_string(),
            attempts,
            memory_hint,
        })
    }

    async fn memory_hint(&self, domain: &str, intent: &str) -> Option<StrategyId> {
        match self.memory.get_hint(domain, intent).await {
            Ok(hint) => hint,
            Err(e) => {
                warn!("Failed to read memory for {}/{}: {}", domain, intent, e);
                None
            }
        }
    }

    async fn record_stats(&self, domain: &str, intent: &str, attempts: &[AttemptRecord]) {
        if let Some(stats) = &self.stats {
            stats.record_attempts(domain, intent, attempts).await;
        }
    }
}
