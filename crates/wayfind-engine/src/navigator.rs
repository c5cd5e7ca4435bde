//! Session orchestration: interstitials, resolution, action, decision log.

use crate::action::{ActionExecutor, ActionInput, ActionResult};
use crate::config::{EngineConfig, InterstitialConfig, WayfindConfig};
use crate::decision_log::{DecisionLog, DecisionSink, JsonlFileSink};
use crate::evaluator::StrategyEvaluator;
use crate::memory::{AdaptiveMemory, DocumentStore, MemoryError, StrategyStats};
use crate::page::{PageError, PageHandle, domain_host};
use crate::resolution::{ResolutionEngine, ResolutionOutcome, ResolveError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use wayfind_common::catalog::{ActionKind, CatalogError, CatalogLoader, IntentCatalog};
use wayfind_common::protocol::{ActionOutcomeRecord, DecisionLogEntry, InterstitialRecord};

/// Memory partition for pages whose URL carries no host.
pub const UNKNOWN_DOMAIN: &str = "unknown";

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("Could not read page URL: {0}")]
    Page(#[from] PageError),
}

/// Everything one `run` produced. The decision log holds the same facts.
#[derive(Debug)]
pub struct RunReport {
    pub intent: String,
    pub domain: String,
    /// Every interstitial resolution tried before the intent, dismissed or not.
    pub interstitials: Vec<InterstitialRecord>,
    pub resolution: Result<ResolutionOutcome, ResolveError>,
    pub action: ActionOutcomeRecord,
    pub result: Option<ActionResult>,
    pub logged: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.resolution.is_ok() && self.action.is_success()
    }

    /// Names of the interstitials that were clicked away.
    pub fn dismissed(&self) -> Vec<&str> {
        self.interstitials
            .iter()
            .filter(|i| i.dismissed())
            .map(|i| i.intent.as_str())
            .collect()
    }
}

pub struct Navigator {
    engine: ResolutionEngine,
    executor: ActionExecutor,
    memory: Arc<AdaptiveMemory>,
    stats: Arc<StrategyStats>,
    log: DecisionLog,
    interstitials: InterstitialConfig,
}

impl Navigator {
    /// Load catalog, memory and statistics from the configured paths.
    pub async fn open(config: &WayfindConfig) -> Result<Self, NavigatorError> {
        let catalog =
            CatalogLoader::load_path(&config.catalog_path, config.engine.default_timeout_ms)?;
        info!(
            "Loaded {} intents from {}",
            catalog.len(),
            config.catalog_path.display()
        );
        let memory = AdaptiveMemory::new(Arc::new(
            DocumentStore::open(&config.memory_path).await?,
        ));
        let stats = StrategyStats::open(&config.stats_path).await?;
        let sink = JsonlFileSink::in_dir(&config.log_dir);

        Ok(Self::from_parts(
            Arc::new(catalog),
            Arc::new(memory),
            Arc::new(stats),
            Arc::new(sink),
        )
        .with_engine_config(&config.engine)
        .with_interstitials(config.interstitials.clone()))
    }

    pub fn from_parts(
        catalog: Arc<IntentCatalog>,
        memory: Arc<AdaptiveMemory>,
        stats: Arc<StrategyStats>,
        sink: Arc<dyn DecisionSink>,
    ) -> Self {
        let engine = ResolutionEngine::new(catalog, memory.clone()).with_stats(stats.clone());
        Self {
            engine,
            executor: ActionExecutor::default(),
            memory,
            stats,
            log: DecisionLog::new(sink),
            interstitials: InterstitialConfig::default(),
        }
    }

    pub fn with_engine_config(mut self, config: &EngineConfig) -> Self {
        self.engine = self
            .engine
            .with_evaluator(StrategyEvaluator::new(config.poll_interval()));
        self.executor = ActionExecutor::new(config.settle());
        self
    }

    pub fn with_interstitials(mut self, config: InterstitialConfig) -> Self {
        self.interstitials = config;
        self
    }

    pub fn catalog(&self) -> &IntentCatalog {
        self.engine.catalog()
    }

    pub fn memory(&self) -> &AdaptiveMemory {
        &self.memory
    }

    pub fn stats(&self) -> &StrategyStats {
        &self.stats
    }

    /// Resolve `intent` on the current page and perform its action.
    ///
    /// Exactly one decision log entry is appended per call, whatever the outcome.
    pub async fn run(
        &self,
        intent: &str,
        handle: &PageHandle,
        input: &ActionInput,
    ) -> Result<RunReport, NavigatorError> {
        let url = match handle.page().current_url().await {
            Ok(url) => url,
            Err(e) => {
                let entry = DecisionLogEntry::new(
                    intent,
                    UNKNOWN_DOMAIN,
                    vec![],
                    ActionOutcomeRecord::NotAttempted {
                        reason: e.to_string(),
                    },
                );
                self.log.record(&entry).await;
                return Err(e.into());
            }
        };
        let domain = domain_host(&url).unwrap_or_else(|| UNKNOWN_DOMAIN.to_string());
        info!("Running {} on {}", intent, domain);

        let interstitials = if self.engine.catalog().contains(intent) {
            self.dismiss_interstitials(intent, handle, &domain).await
        } else {
            Vec::new()
        };

        let resolution = self.engine.resolve(intent, handle, &domain).await;

        let (action, result) = match &resolution {
            Ok(outcome) => self.perform(outcome, handle, input).await,
            Err(e) => (
                ActionOutcomeRecord::NotAttempted {
                    reason: e.to_string(),
                },
                None,
            ),
        };

        let entry = match &resolution {
            Ok(outcome) => {
                DecisionLogEntry::new(intent, &domain, outcome.attempts.clone(), action.clone())
                    .with_memory_hint(outcome.memory_hint.clone())
                    .with_strategy_used(Some(outcome.strategy.id()))
            }
            Err(e) => DecisionLogEntry::new(intent, &domain, e.attempts().to_vec(), action.clone())
                .with_memory_hint(e.memory_hint().cloned()),
        }
        .with_interstitials(interstitials.clone());
        let logged = self.log.record(&entry).await;

        Ok(RunReport {
            intent: intent.to_string(),
            domain,
            interstitials,
            resolution,
            action,
            result,
            logged,
        })
    }

    async fn perform(
        &self,
        outcome: &ResolutionOutcome,
        handle: &PageHandle,
        input: &ActionInput,
    ) -> (ActionOutcomeRecord, Option<ActionResult>) {
        let Some(definition) = self.engine.catalog().get(&outcome.intent) else {
            return (
                ActionOutcomeRecord::NotAttempted {
                    reason: format!("intent '{}' left the catalog", outcome.intent),
                },
                None,
            );
        };
        let kind = definition.action;
        match self
            .executor
            .execute(kind, &outcome.element, definition, handle, input)
            .await
        {
            Ok(result) => (result.to_record(), Some(result)),
            Err(e) => {
                info!("{} failed for {}: {}", kind, outcome.intent, e);
                (
                    ActionOutcomeRecord::Failed {
                        kind,
                        error: e.to_string(),
                    },
                    None,
                )
            }
        }
    }

    /// Click away any configured cookie banner or popup that is present right now.
    ///
    /// Each resolution is returned with its attempts so the run's log entry accounts
    /// for every memory update it caused.
    async fn dismiss_interstitials(
        &self,
        intent: &str,
        handle: &PageHandle,
        domain: &str,
    ) -> Vec<InterstitialRecord> {
        let mut records = Vec::new();
        if !self.interstitials.enabled || self.interstitials.intents.iter().any(|i| i == intent) {
            return records;
        }

        for name in &self.interstitials.intents {
            let Some(definition) = self.engine.catalog().get(name) else {
                continue;
            };
            if handle.is_aborted() {
                break;
            }
            let outcome = match self
                .engine
                .resolve_with_timeout(name, handle, domain, Some(self.interstitials.timeout()))
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    debug!("No {} interstitial on {}: {}", name, domain, e);
                    records.push(InterstitialRecord {
                        intent: name.clone(),
                        attempts: e.attempts().to_vec(),
                        action: ActionOutcomeRecord::NotAttempted {
                            reason: e.to_string(),
                        },
                    });
                    continue;
                }
            };
            let action = match self
                .executor
                .execute(
                    ActionKind::Click,
                    &outcome.element,
                    definition,
                    handle,
                    &ActionInput::default(),
                )
                .await
            {
                Ok(result) => {
                    info!("Dismissed {} on {}", name, domain);
                    result.to_record()
                }
                Err(e) => {
                    debug!("Could not dismiss {} on {}: {}", name, domain, e);
                    ActionOutcomeRecord::Failed {
                        kind: ActionKind::Click,
                        error: e.to_string(),
                    }
                }
            };
            records.push(InterstitialRecord {
                intent: name.clone(),
                attempts: outcome.attempts,
                action,
            });
        }
        records
    }

    /// Persist memory and statistics.
    pub async fn close(&self) -> Result<(), NavigatorError> {
        self.memory.flush().await?;
        self.stats.flush().await?;
        debug!("Navigator state flushed");
        Ok(())
    }
}
