use crate::catalog::ActionKind;
use crate::strategy::{StrategyDescriptor, StrategyId, StrategyMethod};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Result of evaluating a single strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "message", rename_all = "kebab-case")]
pub enum AttemptResult {
    Matched,
    NoMatch,
    Timeout,
    Error(String),
}

impl AttemptResult {
    pub fn is_match(&self) -> bool {
        matches!(self, AttemptResult::Matched)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttemptResult::Matched => "matched",
            AttemptResult::NoMatch => "no-match",
            AttemptResult::Timeout => "timeout",
            AttemptResult::Error(_) => "error",
        }
    }
}

/// One entry of a resolution's attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub method: StrategyMethod,
    pub value: String,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub result: AttemptResult,
}

impl AttemptRecord {
    pub fn new(strategy: &StrategyDescriptor, duration_ms: u64, result: AttemptResult) -> Self {
        Self {
            method: strategy.method,
            value: strategy.value.clone(),
            duration_ms,
            result,
        }
    }

    pub fn strategy_id(&self) -> StrategyId {
        StrategyId {
            method: self.method,
            value: self.value.clone(),
        }
    }
}

/// Structured output of an `extract` action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub url: String,
    pub text: Option<String>,
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    /// One field per metadata selector; `None` when the sub-selector matched nothing.
    #[serde(default)]
    pub metadata: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ActionOutcomeRecord {
    Completed {
        kind: ActionKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<ExtractedRecord>,
    },
    Failed {
        kind: ActionKind,
        error: String,
    },
    NotAttempted {
        reason: String,
    },
}

impl ActionOutcomeRecord {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcomeRecord::Completed { .. })
    }
}

/// A cookie banner or popup resolved (and possibly clicked) ahead of the requested intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterstitialRecord {
    pub intent: String,
    pub attempts: Vec<AttemptRecord>,
    pub action: ActionOutcomeRecord,
}

impl InterstitialRecord {
    pub fn dismissed(&self) -> bool {
        self.action.is_success()
    }
}

/// Append-only record of one intent invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub intent: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interstitials: Vec<InterstitialRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_hint: Option<StrategyId>,
    pub attempts: Vec<AttemptRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_used: Option<StrategyId>,
    pub action: ActionOutcomeRecord,
}

impl DecisionLogEntry {
    pub fn new(
        intent: impl Into<String>,
        domain: impl Into<String>,
        attempts: Vec<AttemptRecord>,
        action: ActionOutcomeRecord,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            intent: intent.into(),
            domain: domain.into(),
            interstitials: Vec::new(),
            memory_hint: None,
            attempts,
            strategy_used: None,
            action,
        }
    }

    pub fn with_interstitials(mut self, interstitials: Vec<InterstitialRecord>) -> Self {
        self.interstitials = interstitials;
        self
    }

    pub fn with_memory_hint(mut self, hint: Option<StrategyId>) -> Self {
        self.memory_hint = hint;
        self
    }

    pub fn with_strategy_used(mut self, strategy: Option<StrategyId>) -> Self {
        self.strategy_used = strategy;
        self
    }
}
