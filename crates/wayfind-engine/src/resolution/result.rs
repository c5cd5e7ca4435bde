use crate::page::ElementHandle;
use thiserror::Error;
use wayfind_common::protocol::AttemptRecord;
use wayfind_common::strategy::{StrategyDescriptor, StrategyId};

/// A resolved intent: exactly one element, the strategy that found it, and the attempt log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    pub intent: String,
    pub element: ElementHandle,
    pub strategy: StrategyDescriptor,
    pub attempts: Vec<AttemptRecord>,
    pub memory_hint: Option<StrategyId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unknown intent '{name}'{}", did_you_mean(.suggestions))]
    UnknownIntent {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("All strategies exhausted for '{intent}' ({} attempts)", .attempts.len())]
    AllStrategiesExhausted {
        intent: String,
        attempts: Vec<AttemptRecord>,
        memory_hint: Option<StrategyId>,
    },

    #[error("Resolution of '{intent}' cancelled after {} attempts", .attempts.len())]
    Cancelled {
        intent: String,
        attempts: Vec<AttemptRecord>,
        memory_hint: Option<StrategyId>,
    },
}

impl ResolveError {
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            ResolveError::UnknownIntent { .. } => &[],
            ResolveError::AllStrategiesExhausted { attempts, .. }
            | ResolveError::Cancelled { attempts, .. } => attempts,
        }
    }

    pub fn memory_hint(&self) -> Option<&StrategyId> {
        match self {
            ResolveError::UnknownIntent { .. } => None,
            ResolveError::AllStrategiesExhausted { memory_hint, .. }
            | ResolveError::Cancelled { memory_hint, .. } => memory_hint.as_ref(),
        }
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ResolveError::UnknownIntent {
            name: "click_gmial".into(),
            suggestions: vec!["click_gmail".into()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown intent 'click_gmial' (did you mean: click_gmail?)"
        );

        let err = ResolveError::UnknownIntent {
            name: "zzz".into(),
            suggestions: vec![],
        };
        assert_eq!(err.to_string(), "Unknown intent 'zzz'");
        assert!(err.attempts().is_empty());
    }
}
