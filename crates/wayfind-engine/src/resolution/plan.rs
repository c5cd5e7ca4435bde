use std::time::Duration;
use wayfind_common::catalog::IntentDefinition;
use wayfind_common::strategy::{StrategyDescriptor, StrategyId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStrategy {
    pub descriptor: StrategyDescriptor,
    pub timeout: Duration,
}

/// Ordered strategies for one intent invocation. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
    strategies: Vec<PlannedStrategy>,
}

impl ResolutionPlan {
    /// `[primary, ...fallbacks]` in catalog order, each with its own wait budget.
    ///
    /// `timeout_override` replaces every budget, including per-strategy ones.
    pub fn for_intent(intent: &IntentDefinition, timeout_override: Option<Duration>) -> Self {
        let strategies = intent
            .strategies()
            .into_iter()
            .map(|descriptor| {
                let timeout = timeout_override.unwrap_or_else(|| {
                    Duration::from_millis(intent.timeout_for(&descriptor))
                });
                PlannedStrategy {
                    descriptor,
                    timeout,
                }
            })
            .collect();
        Self { strategies }
    }

    /// Move the remembered strategy to the front, keeping everything else in order.
    ///
    /// Returns false when the hint names a strategy this plan does not contain.
    pub fn promote(&mut self, hint: &StrategyId) -> bool {
        let Some(pos) = self
            .strategies
            .iter()
            .position(|planned| hint.matches(&planned.descriptor))
        else {
            return false;
        };
        if pos > 0 {
            let planned = self.strategies.remove(pos);
            self.strategies.insert(0, planned);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedStrategy> {
        self.strategies.iter()
    }

    pub fn descriptors(&self) -> Vec<&StrategyDescriptor> {
        self.strategies.iter().map(|p| &p.descriptor).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use wayfind_common::catalog::ActionKind;

    fn gmail() -> IntentDefinition {
        IntentDefinition {
            name: "click_gmail".into(),
            description: None,
            primary: StrategyDescriptor::css("a.gb_X"),
            fallbacks: vec![
                StrategyDescriptor::aria_label("Gmail"),
                StrategyDescriptor::xpath("//a[contains(@href,'mail.google.com')]")
                    .with_timeout(500),
                StrategyDescriptor::text_contains("Gmail"),
            ],
            timeout_ms: 3000,
            action: ActionKind::Click,
            metadata_selectors: BTreeMap::new(),
        }
    }

    fn values(plan: &ResolutionPlan) -> Vec<String> {
        plan.descriptors().iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_catalog_order_and_timeouts() {
        let plan = ResolutionPlan::for_intent(&gmail(), None);
        assert_eq!(plan.len(), 4);
        let timeouts: Vec<u64> = plan.iter().map(|p| p.timeout.as_millis() as u64).collect();
        assert_eq!(timeouts, vec![3000, 3000, 500, 3000]);

        let plan = ResolutionPlan::for_intent(&gmail(), Some(Duration::from_millis(200)));
        assert!(plan.iter().all(|p| p.timeout == Duration::from_millis(200)));
    }

    #[test]
    fn test_promote_is_stable() {
        let mut plan = ResolutionPlan::for_intent(&gmail(), None);
        assert!(plan.promote(&StrategyDescriptor::text_contains("Gmail").id()));
        assert_eq!(
            values(&plan),
            vec![
                "text-contains:Gmail",
                "css-selector:a.gb_X",
                "aria-label:Gmail",
                "xpath://a[contains(@href,'mail.google.com')]",
            ]
        );
    }

    #[test]
    fn test_promote_unknown_hint_keeps_order() {
        let mut plan = ResolutionPlan::for_intent(&gmail(), None);
        let before = values(&plan);
        assert!(!plan.promote(&StrategyDescriptor::css("#gone").id()));
        assert_eq!(values(&plan), before);
    }
}
