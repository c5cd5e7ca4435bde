use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use wayfind_common::strategy::StrategyId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryKey {
    pub domain: String,
    pub intent: String,
}

impl MemoryKey {
    pub fn new(domain: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            intent: intent.into(),
        }
    }
}

impl fmt::Display for MemoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.intent)
    }
}

/// What worked before for one `(domain, intent)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(default)]
    pub success_counts: BTreeMap<StrategyId, u64>,
    #[serde(default)]
    pub last_successful: Option<StrategyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    /// Counts only ever grow.
    pub fn record_success(&mut self, strategy: StrategyId) {
        let count = self.success_counts.entry(strategy.clone()).or_insert(0);
        *count = count.saturating_add(1);
        self.last_successful = Some(strategy);
        self.last_used = Some(Utc::now());
    }

    pub fn success_count(&self, strategy: &StrategyId) -> u64 {
        self.success_counts.get(strategy).copied().unwrap_or(0)
    }

    pub fn total_successes(&self) -> u64 {
        self.success_counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_common::strategy::StrategyDescriptor;

    #[test]
    fn test_record_success_increments_and_promotes() {
        let mut record = MemoryRecord::default();
        let aria = StrategyDescriptor::aria_label("Gmail").id();
        let text = StrategyDescriptor::text_contains("Gmail").id();

        record.record_success(aria.clone());
        record.record_success(text.clone());
        record.record_success(aria.clone());

        assert_eq!(record.success_count(&aria), 2);
        assert_eq!(record.success_count(&text), 1);
        assert_eq!(record.last_successful, Some(aria));
        assert_eq!(record.total_successes(), 3);
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = MemoryRecord::default();
        record.record_success(StrategyDescriptor::css("a.gb_X").id());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["success_counts"]["css-selector:a.gb_X"], 1);
        assert_eq!(value["last_successful"], "css-selector:a.gb_X");

        let back: MemoryRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
