use super::loader::CatalogError;
use crate::strategy::{StrategyDescriptor, StrategyMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What to do with the element once it is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Extract,
    Type,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Click => f.write_str("click"),
            ActionKind::Extract => f.write_str("extract"),
            ActionKind::Type => f.write_str("type"),
        }
    }
}

/// A page-relative CSS selector used to fill one field of an extraction record.
///
/// A trailing `@name` reads that attribute instead of the element text,
/// falling back to the text when the attribute is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSelector {
    pub selector: String,
    pub attribute: Option<String>,
}

impl MetadataSelector {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.rsplit_once('@') {
            Some((selector, attribute))
                if !selector.trim().is_empty() && is_attribute_name(attribute) =>
            {
                Self {
                    selector: selector.trim().to_string(),
                    attribute: Some(attribute.to_string()),
                }
            }
            _ => Self {
                selector: raw.to_string(),
                attribute: None,
            },
        }
    }
}

fn is_attribute_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
}

impl fmt::Display for MetadataSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{}@{}", self.selector, attr),
            None => f.write_str(&self.selector),
        }
    }
}

/// A named intent and its resolution plan. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentDefinition {
    pub name: String,
    pub description: Option<String>,
    pub primary: StrategyDescriptor,
    pub fallbacks: Vec<StrategyDescriptor>,
    /// Default wait budget for strategies that carry none of their own.
    pub timeout_ms: u64,
    pub action: ActionKind,
    pub metadata_selectors: BTreeMap<String, MetadataSelector>,
}

impl IntentDefinition {
    /// `[primary, ...fallbacks]` in catalog order.
    pub fn strategies(&self) -> Vec<StrategyDescriptor> {
        let mut plan = Vec::with_capacity(1 + self.fallbacks.len());
        plan.push(self.primary.clone());
        plan.extend(self.fallbacks.iter().cloned());
        plan
    }

    pub fn timeout_for(&self, strategy: &StrategyDescriptor) -> u64 {
        strategy.effective_timeout_ms(self.timeout_ms)
    }
}

/// On-disk shape of one catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIntent {
    pub primary_selector: String,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub fallbacks: Vec<RawFallback>,
    #[serde(default)]
    pub metadata_selectors: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub action: Option<ActionKind>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFallback {
    pub method: String,
    pub value: String,
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl RawIntent {
    pub fn into_definition(
        self,
        name: &str,
        default_timeout_ms: u64,
    ) -> Result<IntentDefinition, CatalogError> {
        let invalid = |reason: String| CatalogError::Invalid {
            intent: name.to_string(),
            reason,
        };

        if name.trim().is_empty() {
            return Err(invalid("intent name cannot be empty".into()));
        }
        if self.primary_selector.trim().is_empty() {
            return Err(invalid("primary_selector cannot be empty".into()));
        }
        if self.timeout == Some(0) {
            return Err(invalid("timeout must be positive".into()));
        }

        let primary = StrategyDescriptor::from_primary_selector(&self.primary_selector);
        if primary.value.trim().is_empty() {
            return Err(invalid("primary_selector has an empty pattern".into()));
        }

        let mut fallbacks = Vec::with_capacity(self.fallbacks.len());
        for (idx, raw) in self.fallbacks.into_iter().enumerate() {
            let method: StrategyMethod = raw
                .method
                .parse()
                .map_err(|e| invalid(format!("fallback #{}: {}", idx + 1, e)))?;
            if raw.value.trim().is_empty() {
                return Err(invalid(format!("fallback #{}: empty value", idx + 1)));
            }
            let mut descriptor = StrategyDescriptor::new(method, raw.value);
            match raw.timeout {
                Some(0) => {
                    return Err(invalid(format!(
                        "fallback #{}: timeout must be positive",
                        idx + 1
                    )));
                }
                Some(t) => descriptor = descriptor.with_timeout(t),
                None => {}
            }
            fallbacks.push(descriptor);
        }

        let mut metadata_selectors = BTreeMap::new();
        for (field, selector) in self.metadata_selectors.unwrap_or_default() {
            if selector.trim().is_empty() {
                return Err(invalid(format!("metadata selector '{}' is empty", field)));
            }
            metadata_selectors.insert(field, MetadataSelector::parse(&selector));
        }

        let action = self.action.unwrap_or(if metadata_selectors.is_empty() {
            ActionKind::Click
        } else {
            ActionKind::Extract
        });

        Ok(IntentDefinition {
            name: name.to_string(),
            description: self.description,
            primary,
            fallbacks,
            timeout_ms: self.timeout.unwrap_or(default_timeout_ms),
            action,
            metadata_selectors,
        })
    }
}
