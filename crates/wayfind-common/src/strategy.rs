use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a strategy's `value` is interpreted when locating an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyMethod {
    CssSelector,
    AriaLabel,
    Xpath,
    TextContains,
}

impl StrategyMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyMethod::CssSelector => "css-selector",
            StrategyMethod::AriaLabel => "aria-label",
            StrategyMethod::Xpath => "xpath",
            StrategyMethod::TextContains => "text-contains",
        }
    }
}

impl fmt::Display for StrategyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown strategy method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for StrategyMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "css-selector" => Ok(StrategyMethod::CssSelector),
            "aria-label" => Ok(StrategyMethod::AriaLabel),
            "xpath" => Ok(StrategyMethod::Xpath),
            "text-contains" => Ok(StrategyMethod::TextContains),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// One method + pattern pair, optionally carrying its own wait budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    pub method: StrategyMethod,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl StrategyDescriptor {
    pub fn new(method: StrategyMethod, value: impl Into<String>) -> Self {
        Self {
            method,
            value: value.into(),
            timeout_ms: None,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(StrategyMethod::CssSelector, value)
    }

    pub fn aria_label(value: impl Into<String>) -> Self {
        Self::new(StrategyMethod::AriaLabel, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(StrategyMethod::Xpath, value)
    }

    pub fn text_contains(value: impl Into<String>) -> Self {
        Self::new(StrategyMethod::TextContains, value)
    }

    /// Parse a catalog `primary_selector`.
    ///
    /// Plain values are CSS selectors. Locator-engine prefixes (`xpath=`, `text=`,
    /// `aria-label=`, `css=`) select another method, and a bare `//...` or `(//...`
    /// expression is taken as XPath.
    pub fn from_primary_selector(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix("xpath=") {
            Self::xpath(rest)
        } else if let Some(rest) = raw.strip_prefix("text=") {
            Self::text_contains(rest)
        } else if let Some(rest) = raw.strip_prefix("aria-label=") {
            Self::aria_label(rest)
        } else if let Some(rest) = raw.strip_prefix("css=") {
            Self::css(rest)
        } else if raw.starts_with("//") || raw.starts_with("(//") {
            Self::xpath(raw)
        } else {
            Self::css(raw)
        }
    }

    /// The identity used for memory promotion and statistics. Timeouts are not part of it.
    pub fn id(&self) -> StrategyId {
        StrategyId {
            method: self.method,
            value: self.value.clone(),
        }
    }

    pub fn same_strategy(&self, other: &StrategyDescriptor) -> bool {
        self.method == other.method && self.value == other.value
    }

    pub fn effective_timeout_ms(&self, intent_default: u64) -> u64 {
        self.timeout_ms.unwrap_or(intent_default)
    }
}

impl fmt::Display for StrategyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.value)
    }
}

/// Identity of a strategy, rendered as `method:value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrategyId {
    pub method: StrategyMethod,
    pub value: String,
}

impl StrategyId {
    pub fn matches(&self, descriptor: &StrategyDescriptor) -> bool {
        self.method == descriptor.method && self.value == descriptor.value
    }
}

impl From<&StrategyDescriptor> for StrategyId {
    fn from(descriptor: &StrategyDescriptor) -> Self {
        descriptor.id()
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.value)
    }
}

impl FromStr for StrategyId {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (method, value) = s
            .split_once(':')
            .ok_or_else(|| UnknownMethod(s.to_string()))?;
        Ok(StrategyId {
            method: method.parse()?,
            value: value.to_string(),
        })
    }
}

// Serialized as the `method:value` string so it can key JSON maps.
impl Serialize for StrategyId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StrategyId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
