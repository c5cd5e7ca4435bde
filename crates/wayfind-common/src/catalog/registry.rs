use super::definition::IntentDefinition;
use super::loader::CatalogError;
use std::collections::HashMap;

const SUGGESTION_THRESHOLD: f64 = 0.8;

/// The loaded, read-only table of intents.
#[derive(Debug, Default, Clone)]
pub struct IntentCatalog {
    intents: HashMap<String, IntentDefinition>,
}

impl IntentCatalog {
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = IntentDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut intents = HashMap::new();
        for def in definitions {
            if intents.contains_key(&def.name) {
                return Err(CatalogError::Duplicate(def.name));
            }
            intents.insert(def.name.clone(), def);
        }
        Ok(Self { intents })
    }

    pub fn get(&self, name: &str) -> Option<&IntentDefinition> {
        self.intents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.intents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Intent names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.intents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Known names close to `name`, best first.
    pub fn suggest(&self, name: &str) -> Vec<&str> {
        let mut scored: Vec<(f64, &str)> = self
            .intents
            .keys()
            .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate.as_str()))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().map(|(_, name)| name).collect()
    }

    /// Map a free-text request such as "click gmail" to an intent name.
    ///
    /// Tries, in order: the text as an exact name, the longest name whose
    /// `_`-separated words all occur in the text, then the closest fuzzy match.
    pub fn match_description(&self, description: &str) -> Option<&str> {
        let normalized = description.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let as_name = normalized.split_whitespace().collect::<Vec<_>>().join("_");
        if let Some((name, _)) = self.intents.get_key_value(as_name.as_str()) {
            return Some(name.as_str());
        }

        let words: Vec<&str> = normalized.split_whitespace().collect();
        let keyword_match = self
            .names()
            .into_iter()
            .filter(|name| {
                name.split('_')
                    .filter(|part| !part.is_empty())
                    .all(|part| words.contains(&part))
            })
            .max_by_key(|name| name.split('_').count());
        if keyword_match.is_some() {
            return keyword_match;
        }

        self.names()
            .into_iter()
            .map(|name| (strsim::jaro_winkler(&as_name, name), name))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, name)| name)
    }
}
