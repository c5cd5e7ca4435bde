use crate::page::{ElementHandle, Page, PageError};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;
use wayfind_common::catalog::{IntentDefinition, MetadataSelector};
use wayfind_common::protocol::ExtractedRecord;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// Share widgets and related-topic rails that leak into article bodies.
static ARTIFACT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)Share this with.*?Copy this link").unwrap(),
        Regex::new(r"(?i)Read more.*?Related Topics").unwrap(),
    ]
});

const LINK_ATTRIBUTES: [&str; 2] = ["href", "src"];

/// Collapse whitespace and drop known boilerplate. Empty text becomes `None`.
pub fn clean_text(raw: &str) -> Option<String> {
    let mut text = WHITESPACE_RE.replace_all(raw, " ").into_owned();
    for re in ARTIFACT_RES.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    let text = WHITESPACE_RE.replace_all(text.trim(), " ").into_owned();
    (!text.is_empty()).then_some(text)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Resolve `raw` against the page URL; values that cannot be resolved are kept as-is.
pub fn absolutize(base: &str, raw: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(raw)) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

pub(crate) async fn extract(
    page: &dyn Page,
    element: &ElementHandle,
    intent: &IntentDefinition,
) -> Result<ExtractedRecord, PageError> {
    let url = page.current_url().await?;
    let text = page
        .text_content(element)
        .await?
        .as_deref()
        .and_then(clean_text);

    let mut links = BTreeMap::new();
    for name in LINK_ATTRIBUTES {
        if let Some(value) = page.attribute(element, name).await? {
            if !value.trim().is_empty() {
                links.insert(name.to_string(), absolutize(&url, value.trim()));
            }
        }
    }

    let mut metadata = BTreeMap::new();
    for (field, selector) in &intent.metadata_selectors {
        let value = metadata_field(page, selector).await?;
        if value.is_none() {
            debug!("Metadata field {} ({}) matched nothing", field, selector);
        }
        metadata.insert(field.clone(), value);
    }

    Ok(ExtractedRecord {
        word_count: text.as_deref().map(word_count).unwrap_or(0),
        url,
        text,
        links,
        metadata,
    })
}

/// First match of a page-level sub-selector. Misses and query failures are `None`;
/// only a closed page propagates.
async fn metadata_field(
    page: &dyn Page,
    selector: &MetadataSelector,
) -> Result<Option<String>, PageError> {
    let pattern = selector.selector.as_str();
    let found = if pattern.starts_with("//") || pattern.starts_with("(//") {
        page.find_by_xpath(pattern).await
    } else {
        page.find_by_css(pattern).await
    };

    let first = match found {
        Ok(elements) => match elements.into_iter().next() {
            Some(element) => element,
            None => return Ok(None),
        },
        Err(PageError::Closed) => return Err(PageError::Closed),
        Err(e) => {
            debug!("Metadata query {} failed: {}", selector, e);
            return Ok(None);
        }
    };

    let raw = match &selector.attribute {
        Some(name) => match page.attribute(&first, name).await {
            Ok(None) => page.text_content(&first).await,
            other => other,
        },
        None => page.text_content(&first).await,
    };
    match raw {
        Ok(value) => Ok(value.as_deref().and_then(clean_text)),
        Err(PageError::Closed) => Err(PageError::Closed),
        Err(e) => {
            debug!("Reading metadata {} failed: {}", selector, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(
            clean_text("  Storm   hits\n\tcoast  ").as_deref(),
            Some("Storm hits coast")
        );
        assert_eq!(
            clean_text("Lead. Share this with Email Facebook Copy this link Body.").as_deref(),
            Some("Lead. Body.")
        );
        assert_eq!(clean_text(" \n "), None);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("one two  three"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://www.bbc.co.uk/news/world", "/news/articles/abc"),
            "https://www.bbc.co.uk/news/articles/abc"
        );
        assert_eq!(
            absolutize("https://a.com/x", "https://b.com/y"),
            "https://b.com/y"
        );
        assert_eq!(absolutize("not a url", "/rel"), "/rel");
    }
}
