#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use wayfind_engine::page::{ElementHandle, ElementState, Page, PageError};

/// One node of the fake DOM. Position in the page's list is document order.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub id: String,
    pub css: Vec<String>,
    pub xpath: Vec<String>,
    pub aria_label: Option<String>,
    pub text: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub hidden: bool,
    pub disabled: bool,
    pub appears_after: Option<Duration>,
}

impl FakeElement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn css(mut self, selector: &str) -> Self {
        self.css.push(selector.to_string());
        self
    }

    pub fn xpath(mut self, expression: &str) -> Self {
        self.xpath.push(expression.to_string());
        self
    }

    pub fn aria(mut self, label: &str) -> Self {
        self.aria_label = Some(label.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = Some(delay);
        self
    }
}

/// In-process DOM double. Handles are tied to a page load; `navigate` detaches them.
pub struct FakePage {
    url: Mutex<String>,
    elements: Mutex<Vec<FakeElement>>,
    generation: AtomicU64,
    loaded_at: Mutex<Instant>,
    closed: AtomicBool,
    clicks: Mutex<Vec<String>>,
    typed: Mutex<Vec<(String, String)>>,
    queries: AtomicU64,
    query_latency: Mutex<Duration>,
}

impl FakePage {
    pub fn new(url: &str, elements: Vec<FakeElement>) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            elements: Mutex::new(elements),
            generation: AtomicU64::new(0),
            loaded_at: Mutex::new(Instant::now()),
            closed: AtomicBool::new(false),
            clicks: Mutex::new(Vec::new()),
            typed: Mutex::new(Vec::new()),
            queries: AtomicU64::new(0),
            query_latency: Mutex::new(Duration::ZERO),
        }
    }

    /// Every `find_*` takes this long before answering, like a round trip to a browser.
    pub fn with_query_latency(self, latency: Duration) -> Self {
        *self.query_latency.lock().unwrap() = latency;
        self
    }

    /// Replace the document. Every handle from the previous load goes stale.
    pub fn navigate(&self, url: &str, elements: Vec<FakeElement>) {
        *self.url.lock().unwrap() = url.to_string();
        *self.elements.lock().unwrap() = elements;
        *self.loaded_at.lock().unwrap() = Instant::now();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn remove(&self, id: &str) {
        self.elements.lock().unwrap().retain(|e| e.id != id);
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.typed.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> Result<(), PageError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(PageError::Closed)
        } else {
            Ok(())
        }
    }

    fn handle(&self, element: &FakeElement) -> ElementHandle {
        ElementHandle::new(format!(
            "{}:{}",
            self.generation.load(Ordering::SeqCst),
            element.id
        ))
    }

    fn present(&self, element: &FakeElement) -> bool {
        match element.appears_after {
            Some(delay) => self.loaded_at.lock().unwrap().elapsed() >= delay,
            None => true,
        }
    }

    async fn select(
        &self,
        pred: impl Fn(&FakeElement) -> bool,
    ) -> Result<Vec<ElementHandle>, PageError> {
        let latency = *self.query_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.check_open()?;
        self.queries.fetch_add(1, Ordering::SeqCst);
        let elements = self.elements.lock().unwrap();
        Ok(elements
            .iter()
            .filter(|e| self.present(e) && pred(e))
            .map(|e| self.handle(e))
            .collect())
    }

    fn lookup(&self, handle: &ElementHandle) -> Result<FakeElement, PageError> {
        self.check_open()?;
        let detached = || PageError::Detached(handle.id.clone());
        let (generation, id) = handle.id.split_once(':').ok_or_else(detached)?;
        if generation != self.generation.load(Ordering::SeqCst).to_string() {
            return Err(detached());
        }
        self.elements
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(detached)
    }
}

#[async_trait]
impl Page for FakePage {
    async fn find_by_css(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        if selector.trim().is_empty() || selector.contains(">>>") {
            return Err(PageError::InvalidQuery(format!("bad selector: {}", selector)));
        }
        self.select(|e| e.css.iter().any(|s| s == selector)).await
    }

    async fn find_by_xpath(&self, expression: &str) -> Result<Vec<ElementHandle>, PageError> {
        let balanced = expression.matches('[').count() == expression.matches(']').count();
        if !(expression.starts_with('/') || expression.starts_with('(')) || !balanced {
            return Err(PageError::InvalidQuery(format!(
                "invalid xpath: {}",
                expression
            )));
        }
        self.select(|e| e.xpath.iter().any(|x| x == expression))
            .await
    }

    async fn find_by_accessible_name(
        &self,
        name: &str,
    ) -> Result<Vec<ElementHandle>, PageError> {
        self.select(|e| e.aria_label.as_deref().is_some_and(|l| l.contains(name)))
            .await
    }

    async fn find_by_text(&self, text: &str) -> Result<Vec<ElementHandle>, PageError> {
        self.select(|e| e.text.as_deref().is_some_and(|t| t.contains(text)))
            .await
    }

    async fn element_state(&self, element: &ElementHandle) -> Result<ElementState, PageError> {
        let found = self.lookup(element)?;
        Ok(ElementState {
            attached: true,
            visible: !found.hidden,
            enabled: !found.disabled,
        })
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        let found = self.lookup(element)?;
        self.clicks.lock().unwrap().push(found.id);
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), PageError> {
        let found = self.lookup(element)?;
        self.typed
            .lock()
            .unwrap()
            .push((found.id, text.to_string()));
        Ok(())
    }

    async fn text_content(&self, element: &ElementHandle) -> Result<Option<String>, PageError> {
        Ok(self.lookup(element)?.text)
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError> {
        Ok(self.lookup(element)?.attributes.get(name).cloned())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        self.check_open()?;
        Ok(self.url.lock().unwrap().clone())
    }

    async fn wait_for_settle(&self, _timeout: Duration) -> Result<(), PageError> {
        self.check_open()
    }
}

pub const GMAIL_CATALOG: &str = r##"{
    "click_gmail": {
        "primary_selector": "a.gb_X[href*='mail.google.com']",
        "timeout": 1000,
        "fallbacks": [
            {"method": "aria-label", "value": "Gmail"},
            {"method": "xpath", "value": "//a[contains(@href, 'mail.google.com')]"},
            {"method": "text-contains", "value": "Gmail"}
        ]
    },
    "accept_cookies": {
        "primary_selector": "#accept-cookies",
        "timeout": 500,
        "fallbacks": [
            {"method": "text-contains", "value": "Accept all"}
        ]
    },
    "search_box": {
        "primary_selector": "textarea[name='q']",
        "timeout": 1000,
        "action": "type",
        "fallbacks": []
    },
    "extract_bbc_article": {
        "primary_selector": "article",
        "timeout": 1000,
        "fallbacks": [
            {"method": "css-selector", "value": "main [data-component='text-block']"}
        ],
        "metadata_selectors": {
            "headline": "h1#main-heading",
            "summary": "article p b",
            "timestamp": "time@datetime",
            "author": "[data-testid='byline-name']"
        }
    },
    "broken_xpath_then_text": {
        "primary_selector": "xpath=//div[@class='x'",
        "timeout": 500,
        "fallbacks": [
            {"method": "text-contains", "value": "Sign in"}
        ]
    }
}"##;

pub fn gmail_catalog() -> wayfind_engine::catalog::IntentCatalog {
    wayfind_engine::catalog::CatalogLoader::from_json_str(GMAIL_CATALOG, 3000).unwrap()
}

pub fn bbc_article_page() -> Vec<FakeElement> {
    vec![
        FakeElement::new("headline")
            .css("h1#main-heading")
            .text("Storm  hits the\ncoast"),
        FakeElement::new("article")
            .css("article")
            .text("Storm hits the coast. Residents were told to stay indoors.")
            .attr("href", "/news/articles/c123"),
        FakeElement::new("summary")
            .css("article p b")
            .text("Residents were told to stay indoors."),
        FakeElement::new("time")
            .css("time")
            .attr("datetime", "2024-05-01T10:00:00Z")
            .text("1 May"),
    ]
}
