//! The page automation capability the core depends on.
//!
//! Browser launch, navigation and script plumbing live behind this trait; the
//! engine only ever queries, inspects and acts on opaque element handles.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    /// The query pattern itself is malformed (bad selector or expression).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The element is no longer attached to the current document.
    #[error("Element detached from page: {0}")]
    Detached(String),

    /// The page or browser is gone.
    #[error("Page closed")]
    Closed,

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Opaque reference to an element on the current page load.
///
/// Only valid while the page that produced it has not navigated away.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    pub id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementState {
    pub attached: bool,
    pub visible: bool,
    pub enabled: bool,
}

impl ElementState {
    /// Present, visible and not disabled.
    pub fn is_actionable(&self) -> bool {
        self.attached && self.visible && self.enabled
    }
}

/// Query and interaction surface of one live page.
///
/// Every `find_*` returns matches in document order.
#[async_trait]
pub trait Page: Send + Sync {
    async fn find_by_css(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError>;

    async fn find_by_xpath(&self, expression: &str) -> Result<Vec<ElementHandle>, PageError>;

    /// Elements whose accessible name equals or contains `name`.
    async fn find_by_accessible_name(&self, name: &str)
    -> Result<Vec<ElementHandle>, PageError>;

    /// Innermost visible text-bearing elements containing `text` (case-sensitive).
    async fn find_by_text(&self, text: &str) -> Result<Vec<ElementHandle>, PageError>;

    async fn element_state(&self, element: &ElementHandle) -> Result<ElementState, PageError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError>;

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), PageError>;

    async fn text_content(&self, element: &ElementHandle) -> Result<Option<String>, PageError>;

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError>;

    async fn current_url(&self) -> Result<String, PageError>;

    /// Wait for pending navigation or DOM mutation to quiet down, up to `timeout`.
    async fn wait_for_settle(&self, timeout: Duration) -> Result<(), PageError> {
        tokio::time::sleep(timeout).await;
        Ok(())
    }
}

/// A session's exclusive handle on one page, plus its abort signal.
#[derive(Clone)]
pub struct PageHandle {
    page: Arc<dyn Page>,
    cancel: CancellationToken,
}

impl PageHandle {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            page,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(page: Arc<dyn Page>, cancel: CancellationToken) -> Self {
        Self { page, cancel }
    }

    pub fn page(&self) -> &dyn Page {
        self.page.as_ref()
    }

    /// Abort the session. In-flight waits resolve as cancelled.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHandle")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// Host part of a page URL, used as the memory partition key.
pub fn domain_host(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url)
        .or_else(|_| url::Url::parse(&format!("https://{}", url)))
        .ok()?;
    parsed.host_str().map(|h| h.to_ascii_lowercase())
}
