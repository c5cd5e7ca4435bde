use crate::inject::{call, classify};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::Instant;
use wayfind_engine::page::{ElementHandle, ElementState, Page, PageError};

const READY_POLL: Duration = Duration::from_millis(50);

/// Give a click-triggered navigation time to start before reading `readyState`.
const NAVIGATION_GRACE: Duration = Duration::from_millis(100);

/// A live Chromium tab driven over CDP.
#[derive(Clone)]
pub struct ChromiumPage {
    page: chromiumoxide::Page,
}

#[derive(Deserialize)]
struct StateReply {
    attached: bool,
    visible: bool,
    enabled: bool,
}

impl ChromiumPage {
    pub fn new(page: chromiumoxide::Page) -> Self {
        Self { page }
    }

    async fn find(&self, method: &str, pattern: &str) -> Result<Vec<ElementHandle>, PageError> {
        let value = call(&self.page, method, &[json!(pattern)]).await?;
        let ids: Vec<String> = serde_json::from_value(value)
            .map_err(|e| PageError::Protocol(format!("Unexpected {} reply: {}", method, e)))?;
        Ok(ids.into_iter().map(ElementHandle::new).collect())
    }

    async fn optional_string(
        &self,
        method: &str,
        args: &[Value],
    ) -> Result<Option<String>, PageError> {
        match call(&self.page, method, args).await? {
            Value::String(s) => Ok(Some(s)),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl Page for ChromiumPage {
    async fn find_by_css(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        self.find("css", selector).await
    }

    async fn find_by_xpath(&self, expression: &str) -> Result<Vec<ElementHandle>, PageError> {
        self.find("xpath", expression).await
    }

    async fn find_by_accessible_name(
        &self,
        name: &str,
    ) -> Result<Vec<ElementHandle>, PageError> {
        self.find("name", name).await
    }

    async fn find_by_text(&self, text: &str) -> Result<Vec<ElementHandle>, PageError> {
        self.find("text", text).await
    }

    async fn element_state(&self, element: &ElementHandle) -> Result<ElementState, PageError> {
        let value = call(&self.page, "state", &[json!(element.id)]).await?;
        let state: StateReply = serde_json::from_value(value)
            .map_err(|e| PageError::Protocol(format!("Unexpected state reply: {}", e)))?;
        Ok(ElementState {
            attached: state.attached,
            visible: state.visible,
            enabled: state.enabled,
        })
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        call(&self.page, "click", &[json!(element.id)]).await?;
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), PageError> {
        call(&self.page, "type", &[json!(element.id), json!(text)]).await?;
        Ok(())
    }

    async fn text_content(&self, element: &ElementHandle) -> Result<Option<String>, PageError> {
        self.optional_string("content", &[json!(element.id)]).await
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError> {
        self.optional_string("attribute", &[json!(element.id), json!(name)])
            .await
    }

    async fn current_url(&self) -> Result<String, PageError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| classify(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    /// Poll `document.readyState` until the new document (if any) has loaded.
    async fn wait_for_settle(&self, timeout: Duration) -> Result<(), PageError> {
        let deadline = Instant::now() + timeout;
        tokio::time::sleep(NAVIGATION_GRACE.min(timeout)).await;
        loop {
            let ready = match self.page.evaluate("document.readyState").await {
                Ok(result) => result.into_value::<String>().ok(),
                Err(e) => {
                    let err = classify(e.to_string());
                    if err == PageError::Closed {
                        return Err(err);
                    }
                    None
                }
            };
            if ready.as_deref() == Some("complete") || Instant::now() >= deadline {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL.min(deadline - Instant::now())).await;
        }
    }
}
