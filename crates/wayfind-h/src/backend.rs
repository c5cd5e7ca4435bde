use crate::cdp::CdpClient;
use crate::page::ChromiumPage;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use wayfind_engine::page::PageHandle;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser not launched")]
    NotReady,
    #[error("Browser launch failed: {0}")]
    Launch(String),
    #[error("Browser profile error: {0}")]
    Profile(#[from] std::io::Error),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Browser error: {0}")]
    Other(String),
}

/// One Chromium instance with a single tab.
pub struct HeadlessBrowser {
    client: Option<CdpClient>,
    visible: bool,
    user_data_dir: Option<PathBuf>,
}

impl HeadlessBrowser {
    pub fn new() -> Self {
        Self::with_options(false, None)
    }

    pub fn with_options(visible: bool, user_data_dir: Option<PathBuf>) -> Self {
        Self {
            client: None,
            visible,
            user_data_dir,
        }
    }

    pub async fn launch(&mut self) -> Result<(), BrowserError> {
        let client = CdpClient::launch(self.visible, self.user_data_dir.clone()).await?;
        self.client = Some(client);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    /// Load `url` and return the final URL after redirects.
    pub async fn navigate(&mut self, url: &str) -> Result<String, BrowserError> {
        let client = self.client.as_mut().ok_or(BrowserError::NotReady)?;

        info!("Navigating to: {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        let landed = client
            .page
            .url()
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?
            .unwrap_or_else(|| url.to_string());
        Ok(landed)
    }

    /// A fresh session handle on the current tab.
    pub fn page_handle(&self) -> Result<PageHandle, BrowserError> {
        let client = self.client.as_ref().ok_or(BrowserError::NotReady)?;
        Ok(PageHandle::new(Arc::new(ChromiumPage::new(
            client.page.clone(),
        ))))
    }

    pub async fn close(&mut self) -> Result<(), BrowserError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }
}

impl Default for HeadlessBrowser {
    fn default() -> Self {
        Self::new()
    }
}
