use crate::backend::BrowserError;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::handler::Handler;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Chromium profile directory and whether it is ours to delete.
struct Profile {
    dir: PathBuf,
    throwaway: bool,
}

impl Profile {
    /// Explicit dir, then `WAYFIND_USER_DATA_DIR`, then a throwaway dir removed on close.
    fn resolve(explicit: Option<PathBuf>) -> Result<Self, BrowserError> {
        let configured =
            explicit.or_else(|| std::env::var_os("WAYFIND_USER_DATA_DIR").map(PathBuf::from));
        let profile = match configured {
            Some(dir) => Self {
                dir,
                throwaway: false,
            },
            None => {
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or_default();
                let name = format!("wayfind-profile-{}-{}", std::process::id(), nanos);
                Self {
                    dir: std::env::temp_dir().join(name),
                    throwaway: true,
                }
            }
        };
        std::fs::create_dir_all(&profile.dir)?;
        info!("Chromium profile: {}", profile.dir.display());
        Ok(profile)
    }

    fn remove(&self) {
        if !self.throwaway {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            debug!("Could not remove profile {}: {}", self.dir.display(), e);
        }
    }
}

/// A launched Chromium with one tab and the task pumping its CDP events.
pub struct CdpClient {
    browser: Browser,
    events: JoinHandle<()>,
    pub page: Page,
    profile: Profile,
}

impl CdpClient {
    pub async fn launch(
        visible: bool,
        user_data_dir: Option<PathBuf>,
    ) -> Result<Self, BrowserError> {
        let profile = Profile::resolve(user_data_dir)?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&profile.dir);
        if visible {
            builder = builder.with_head();
        }
        if let Ok(bin) = std::env::var("CHROME_BIN") {
            info!("Using Chrome binary {}", bin);
            builder = builder.chrome_executable(bin);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        info!("Starting Chromium (visible: {})", visible);
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        let events = tokio::spawn(pump_events(handler));

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            events,
            page,
            profile,
        })
    }

    pub async fn close(mut self) -> Result<(), BrowserError> {
        let closed = self
            .browser
            .close()
            .await
            .map_err(|e| BrowserError::Other(e.to_string()));
        if let Err(e) = self.events.await {
            debug!("CDP event task ended abnormally: {}", e);
        }
        self.profile.remove();
        closed.map(|_| ())
    }
}

async fn pump_events(mut handler: Handler) {
    while let Some(event) = handler.next().await {
        if let Err(e) = event {
            debug!("CDP handler error: {}", e);
        }
    }
    debug!("CDP event stream closed");
}

/// An open alert or confirm blocks script evaluation, so every dialog is accepted.
async fn accept_dialogs(page: &Page) -> Result<(), BrowserError> {
    let mut dialogs = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| BrowserError::Launch(e.to_string()))?;
    let page = page.clone();
    tokio::spawn(async move {
        while let Some(dialog) = dialogs.next().await {
            info!("Accepting {:?} dialog: {}", dialog.r#type, dialog.message);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                warn!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_profile_is_kept() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("profile");

        let profile = Profile::resolve(Some(dir.clone())).unwrap();
        assert!(!profile.throwaway);
        assert!(dir.is_dir());

        profile.remove();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_unusable_profile_dir_is_browser_error() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();

        let err = Profile::resolve(Some(file.join("profile"))).err().unwrap();
        assert!(matches!(err, BrowserError::Profile(_)));
    }
}
