//! Action Executor: performs the intent's action on the resolved element.

pub mod extract;

use crate::page::{ElementHandle, PageError, PageHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use wayfind_common::catalog::{ActionKind, IntentDefinition};
use wayfind_common::protocol::{ActionOutcomeRecord, ExtractedRecord};

pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Caller-supplied input for actions that need it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInput {
    pub text: Option<String>,
}

impl ActionInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Clicked,
    Typed { chars: usize },
    Extracted(ExtractedRecord),
}

impl ActionResult {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionResult::Clicked => ActionKind::Click,
            ActionResult::Typed { .. } => ActionKind::Type,
            ActionResult::Extracted(_) => ActionKind::Extract,
        }
    }

    pub fn to_record(&self) -> ActionOutcomeRecord {
        ActionOutcomeRecord::Completed {
            kind: self.kind(),
            data: match self {
                ActionResult::Extracted(record) => Some(record.clone()),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The page navigated (or the node was removed) between resolution and execution.
    #[error("Stale element: {0}")]
    StaleElement(String),

    #[error("Action '{0}' requires input text")]
    MissingInput(ActionKind),

    #[error("Action cancelled: session aborted")]
    Cancelled,

    #[error("Page error during action: {0}")]
    Page(PageError),
}

impl From<PageError> for ActionError {
    fn from(e: PageError) -> Self {
        match e {
            PageError::Detached(reason) => ActionError::StaleElement(reason),
            PageError::Closed => ActionError::Cancelled,
            other => ActionError::Page(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionExecutor {
    settle: Duration,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

impl ActionExecutor {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    pub async fn execute(
        &self,
        kind: ActionKind,
        element: &ElementHandle,
        intent: &IntentDefinition,
        handle: &PageHandle,
        input: &ActionInput,
    ) -> Result<ActionResult, ActionError> {
        if handle.is_aborted() {
            return Err(ActionError::Cancelled);
        }
        let page = handle.page();

        // Never retried: a stale handle is the caller's to re-resolve.
        let state = page.element_state(element).await?;
        if !state.attached {
            return Err(ActionError::StaleElement(format!(
                "{} no longer attached",
                element
            )));
        }

        match kind {
            ActionKind::Click => {
                page.click(element).await?;
                debug!("Clicked {} for {}, settling", element, intent.name);
                tokio::select! {
                    _ = handle.cancellation().cancelled() => return Err(ActionError::Cancelled),
                    settled = page.wait_for_settle(self.settle) => settled?,
                }
                info!("Clicked {}", intent.name);
                Ok(ActionResult::Clicked)
            }
            ActionKind::Type => {
                let text = input
                    .text
                    .as_deref()
                    .ok_or(ActionError::MissingInput(ActionKind::Type))?;
                page.type_text(element, text).await?;
                info!("Typed {} chars into {}", text.chars().count(), intent.name);
                Ok(ActionResult::Typed {
                    chars: text.chars().count(),
                })
            }
            ActionKind::Extract => {
                let record = extract::extract(page, element, intent).await?;
                info!(
                    "Extracted {} words and {} metadata fields for {}",
                    record.word_count,
                    record.metadata.len(),
                    intent.name
                );
                Ok(ActionResult::Extracted(record))
            }
        }
    }
}
