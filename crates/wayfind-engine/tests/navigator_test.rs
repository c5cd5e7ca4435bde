mod common;

use common::{FakeElement, FakePage, GMAIL_CATALOG, bbc_article_page, gmail_catalog};
use std::sync::Arc;
use wayfind_engine::action::{ActionInput, ActionResult};
use wayfind_engine::config::WayfindConfig;
use wayfind_engine::decision_log::{MemorySink, read_entries};
use wayfind_engine::memory::{AdaptiveMemory, StrategyStats};
use wayfind_engine::navigator::Navigator;
use wayfind_engine::page::PageHandle;
use wayfind_engine::protocol::{ActionOutcomeRecord, AttemptResult};
use wayfind_engine::resolution::ResolveError;
use wayfind_engine::strategy::StrategyDescriptor;

fn navigator() -> (Navigator, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let navigator = Navigator::from_parts(
        Arc::new(gmail_catalog()),
        Arc::new(AdaptiveMemory::in_memory()),
        Arc::new(StrategyStats::in_memory()),
        sink.clone(),
    );
    (navigator, sink)
}

#[tokio::test(start_paused = true)]
async fn test_run_dismisses_cookie_banner_then_clicks() {
    let (navigator, sink) = navigator();
    let page = Arc::new(FakePage::new(
        "https://www.google.com/?hl=en",
        vec![
            FakeElement::new("consent").css("#accept-cookies"),
            FakeElement::new("gmail").aria("Gmail"),
        ],
    ));
    let handle = PageHandle::new(page.clone());

    let report = navigator
        .run("click_gmail", &handle, &ActionInput::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.domain, "www.google.com");
    assert_eq!(report.dismissed(), vec!["accept_cookies"]);
    assert_eq!(report.result, Some(ActionResult::Clicked));
    assert_eq!(page.clicks(), vec!["consent", "gmail"]);

    // The banner rides along in the run's single entry.
    let entries = sink.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].intent, "click_gmail");
    assert_eq!(
        entries[0].strategy_used,
        Some(StrategyDescriptor::aria_label("Gmail").id())
    );
    assert_eq!(entries[0].attempts.len(), 2);

    let banner = &entries[0].interstitials;
    assert_eq!(banner.len(), 1);
    assert_eq!(banner[0].intent, "accept_cookies");
    assert_eq!(banner[0].attempts.len(), 1);
    assert_eq!(banner[0].attempts[0].result, AttemptResult::Matched);
    assert!(banner[0].action.is_success());

    let remembered = navigator
        .memory()
        .get_hint("www.google.com", "accept_cookies")
        .await
        .unwrap();
    assert_eq!(remembered, Some(StrategyDescriptor::css("#accept-cookies").id()));
}

#[tokio::test(start_paused = true)]
async fn test_missing_interstitials_do_not_block() {
    let (navigator, sink) = navigator();
    let handle = PageHandle::new(Arc::new(FakePage::new(
        "https://www.google.com/",
        vec![FakeElement::new("gmail").text("Gmail")],
    )));

    let report = navigator
        .run("click_gmail", &handle, &ActionInput::default())
        .await
        .unwrap();
    assert!(report.is_success());
    assert!(report.dismissed().is_empty());

    // The banner was looked for and not found; that search is still on record.
    let entries = sink.entries().await;
    assert_eq!(entries.len(), 1);
    let banner = &entries[0].interstitials;
    assert_eq!(banner.len(), 1);
    assert_eq!(banner[0].intent, "accept_cookies");
    assert_eq!(banner[0].attempts.len(), 2);
    assert!(
        banner[0]
            .attempts
            .iter()
            .all(|a| a.result == AttemptResult::NoMatch)
    );
    assert!(!banner[0].action.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_run_is_logged_with_full_attempts() {
    let (navigator, sink) = navigator();
    let handle = PageHandle::new(Arc::new(FakePage::new("https://www.google.com/", vec![])));

    let report = navigator
        .run("click_gmail", &handle, &ActionInput::default())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert!(matches!(
        report.resolution,
        Err(ResolveError::AllStrategiesExhausted { .. })
    ));
    assert!(matches!(report.action, ActionOutcomeRecord::NotAttempted { .. }));

    let entries = sink.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].attempts.len(), 4);
    assert_eq!(entries[0].strategy_used, None);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_intent_is_logged() {
    let (navigator, sink) = navigator();
    let handle = PageHandle::new(Arc::new(FakePage::new("https://www.google.com/", vec![])));

    let report = navigator
        .run("open_calendar", &handle, &ActionInput::default())
        .await
        .unwrap();
    assert!(matches!(
        report.resolution,
        Err(ResolveError::UnknownIntent { .. })
    ));
    let entries = sink.entries().await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].attempts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_extraction_report_carries_null_author() {
    let (navigator, _sink) = navigator();
    let handle = PageHandle::new(Arc::new(FakePage::new(
        "https://www.bbc.co.uk/news/world-123",
        bbc_article_page(),
    )));

    let report = navigator
        .run("extract_bbc_article", &handle, &ActionInput::default())
        .await
        .unwrap();
    let ActionOutcomeRecord::Completed {
        data: Some(record), ..
    } = &report.action
    else {
        panic!("expected completed extraction, got {:?}", report.action);
    };
    assert_eq!(record.metadata["author"], None);
    assert!(record.metadata["headline"].is_some());
}

#[tokio::test(start_paused = true)]
async fn test_action_failure_is_reported_not_raised() {
    let (navigator, sink) = navigator();
    let handle = PageHandle::new(Arc::new(FakePage::new(
        "https://www.google.com/",
        vec![FakeElement::new("q").css("textarea[name='q']")],
    )));

    let report = navigator
        .run("search_box", &handle, &ActionInput::default())
        .await
        .unwrap();
    assert!(report.resolution.is_ok());
    assert!(matches!(report.action, ActionOutcomeRecord::Failed { .. }));
    assert!(!sink.entries().await[0].action.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_closed_page_still_logs_one_entry() {
    let (navigator, sink) = navigator();
    let page = Arc::new(FakePage::new("https://www.google.com/", vec![]));
    page.close();
    let handle = PageHandle::new(page);

    assert!(
        navigator
            .run("click_gmail", &handle, &ActionInput::default())
            .await
            .is_err()
    );
    assert_eq!(sink.entries().await.len(), 1);
}

#[tokio::test]
async fn test_open_and_close_persist_state() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("intents.json");
    std::fs::write(&catalog_path, GMAIL_CATALOG).unwrap();

    let mut config = WayfindConfig::default();
    config.catalog_path = catalog_path;
    config.memory_path = dir.path().join("state").join("memory.json");
    config.stats_path = dir.path().join("state").join("strategy_stats.json");
    config.log_dir = dir.path().join("logs");
    config.interstitials.enabled = false;

    let navigator = Navigator::open(&config).await.unwrap();
    assert_eq!(navigator.catalog().len(), 5);

    let handle = PageHandle::new(Arc::new(FakePage::new(
        "https://www.google.com/",
        vec![FakeElement::new("gmail").css("a.gb_X[href*='mail.google.com']")],
    )));
    let report = navigator
        .run("click_gmail", &handle, &ActionInput::default())
        .await
        .unwrap();
    assert!(report.is_success());
    assert!(report.logged);
    navigator.close().await.unwrap();

    let entries = read_entries(&config.log_dir.join("decisions.jsonl"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);

    let reopened = Navigator::open(&config).await.unwrap();
    assert_eq!(
        reopened
            .memory()
            .get_hint("www.google.com", "click_gmail")
            .await
            .unwrap(),
        Some(StrategyDescriptor::css("a.gb_X[href*='mail.google.com']").id())
    );
    assert_eq!(
        reopened.stats().domain_summary("www.google.com").await["click_gmail"].total_attempts,
        1
    );
}
