mod report;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wayfind_engine::action::ActionInput;
use wayfind_engine::catalog::CatalogLoader;
use wayfind_engine::config::{ConfigLoader, WayfindConfig};
use wayfind_engine::formatter;
use wayfind_engine::memory::{AdaptiveMemory, DocumentStore, StrategyStats};
use wayfind_engine::navigator::Navigator;
use wayfind_h::HeadlessBrowser;

#[derive(Parser)]
#[command(name = "wayfind", version, about = "Resolve browser intents with adaptive selectors")]
struct Args {
    /// Config file (defaults: ./wayfind.yaml, then ~/.wayfind/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open a page and perform an intent on it, e.g. `wayfind run click gmail --url google.com`
    Run {
        /// Free-text request mapped to an intent name
        words: Vec<String>,
        #[arg(long)]
        url: String,
        /// Intent name, bypassing the free-text mapping
        #[arg(long)]
        intent: Option<String>,
        /// Input for `type` intents
        #[arg(long)]
        text: Option<String>,
        /// Launch browser in visible mode (not headless)
        #[arg(long)]
        visible: bool,
    },
    /// List catalog intents and their resolution plans
    Intents,
    /// Show remembered strategies
    Memory {
        #[arg(long)]
        domain: Option<String>,
    },
    /// Show strategy statistics for a domain
    Stats {
        #[arg(long)]
        domain: String,
        /// Strategies shown per intent
        #[arg(long, default_value_t = 3)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wayfind=info")),
        )
        .init();

    let args = Args::parse();
    let config = ConfigLoader::load(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    match args.command {
        Command::Run {
            words,
            url,
            intent,
            text,
            visible,
        } => {
            run(
                &config,
                RunRequest {
                    words,
                    url,
                    intent,
                    input: ActionInput { text },
                    visible: visible || config.browser.visible,
                },
            )
            .await
        }
        Command::Intents => list_intents(&config),
        Command::Memory { domain } => show_memory(&config, domain.as_deref()).await,
        Command::Stats { domain, top } => show_stats(&config, &domain, top).await,
    }
}

struct RunRequest {
    words: Vec<String>,
    url: String,
    intent: Option<String>,
    input: ActionInput,
    visible: bool,
}

async fn run(config: &WayfindConfig, request: RunRequest) -> anyhow::Result<()> {
    let navigator = Navigator::open(config).await?;

    let intent = match request.intent {
        Some(name) => name,
        None => {
            let description = request.words.join(" ");
            match navigator.catalog().match_description(&description) {
                Some(name) => name.to_string(),
                None => bail!(
                    "No intent matches '{}'. Known intents: {}",
                    description,
                    navigator.catalog().names().join(", ")
                ),
            }
        }
    };
    let url = if request.url.contains("://") {
        request.url
    } else {
        format!("https://{}", request.url)
    };

    let mut browser =
        HeadlessBrowser::with_options(request.visible, config.browser.user_data_dir.clone());
    browser.launch().await?;
    let landed = browser.navigate(&url).await?;
    info!("Loaded {}", landed);

    let handle = browser.page_handle()?;
    let aborter = handle.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, aborting session");
            aborter.abort();
        }
    });

    let outcome = navigator.run(&intent, &handle, &request.input).await;
    ctrl_c.abort();

    navigator.close().await?;
    browser.close().await?;

    let report = outcome?;
    print!("{}", report::render(&report));
    if !report.is_success() {
        bail!("{} did not complete", report.intent);
    }
    Ok(())
}

fn list_intents(config: &WayfindConfig) -> anyhow::Result<()> {
    let catalog =
        CatalogLoader::load_path(&config.catalog_path, config.engine.default_timeout_ms)?;
    for name in catalog.names() {
        if let Some(intent) = catalog.get(name) {
            print!("{}", formatter::format_intent(intent));
        }
    }
    Ok(())
}

async fn show_memory(config: &WayfindConfig, domain: Option<&str>) -> anyhow::Result<()> {
    let store = DocumentStore::open(&config.memory_path).await?;
    let memory = AdaptiveMemory::new(Arc::new(store));
    let entries = memory.entries().await?;
    let mut shown = 0;
    for (key, record) in entries {
        if domain.is_some_and(|d| d != key.domain) {
            continue;
        }
        println!("{}", key);
        println!("{}", serde_json::to_string_pretty(&record)?);
        shown += 1;
    }
    if shown == 0 {
        println!("No memory records");
    }
    Ok(())
}

async fn show_stats(config: &WayfindConfig, domain: &str, top: usize) -> anyhow::Result<()> {
    let stats = StrategyStats::open(&config.stats_path).await?;
    let summary = stats.domain_summary(domain).await;
    if summary.is_empty() {
        println!("No statistics for {}", domain);
        return Ok(());
    }
    for (intent, s) in &summary {
        println!(
            "{}: {:.0}% success over {} attempts, {} strategies",
            intent,
            s.success_rate * 100.0,
            s.total_attempts,
            s.strategies_tested
        );
        for (strategy, score) in stats.top(domain, intent, top).await {
            println!(
                "  {} rate={:.2} confidence={:.2} score={:.2}",
                strategy, score.success_rate, score.confidence, score.weighted_score
            );
        }
    }
    Ok(())
}
