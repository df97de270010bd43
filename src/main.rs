// src/main.rs

// Modules defined in the crate
mod algebras;
mod api;
mod config;
mod constants;
mod error;
mod error_recovery;
mod formatting;
mod model;
mod orchestrator;
mod output;
mod pipeline;
mod types;

// Specific imports
use crate::api::{LibraryCache, SourceHttpClient, StoreHttpClient, SyncState};
use crate::config::{CommandLineInput, SyncConfig};
use crate::error::AppError;
use crate::model::{CatalogItem, SyncEvent, SyncReport};
use crate::orchestrator::SyncOrchestrator;
use crate::pipeline::{ExportComposer, ExportDelivery, LibrarySync};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use output::{csv_target, deliver, DeliveryTarget, OutputPlan, OutputReport};
use std::fs;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("unearthed_sync.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // stdout may carry the CSV in pipe mode, so the console log goes to stderr.
    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Executes the three-stage pipeline: sync → compose export → deliver.
async fn execute_pipeline(config: &SyncConfig) -> Result<(), AppError> {
    let cache = LibraryCache::new();
    let mut state = if config.no_cache {
        SyncState::default()
    } else {
        cache.load().await
    };

    let today = chrono::Local::now().date_naive();
    if config.daily && state.synced_on(today) {
        log::info!("Last sync was on {}, skipping", today);
        eprintln!("Already synced today.");
        return Ok(());
    }
    state.mark_synced(today);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(print_events(events_rx, config.pipe));

    let pipeline = HighlightSync::new(config, &state, events_tx)?;
    let result = pipeline.sync().await;
    // Dropping the pipeline closes the event channel and ends the printer.
    let (catalog, secret) = pipeline.finish();
    let _ = progress.await;
    let report = result?;

    let selected = catalog.select(&config.filter);
    state.catalog = catalog;
    if secret.is_some() {
        state.secret = secret;
    }
    if !config.no_cache {
        cache.save(&state).await;
    }

    let exporter = CsvExport::new(config);
    if exporter.is_requested() {
        let export = exporter.compose(&selected);
        let delivered = exporter.deliver(export)?;
        exporter.report_delivery(&delivered);
    }

    report_completion(config, &report);
    Ok(())
}

/// Prints progress events as they arrive.
async fn print_events(mut events: mpsc::UnboundedReceiver<SyncEvent>, to_stderr: bool) {
    while let Some(event) = events.recv().await {
        // The final tally is printed by `report_completion`.
        if matches!(event, SyncEvent::Finished { .. }) {
            continue;
        }
        if to_stderr {
            eprintln!("{}", event);
        } else {
            println!("{}", event);
        }
    }
}

fn report_completion(config: &SyncConfig, report: &SyncReport) {
    for failed in report.failed() {
        log::warn!("'{}' failed: {}", failed.item.title, failed.reason);
    }
    if config.pipe {
        eprintln!("{}", report.summary());
    } else {
        println!("{}", report.summary());
    }
}

/// Wires the HTTP clients into an orchestrator for one run.
struct HighlightSync<'a> {
    config: &'a SyncConfig,
    orchestrator: SyncOrchestrator,
    store: Option<Arc<StoreHttpClient>>,
}

impl<'a> HighlightSync<'a> {
    fn new(
        config: &'a SyncConfig,
        state: &SyncState,
        events: mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<Self, AppError> {
        let timeout = config.scrape_policy.request_timeout;
        let source = Arc::new(SourceHttpClient::new(
            &config.cookie,
            config.source_url.clone(),
            timeout,
        )?);

        let (orchestrator, store) = match &config.store {
            Some(store_config) => {
                // A secret passed explicitly wins over the cached one.
                let secret = store_config.secret.clone().or_else(|| state.secret.clone());
                let store = Arc::new(StoreHttpClient::new(
                    store_config.api_key.clone(),
                    store_config.base_url.clone(),
                    secret,
                    timeout,
                )?);
                (SyncOrchestrator::new(source, store.clone()), Some(store))
            }
            None => {
                log::info!("Upload disabled, scraping only");
                (SyncOrchestrator::scrape_only(source), None)
            }
        };

        let orchestrator = orchestrator
            .with_scrape_policy(config.scrape_policy.clone())
            .with_catalog(state.catalog.clone())
            .with_events(events);

        Ok(Self {
            config,
            orchestrator,
            store,
        })
    }

    /// Ends the run, returning the working set and the store secret in use.
    fn finish(self) -> (model::Catalog, Option<types::StoreSecret>) {
        let secret = self.store.as_ref().and_then(|store| store.secret());
        (self.orchestrator.catalog(), secret)
    }
}

#[async_trait::async_trait]
impl LibrarySync for HighlightSync<'_> {
    async fn sync(&self) -> Result<SyncReport, AppError> {
        if let Some(store) = &self.store {
            // Fail fast on bad credentials before spending time scraping.
            store.ensure_connected().await?;
        }
        self.orchestrator.run(&self.config.filter).await
    }
}

/// CSV export of the synced books to a file and/or stdout.
struct CsvExport<'a> {
    config: &'a SyncConfig,
}

impl<'a> CsvExport<'a> {
    fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    fn is_requested(&self) -> bool {
        self.config.pipe || self.config.csv_path.is_some()
    }

    fn report_delivery(&self, report: &OutputReport) {
        for completed in &report.completed {
            if let DeliveryTarget::WriteFile { path, .. } = &completed.operation {
                eprintln!("✓ CSV saved to {}", path.display());
            }
        }
    }
}

impl ExportComposer for CsvExport<'_> {
    fn compose(&self, items: &[CatalogItem]) -> String {
        formatting::render_csv(items)
    }
}

impl ExportDelivery for CsvExport<'_> {
    fn deliver(&self, export: String) -> Result<OutputReport, AppError> {
        let mut plan = OutputPlan::new();
        if let Some(path) = &self.config.csv_path {
            plan = plan.with_operation(DeliveryTarget::WriteFile {
                path: csv_target(path),
                content: export.clone(),
            });
        }
        if self.config.pipe {
            plan = plan.with_operation(DeliveryTarget::PrintToStdout { content: export });
        }

        let report = deliver(plan);
        if !report.is_success() {
            return Err(AppError::DeliveryFailed {
                failures: report.failed.iter().map(|f| f.error.clone()).collect(),
            });
        }
        Ok(report)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = SyncConfig::resolve(cli)?;

    execute_pipeline(&config).await?;

    Ok(())
}
