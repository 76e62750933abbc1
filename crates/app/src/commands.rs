//! Subcommand handlers.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use probe_application::{
    CollectionRunner, FireOutcome, HistoryStore, InMemoryWorkspace, KeyValueStore,
    MonitorScheduler, MonitorStore, WorkspaceSnapshot,
};
use probe_domain::collection::Collection;
use probe_domain::environment::Environment;
use probe_domain::export::ExportFormat;
use probe_domain::monitor::Monitor;
use probe_domain::request::KeyValuePair;
use probe_domain::run::RunResult;
use probe_domain::validation::{ValidationError, has_validation_errors};
use probe_infrastructure::{
    FileKeyValueStore, ReqwestExecutor, ReqwestWebhookNotifier, SystemClock, export_collections,
    from_json, import_collections, parse_document, to_json_stable, validate_openapi,
};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::cli::ScopeArgs;
use crate::config::AppConfig;

/// Shared services built from the configuration.
pub struct Services {
    config: AppConfig,
    store: Arc<dyn KeyValueStore>,
}

impl Services {
    pub fn new(config: AppConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&config.data_dir));
        Self { config, store }
    }

    fn executor(&self) -> Result<ReqwestExecutor> {
        ReqwestExecutor::new(self.config.request_timeout_ms, &self.config.user_agent)
            .context("failed to build HTTP client")
    }

    fn runner(&self, executor: ReqwestExecutor) -> CollectionRunner {
        let history = HistoryStore::with_limit(Arc::clone(&self.store), self.config.history_limit);
        CollectionRunner::new(Arc::new(executor), Arc::new(SystemClock::new()))
            .with_history(Arc::new(history))
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path).await?;
    from_json(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

async fn write_or_print(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => tokio::fs::write(path, text)
            .await
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn print_findings(findings: &[ValidationError]) {
    for finding in findings {
        eprintln!("{}: {}: {}", finding.severity, finding.path, finding.message);
    }
}

pub async fn validate(file: &Path) -> Result<ExitCode> {
    let document = parse_document(&read_text(file).await?)?;
    let findings = validate_openapi(&document);
    print_findings(&findings);

    if has_validation_errors(&findings) {
        return Ok(ExitCode::FAILURE);
    }
    println!("{}: valid ({} warning(s))", file.display(), findings.len());
    Ok(ExitCode::SUCCESS)
}

pub async fn import(file: &Path, out: Option<&Path>) -> Result<ExitCode> {
    let outcome = match import_collections(&read_text(file).await?) {
        Ok(outcome) => outcome,
        Err(error) => {
            print_findings(error.findings());
            bail!(error);
        }
    };
    print_findings(&outcome.warnings);
    info!(
        format = %outcome.format,
        collections = outcome.collections.len(),
        "Imported {}",
        file.display()
    );

    write_or_print(out, &to_json_stable(&outcome.collections)?).await?;
    Ok(ExitCode::SUCCESS)
}

pub async fn export(file: &Path, format: ExportFormat, out: Option<&Path>) -> Result<ExitCode> {
    let collections: Vec<Collection> = read_json(file).await?;
    let text = export_collections(&collections, format)?;
    write_or_print(out, &text).await?;
    Ok(ExitCode::SUCCESS)
}

async fn load_scope(scope: &ScopeArgs) -> Result<(Vec<Environment>, Vec<KeyValuePair>)> {
    let environments = match &scope.environments {
        Some(path) => read_json(path).await?,
        None => Vec::new(),
    };
    let globals = match &scope.globals {
        Some(path) => read_json(path).await?,
        None => Vec::new(),
    };
    Ok((environments, globals))
}

fn print_run(run: &RunResult) {
    for result in &run.results {
        let outcome = if result.passed { "PASS" } else { "FAIL" };
        let detail = result
            .error
            .clone()
            .unwrap_or_else(|| format!("{} in {}ms", result.status_code, result.response_time_ms));
        println!(
            "{outcome} {} {} ({detail})",
            result.method, result.request_name
        );
        for failure in &result.failed_tests {
            println!("     - {failure}");
        }
    }
    println!(
        "{} request(s): {} passed, {} failed; min {}ms, avg {}ms, max {}ms",
        run.total_requests,
        run.passed_tests,
        run.failed_tests,
        run.min_response_time_ms,
        run.avg_response_time_ms,
        run.max_response_time_ms
    );
}

pub async fn run(
    services: &Services,
    file: &Path,
    collection_id: &str,
    folder_id: Option<&str>,
    scope: &ScopeArgs,
    json: bool,
) -> Result<ExitCode> {
    let collections: Vec<Collection> = read_json(file).await?;
    let Some(collection) = collections.iter().find(|c| c.id == collection_id) else {
        bail!("collection '{collection_id}' not found in {}", file.display());
    };
    let (environments, globals) = load_scope(scope).await?;

    let run = services
        .runner(services.executor()?)
        .run(
            collection,
            folder_id,
            scope.environment.as_deref(),
            &environments,
            &globals,
        )
        .await;

    if json {
        print!("{}", to_json_stable(&run)?);
    } else {
        print_run(&run);
    }
    Ok(if run.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn monitor(
    services: &Services,
    file: &Path,
    monitors_file: &Path,
    scope: &ScopeArgs,
    once: bool,
) -> Result<ExitCode> {
    let collections: Vec<Collection> = read_json(file).await?;
    let monitors: Vec<Monitor> = read_json(monitors_file).await?;
    let (environments, globals) = load_scope(scope).await?;

    let workspace = Arc::new(InMemoryWorkspace::new(WorkspaceSnapshot {
        collections,
        environments,
        globals,
    }));
    let store = Arc::new(MonitorStore::new(Arc::clone(&services.store)));
    for monitor in monitors {
        store.upsert(monitor).await?;
    }

    let executor = services.executor()?;
    let notifier =
        ReqwestWebhookNotifier::new(executor.client().clone(), services.config.request_timeout_ms);
    let scheduler = MonitorScheduler::new(
        services.runner(executor),
        workspace,
        Arc::clone(&store),
        Arc::new(notifier),
        Arc::new(SystemClock::new()),
    );

    if once {
        let mut all_passed = true;
        for monitor in store.list().await?.iter().filter(|m| m.enabled) {
            match scheduler.fire_now(&monitor.id).await? {
                FireOutcome::Completed(record) => {
                    all_passed &= record.passed;
                    println!(
                        "{}: {} ({} passed, {} failed, {} breach(es))",
                        monitor.name,
                        if record.passed { "passed" } else { "failed" },
                        record.passed_tests,
                        record.failed_tests,
                        record.breaches.len()
                    );
                }
                other => warn!(monitor = %monitor.name, outcome = ?other, "Monitor did not run"),
            }
        }
        return Ok(if all_passed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let scheduled = scheduler.start().await?;
    info!(scheduled, "Monitors scheduled, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    scheduler.cancel_all();
    info!("Monitors stopped");
    Ok(ExitCode::SUCCESS)
}
