//! Collection runner
//!
//! Executes the requests of a collection (or one folder of it) strictly one
//! after another and aggregates the outcomes.

use std::sync::Arc;

use probe_domain::collection::{Collection, Folder};
use probe_domain::environment::{Environment, ResolutionScope, find_active};
use probe_domain::history::HistoryEntry;
use probe_domain::request::{ApiRequest, KeyValuePair};
use probe_domain::run::{RequestRunResult, RunResult};
use probe_domain::testing::evaluate_all;
use tracing::{debug, info, warn};

use crate::ports::{Clock, RequestExecutor};
use crate::stores::HistoryStore;
use crate::variable_resolver::{VariableResolver, resolve_with};

/// Runs collections through a [`RequestExecutor`].
///
/// A failing request never aborts the run: transport errors and failed
/// assertions are recorded as failed rows and the next request is sent.
#[derive(Clone)]
pub struct CollectionRunner {
    executor: Arc<dyn RequestExecutor>,
    clock: Arc<dyn Clock>,
    history: Option<Arc<HistoryStore>>,
}

impl CollectionRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new(executor: Arc<dyn RequestExecutor>, clock: Arc<dyn Clock>) -> Self {
        Self {
            executor,
            clock,
            history: None,
        }
    }

    /// Records every executed request in the given history.
    #[must_use]
    pub fn with_history(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Runs a collection, or only `folder_id` when given.
    ///
    /// Requests run in declared order: a level's own requests first, then its
    /// folders depth-first. An unknown folder id yields an empty run.
    pub async fn run(
        &self,
        collection: &Collection,
        folder_id: Option<&str>,
        environment_id: Option<&str>,
        environments: &[Environment],
        globals: &[KeyValuePair],
    ) -> RunResult {
        let started_at = self.clock.now();

        let requests: Vec<&ApiRequest> = match folder_id {
            Some(id) => collection.find_folder(id).map_or_else(
                || {
                    warn!(collection = %collection.id, folder = id, "Folder not found, nothing to run");
                    Vec::new()
                },
                Folder::requests_in_order,
            ),
            None => collection.requests_in_order(),
        };

        let environment = find_active(environments, environment_id);
        if environment_id.is_some() && environment.is_none() {
            warn!(environment = ?environment_id, "Environment not found, using globals only");
        }
        let resolver = VariableResolver::new(ResolutionScope::from_sources(globals, environment));

        info!(
            collection = %collection.name,
            folder = ?folder_id,
            requests = requests.len(),
            "Starting collection run"
        );

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.run_request(request, &resolver).await);
        }

        let run = RunResult::from_results(
            collection.id.clone(),
            folder_id.map(str::to_string),
            started_at,
            self.clock.now(),
            results,
        );
        info!(
            collection = %collection.name,
            total = run.total_requests,
            passed = run.passed_tests,
            failed = run.failed_tests,
            "Collection run finished"
        );
        run
    }

    async fn run_request(
        &self,
        request: &ApiRequest,
        resolver: &VariableResolver,
    ) -> RequestRunResult {
        let resolved = resolve_with(request, resolver);
        if !resolved.is_complete() {
            debug!(request = %request.name, unresolved = ?resolved.unresolved, "Unresolved variables");
        }
        let url = resolved.full_url();

        match self.executor.execute(&resolved).await {
            Ok(response) => {
                let assertions = evaluate_all(&request.tests, &response);
                let result = RequestRunResult::completed(
                    request.id.clone(),
                    request.name.clone(),
                    request.method,
                    url,
                    response.status,
                    response.time_ms,
                    assertions,
                );
                debug!(
                    request = %request.name,
                    status = response.status,
                    time_ms = response.time_ms,
                    passed = result.passed,
                    "Request completed"
                );
                self.record_history(HistoryEntry::new(
                    resolved.to_api_request(),
                    Some(response),
                    self.clock.now(),
                ))
                .await;
                result
            }
            Err(error) => {
                warn!(request = %request.name, %error, "Request failed");
                self.record_history(HistoryEntry::new(
                    resolved.to_api_request(),
                    None,
                    self.clock.now(),
                ))
                .await;
                RequestRunResult::transport_failure(
                    request.id.clone(),
                    request.name.clone(),
                    request.method,
                    url,
                    error.to_string(),
                )
            }
        }
    }

    async fn record_history(&self, entry: HistoryEntry) {
        if let Some(history) = &self.history {
            if let Err(error) = history.save(entry).await {
                warn!(%error, "Failed to save history entry");
            }
        }
    }
}
