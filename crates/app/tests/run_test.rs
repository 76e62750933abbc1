//! Collection runner integration tests over the file-backed store.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use probe_application::{CollectionRunner, HistoryStore, KeyValueStore, TransportError};
use probe_domain::collection::{Collection, Folder};
use probe_domain::environment::Environment;
use probe_domain::request::{ApiRequest, BodyType, HttpMethod, KeyValuePair};
use probe_domain::testing::{Assertion, StatusExpectation};
use probe_infrastructure::{FileKeyValueStore, SystemClock};
use tempfile::tempdir;

use common::FakeExecutor;

fn shop() -> Collection {
    Collection::new("Shop")
        .with_id("shop")
        .with_request(
            ApiRequest::get("Health", "{{base}}/health")
                .with_header(KeyValuePair::new("X-Env", "{{env}}"))
                .with_header(KeyValuePair::disabled("X-Debug", "1")),
        )
        .with_folder(
            Folder::new("Orders")
                .with_id("orders")
                .with_request(
                    ApiRequest::new("Create", HttpMethod::Post, "{{base}}/orders")
                        .with_body(BodyType::Json, r#"{"user":"{{user}}"}"#)
                        .with_test(Assertion::StatusCode {
                            expected: StatusExpectation::Exact(201),
                        }),
                )
                .with_request(
                    ApiRequest::get("Search", "{{base}}/orders")
                        .with_param(KeyValuePair::new("q", "{{missing}}")),
                ),
        )
}

fn environments() -> Vec<Environment> {
    vec![
        Environment::new("Dev")
            .with_id("dev")
            .with_variable("base", "https://dev.shop.test")
            .with_variable("env", "dev"),
        Environment::new("Prod")
            .with_id("prod")
            .with_variable("base", "https://shop.test"),
    ]
}

fn globals() -> Vec<KeyValuePair> {
    vec![
        KeyValuePair::new("base", "https://global.test"),
        KeyValuePair::new("user", "ada"),
        KeyValuePair::new("env", "global"),
    ]
}

#[tokio::test]
async fn test_run_resolves_and_aggregates() {
    let executor = Arc::new(
        FakeExecutor::default()
            .respond("https://dev.shop.test/health", 200, 40)
            .respond("https://dev.shop.test/orders", 201, 120),
    );
    let runner = CollectionRunner::new(executor.clone(), Arc::new(SystemClock::new()));

    let run = runner
        .run(&shop(), None, Some("dev"), &environments(), &globals())
        .await;

    let sent = executor.sent();
    let urls: Vec<String> = sent.iter().map(|r| r.full_url()).collect();
    assert_eq!(
        urls,
        vec![
            "https://dev.shop.test/health",
            "https://dev.shop.test/orders",
            "https://dev.shop.test/orders?q=%7B%7Bmissing%7D%7D",
        ]
    );
    assert_eq!(sent[0].headers, vec![KeyValuePair::new("X-Env", "dev")]);
    assert_eq!(sent[1].body, r#"{"user":"ada"}"#);
    assert_eq!(sent[2].unresolved, vec!["missing".to_string()]);

    assert_eq!(run.collection_id, "shop");
    assert_eq!(run.total_requests, 3);
    assert_eq!(run.passed_tests, 3);
    assert_eq!(run.min_response_time_ms, 10);
    assert_eq!(run.max_response_time_ms, 120);
    assert_eq!(run.total_time_ms, 170);
}

#[tokio::test]
async fn test_failures_are_recorded_not_propagated() {
    let executor = Arc::new(
        FakeExecutor::default()
            .fail(
                "https://shop.test/health",
                TransportError::Timeout { timeout_ms: 30_000 },
            )
            .respond("https://shop.test/orders", 500, 15),
    );
    let runner = CollectionRunner::new(executor, Arc::new(SystemClock::new()));

    let run = runner
        .run(&shop(), None, Some("prod"), &environments(), &globals())
        .await;

    assert_eq!(run.total_requests, 3);
    assert_eq!(run.failed_tests, 2);
    let health = &run.results[0];
    assert!(!health.passed);
    assert_eq!(health.status_code, 0);
    assert!(health.error.as_deref().unwrap().contains("timed out"));
    let create = &run.results[1];
    assert_eq!(create.status_code, 500);
    assert_eq!(create.failed_tests.len(), 1);
    assert!(run.results[2].passed);
}

#[tokio::test]
async fn test_folder_scope_and_unknown_folder() {
    let runner = CollectionRunner::new(
        Arc::new(FakeExecutor::default()),
        Arc::new(SystemClock::new()),
    );

    let run = runner
        .run(&shop(), Some("orders"), None, &[], &globals())
        .await;
    assert_eq!(run.folder_id.as_deref(), Some("orders"));
    assert_eq!(run.total_requests, 2);

    let empty = runner
        .run(&shop(), Some("nope"), None, &[], &globals())
        .await;
    assert_eq!(empty.total_requests, 0);
    assert_eq!(empty.avg_response_time_ms, 0);
}

#[tokio::test]
async fn test_history_is_persisted_and_capped() {
    let dir = tempdir().expect("Failed to create temp directory");
    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(dir.path()));
    let history = Arc::new(HistoryStore::with_limit(Arc::clone(&store), 4));
    let runner = CollectionRunner::new(
        Arc::new(FakeExecutor::default()),
        Arc::new(SystemClock::new()),
    )
    .with_history(Arc::clone(&history));

    runner.run(&shop(), None, Some("dev"), &environments(), &globals()).await;
    runner.run(&shop(), None, Some("dev"), &environments(), &globals()).await;

    let entries = HistoryStore::new(Arc::new(FileKeyValueStore::new(dir.path())))
        .list()
        .await
        .unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].request.name, "Search");
    assert_eq!(entries[0].request.url, "https://dev.shop.test/orders");
    assert!(dir.path().join("probe.history.json").exists());

    history.clear().await.unwrap();
    assert!(history.list().await.unwrap().is_empty());
}
