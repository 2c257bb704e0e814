//! # Case Executor Unit Tests / 用例执行器单元测试
//!
//! Tests for executing a single case against a scripted transport.
//! 针对脚本化传输执行单个用例的测试。

mod common;

use api_runner::core::execution::{merge_headers, CaseExecutor};
use api_runner::core::models::{Headers, HttpMethod, ResultStatus};
use api_runner::core::validator::ResponseValidator;
use api_runner::infra::http::TransportError;
use api_runner::infra::store::{MemoryStore, Store};
use common::{case, running_run, seed, FakeTransport, Reply, BASE_URL};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn headers(pairs: &[(&str, &str)]) -> Headers {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn executor(transport: Arc<FakeTransport>, store: Arc<MemoryStore>) -> CaseExecutor {
    CaseExecutor::new(transport, store, ResponseValidator::default())
}

#[test]
fn test_merge_headers_case_wins_case_insensitively() {
    let run = headers(&[("Accept", "application/json"), ("X-Env", "ci")]);
    let case = headers(&[("accept", "text/plain"), ("X-Case", "1")]);
    let merged = merge_headers(&run, &case);

    assert_eq!(
        merged,
        headers(&[("accept", "text/plain"), ("X-Case", "1"), ("X-Env", "ci")])
    );
}

#[test]
fn test_merge_headers_keeps_run_headers_without_conflict() {
    let run = headers(&[("Authorization", "Bearer t")]);
    assert_eq!(merge_headers(&run, &Headers::new()), run);
}

#[tokio::test]
async fn test_passing_exchange_is_recorded() {
    let transport = Arc::new(FakeTransport::new().with_reply("/pets/1", Reply::json(200, r#"{"id": 1}"#)));
    let store = Arc::new(MemoryStore::new());
    let mut pet = case("get-pet", "/pets/1");
    pet.validation = vec!["response has property id".to_string()];
    seed(store.as_ref(), &[pet.clone()]).await;
    let mut run = running_run(store.as_ref()).await;
    run.headers = headers(&[("Accept", "application/json")]);

    let result = executor(transport.clone(), store.clone())
        .run_case(&pet, &run, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(result.status, ResultStatus::Passed);
    assert_eq!(result.request_url, format!("{BASE_URL}/pets/1"));
    assert_eq!(result.request_method, "GET");
    assert_eq!(result.response_status, Some(200));
    assert_eq!(result.response_body.as_deref(), Some(r#"{"id": 1}"#));
    assert!(result.validation_errors.is_empty());
    assert!(result.duration_ms.is_some());

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, HttpMethod::Get);
    assert_eq!(sent[0].headers["Accept"], "application/json");

    let stored = store.load_results_by_run(&run.id).await.unwrap();
    assert_eq!(stored, vec![result]);
}

#[tokio::test]
async fn test_request_body_and_method_are_sent() {
    let transport = Arc::new(FakeTransport::new().with_reply("/pets", Reply::json(201, r#"{"id": 5}"#)));
    let store = Arc::new(MemoryStore::new());
    let mut create = case("create", "/pets");
    create.method = "post".to_string();
    create.body = Some(json!({"name": "Rex"}));
    create.expected_status = 201;
    seed(store.as_ref(), &[create.clone()]).await;
    let run = running_run(store.as_ref()).await;

    let result = executor(transport.clone(), store)
        .run_case(&create, &run, TIMEOUT)
        .await
        .unwrap();

    assert!(result.is_passed());
    assert_eq!(result.request_body, Some(json!({"name": "Rex"})));
    let sent = transport.requests();
    assert_eq!(sent[0].method, HttpMethod::Post);
    assert_eq!(sent[0].body, Some(json!({"name": "Rex"})));
    assert_eq!(sent[0].timeout, TIMEOUT);
}

#[tokio::test]
async fn test_status_mismatch_fails_the_case() {
    let transport = Arc::new(FakeTransport::new().with_reply("/pets/9", Reply::json(404, "{}")));
    let store = Arc::new(MemoryStore::new());
    let missing = case("missing", "/pets/9");
    seed(store.as_ref(), &[missing.clone()]).await;
    let run = running_run(store.as_ref()).await;

    let result = executor(transport, store)
        .run_case(&missing, &run, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(result.status, ResultStatus::Failed);
    assert_eq!(result.response_status, Some(404));
    assert_eq!(
        result.validation_errors,
        vec!["Expected status code 200 but got 404".to_string()]
    );
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_transport_timeout_becomes_failed_result() {
    let transport = Arc::new(
        FakeTransport::new().with_reply("/slow", Reply::Fail(TransportError::Timeout(50))),
    );
    let store = Arc::new(MemoryStore::new());
    let slow = case("slow", "/slow");
    seed(store.as_ref(), &[slow.clone()]).await;
    let run = running_run(store.as_ref()).await;

    let result = executor(transport, store.clone())
        .run_case(&slow, &run, Duration::from_millis(50))
        .await
        .unwrap();

    assert_eq!(result.status, ResultStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("Request timed out after 50 ms"));
    assert_eq!(
        result.validation_errors,
        vec!["Test execution error: Request timed out after 50 ms".to_string()]
    );
    assert!(result.response_status.is_none());
    assert_eq!(result.request_url, format!("{BASE_URL}/slow"));
    assert_eq!(store.load_results_by_run(&run.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unsupported_method_never_reaches_transport() {
    let transport = Arc::new(FakeTransport::new());
    let store = Arc::new(MemoryStore::new());
    let mut trace = case("trace", "/pets");
    trace.method = "TRACE".to_string();
    seed(store.as_ref(), &[trace.clone()]).await;
    let run = running_run(store.as_ref()).await;

    let result = executor(transport.clone(), store)
        .run_case(&trace, &run, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(result.status, ResultStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("Unsupported HTTP method: TRACE"));
    assert_eq!(result.request_method, "TRACE");
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_is_reported() {
    let transport = Arc::new(FakeTransport::new());
    let store = Arc::new(MemoryStore::new());
    let orphan = case("orphan", "/");
    seed(store.as_ref(), &[orphan.clone()]).await;
    // The run was never saved, so its result cannot be stored.
    let run = api_runner::core::models::Run::start(common::SUITE_ID, &common::run_config());

    let outcome = executor(transport, store).run_case(&orphan, &run, TIMEOUT).await;
    assert!(outcome.is_err());
}
