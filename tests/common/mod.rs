// Shared test helpers for integration tests
#![allow(dead_code)]

use api_runner::core::error::{EngineError, Result};
use api_runner::core::models::{Run, RunConfig, TestCase, TestResult, TestSuite};
use api_runner::infra::http::{HttpRequest, HttpResponse, Transport, TransportError};
use api_runner::infra::store::{MemoryStore, Store};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "http://api.test";
pub const SUITE_ID: &str = "suite-1";

/// What the fake transport does for one endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Fail(TransportError),
    Panic(String),
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(status: u16, body: &str, delay: Duration) -> Self {
        Reply::Respond {
            status,
            body: body.to_string(),
            delay,
        }
    }
}

/// A scripted transport keyed by endpoint path (the URL minus `BASE_URL`).
/// Unscripted endpoints answer `200 {}`.
#[derive(Debug, Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, endpoint: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), reply);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let endpoint = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| Reply::json(200, "{}"));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let outcome = match reply {
            Reply::Respond { status, body, delay } => {
                tokio::time::sleep(delay).await;
                Ok(HttpResponse {
                    status,
                    headers: Default::default(),
                    body,
                })
            }
            Reply::Fail(error) => Err(error),
            Reply::Panic(message) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                panic!("{message}");
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// A memory store whose result and run writes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_results: AtomicBool,
    /// Fails every `save_run` after this many successful ones (0 = never).
    pub fail_runs_after: AtomicUsize,
    /// Makes `load_run` panic, as a broken store implementation would.
    pub panic_on_load_run: AtomicBool,
    run_writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn save_suite(&self, suite: &TestSuite, cases: &[TestCase]) -> Result<()> {
        self.inner.save_suite(suite, cases).await
    }

    async fn load_suite(&self, suite_id: &str) -> Result<TestSuite> {
        self.inner.load_suite(suite_id).await
    }

    async fn load_cases_by_suite(&self, suite_id: &str) -> Result<Vec<TestCase>> {
        self.inner.load_cases_by_suite(suite_id).await
    }

    async fn save_run(&self, run: &Run) -> Result<()> {
        let limit = self.fail_runs_after.load(Ordering::SeqCst);
        let writes = self.run_writes.fetch_add(1, Ordering::SeqCst);
        if limit > 0 && writes >= limit {
            return Err(EngineError::Orchestration("run store unavailable".into()));
        }
        self.inner.save_run(run).await
    }

    async fn load_run(&self, run_id: &str) -> Result<Run> {
        if self.panic_on_load_run.load(Ordering::SeqCst) {
            panic!("run index corrupted");
        }
        self.inner.load_run(run_id).await
    }

    async fn delete_run(&self, run_id: &str) -> Result<()> {
        self.inner.delete_run(run_id).await
    }

    async fn save_result(&self, result: &TestResult) -> Result<()> {
        if self.fail_results.load(Ordering::SeqCst) {
            return Err(EngineError::Orchestration("result store unavailable".into()));
        }
        self.inner.save_result(result).await
    }

    async fn load_results_by_run(&self, run_id: &str) -> Result<Vec<TestResult>> {
        self.inner.load_results_by_run(run_id).await
    }
}

/// A GET case against `endpoint` expecting 200.
pub fn case(id: &str, endpoint: &str) -> TestCase {
    TestCase {
        id: id.to_string(),
        suite_id: SUITE_ID.to_string(),
        name: format!("case {id}"),
        endpoint: endpoint.to_string(),
        ..Default::default()
    }
}

pub fn suite(cases: &[TestCase]) -> TestSuite {
    TestSuite {
        id: SUITE_ID.to_string(),
        name: "Sample API".to_string(),
        description: "suite used by tests".to_string(),
        api_spec: None,
        case_ids: cases.iter().map(|c| c.id.clone()).collect(),
    }
}

pub async fn seed(store: &dyn Store, cases: &[TestCase]) {
    store
        .save_suite(&suite(cases), cases)
        .await
        .expect("seeding the suite should succeed");
}

pub fn run_config() -> RunConfig {
    RunConfig {
        environment: "test".to_string(),
        base_url: BASE_URL.to_string(),
        ..Default::default()
    }
}

/// A persisted run in the `running` state, for executor-level tests.
pub async fn running_run(store: &dyn Store) -> Run {
    let run = Run::start(SUITE_ID, &run_config());
    store.save_run(&run).await.expect("saving the run should succeed");
    run
}

pub fn result(case_id: &str, passed: bool, duration_ms: u64, errors: &[&str]) -> TestResult {
    let mut result = TestResult::execution_error("run-1", case_id, "placeholder", duration_ms);
    result.status = if passed {
        api_runner::core::models::ResultStatus::Passed
    } else {
        api_runner::core::models::ResultStatus::Failed
    };
    result.error = None;
    result.validation_errors = errors.iter().map(|e| e.to_string()).collect();
    result
}
