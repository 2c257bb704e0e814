//! # Case Executor Module / 用例执行模块
//!
//! This module executes a single test case: it builds the request from the
//! run and the case, dispatches it through the transport, measures the
//! wall-clock duration, validates the response and persists the result.
//! Nothing that goes wrong inside one case escapes as an error, except a
//! failure to persist the result itself.
//!
//! 此模块执行单个测试用例：根据运行与用例构建请求，通过传输层发送，
//! 测量挂钟耗时，校验响应并持久化结果。单个用例内部出现的任何问题都不会
//! 以错误形式逃逸，唯一的例外是结果本身持久化失败。

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::core::error::{EngineError, Result};
use crate::core::models::{Headers, HttpMethod, RequestRecord, Run, TestCase, TestResult};
use crate::core::validator::ResponseValidator;
use crate::infra::http::{HttpRequest, Transport};
use crate::infra::store::Store;

/// Executes test cases against the target service.
/// 针对目标服务执行测试用例。
#[derive(Clone)]
pub struct CaseExecutor {
    transport: Arc<dyn Transport>,
    store: Arc<dyn Store>,
    validator: ResponseValidator,
}

impl CaseExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn Store>,
        validator: ResponseValidator,
    ) -> Self {
        Self {
            transport,
            store,
            validator,
        }
    }

    /// Executes `case` within `run` and persists its result.
    ///
    /// # Errors
    /// Only when the result cannot be persisted. Transport and validation
    /// failures are recorded in the returned result instead.
    ///
    /// 在 `run` 中执行 `case` 并持久化其结果。
    /// 仅当结果无法持久化时返回错误；传输与校验失败会记录在返回的结果中。
    pub async fn run_case(&self, case: &TestCase, run: &Run, timeout: Duration) -> Result<TestResult> {
        let result = self.execute(case, run, timeout).await;
        self.record(&result).await?;
        Ok(result)
    }

    /// Persists a result produced outside [`CaseExecutor::execute`].
    pub async fn record(&self, result: &TestResult) -> Result<()> {
        self.store.save_result(result).await
    }

    /// Executes `case` without persisting anything.
    /// 执行 `case`，不持久化任何内容。
    pub async fn execute(&self, case: &TestCase, run: &Run, timeout: Duration) -> TestResult {
        debug!(run = %run.id, case = %case.id, name = %case.name, "executing test case");

        let record = RequestRecord {
            url: format!("{}{}", run.base_url, case.endpoint),
            method: case.method.clone(),
            headers: merge_headers(&run.headers, &case.headers),
            body: case.body.clone(),
        };

        let method = match case.method.parse::<HttpMethod>() {
            Ok(method) => method,
            Err(e) => {
                let message = match e {
                    EngineError::InvalidState(message) => message,
                    other => other.to_string(),
                };
                warn!(case = %case.id, "{message}");
                return TestResult::execution_error(&run.id, &case.id, &message, 0)
                    .with_request(record);
            }
        };

        let request = HttpRequest {
            method,
            url: record.url.clone(),
            headers: record.headers.clone(),
            body: record.body.clone(),
            timeout,
        };

        let start = Instant::now();
        let outcome = self.transport.send(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                let status_match = response.status == case.expected_status;
                let validation_errors = self.validator.validate(&response, case);
                let passed = status_match && validation_errors.is_empty();
                debug!(
                    case = %case.id,
                    status = response.status,
                    duration_ms,
                    passed,
                    "test case finished"
                );
                TestResult::exchanged(
                    &run.id,
                    &case.id,
                    passed,
                    duration_ms,
                    record,
                    response.status,
                    response.headers,
                    response.body,
                    validation_errors,
                )
            }
            Err(e) => {
                warn!(case = %case.id, error = %e, "test case transport failure");
                TestResult::execution_error(&run.id, &case.id, &e.to_string(), duration_ms)
                    .with_request(record)
            }
        }
    }
}

/// Run-level headers overlaid by case headers. The case wins on conflicts;
/// header names compare case-insensitively.
///
/// 运行级头部被用例头部覆盖。冲突时以用例为准；头部名称比较不区分大小写。
pub fn merge_headers(run_headers: &Headers, case_headers: &Headers) -> Headers {
    run_headers
        .iter()
        .filter(|(name, _)| !case_headers.keys().any(|c| c.eq_ignore_ascii_case(name)))
        .chain(case_headers.iter())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
