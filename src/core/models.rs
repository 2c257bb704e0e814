//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the API runner:
//! suites and their test cases, the per-run configuration, the mutable run
//! record, the immutable per-case results and the derived run summary.
//!
//! 此模块定义了整个 API 运行器中使用的核心数据结构：
//! 测试套件及其用例、每次运行的配置、可变的运行记录、
//! 不可变的单用例结果以及派生的运行摘要。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::error::EngineError;

/// Category label used when a test case does not declare one.
/// 当测试用例未声明类别时使用的类别标签。
pub const UNCATEGORIZED: &str = "uncategorized";

/// Header map used for requests, responses and run-level defaults.
/// Ordered so that persisted results and reports are deterministic.
pub type Headers = BTreeMap<String, String>;

fn default_expected_status() -> u16 {
    200
}

/// A named collection of test cases, usually derived from one API specification.
/// 一组命名的测试用例，通常来源于同一份 API 规范。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    /// Opaque identifier of the suite / 套件的不透明标识符
    pub id: String,
    /// Human readable name / 可读名称
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// The API specification text the cases were generated from, if kept.
    /// 生成用例所依据的 API 规范文本（如有保留）。
    #[serde(default)]
    pub api_spec: Option<String>,
    #[serde(default)]
    pub case_ids: Vec<String>,
}

/// The immutable definition of one declarative HTTP check.
/// 单个声明式 HTTP 检查的不可变定义。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Identifier of the case. Generated at load time when the suite file omits it.
    /// 用例标识符。若套件文件中省略，则在加载时生成。
    #[serde(default)]
    pub id: String,
    /// Identifier of the owning suite / 所属套件的标识符
    #[serde(default)]
    pub suite_id: String,
    pub name: String,
    /// HTTP method name, matched case-insensitively at execution time.
    /// HTTP 方法名，执行时不区分大小写匹配。
    pub method: String,
    /// Endpoint path, relative to the run's base URL.
    /// 端点路径，相对于运行的基础 URL。
    pub endpoint: String,
    #[serde(default)]
    pub headers: Headers,
    /// Optional structured request body, sent as JSON.
    /// 可选的结构化请求体，以 JSON 发送。
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
    /// Flat key/value fragment compared against the response body.
    /// 与响应体逐字段比较的扁平键值片段。
    #[serde(default)]
    pub expected_response: Option<Map<String, Value>>,
    /// Ordered free-text validation rules / 有序的自由文本校验规则
    #[serde(default)]
    pub validation: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl TestCase {
    /// Returns the category label, falling back to `"uncategorized"`.
    /// 返回类别标签，缺省时为 `"uncategorized"`。
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

impl Default for TestCase {
    fn default() -> Self {
        Self {
            id: String::new(),
            suite_id: String::new(),
            name: "unknown".to_string(),
            method: "GET".to_string(),
            endpoint: "/".to_string(),
            headers: Headers::new(),
            body: None,
            expected_status: default_expected_status(),
            expected_response: None,
            validation: vec![],
            category: None,
        }
    }
}

/// HTTP methods the case executor is able to dispatch.
/// 用例执行器能够发送的 HTTP 方法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(EngineError::InvalidState(format!(
                "Unsupported HTTP method: {s}"
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run parameters supplied by the caller.
/// 调用方提供的每次运行参数。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Free-text environment label, e.g. "staging".
    /// 自由文本环境标签，例如 "staging"。
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub base_url: String,
    /// Headers merged under each test case's own headers.
    /// 合并在每个测试用例自身头部之下的头部。
    #[serde(default)]
    pub headers: Headers,
    /// Per-case timeout override in milliseconds / 每个用例的超时覆盖（毫秒）
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Requested worker count, clamped to the configured maximum.
    /// 请求的工作线程数，会被限制在配置的最大值内。
    #[serde(default)]
    pub concurrency: Option<usize>,
}

/// Lifecycle state of a run. `Running` is the only non-terminal state.
/// 运行的生命周期状态。`Running` 是唯一的非终止状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Passed,
    Failed,
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counts of a finished run.
/// 已完成运行的汇总计数。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `passed / total * 100`, or `0` for an empty run.
    pub pass_rate: f64,
}

impl RunSummary {
    /// Computes the summary of a complete result set in one pass.
    /// 一次遍历计算完整结果集的摘要。
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = RunSummary {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.status {
                ResultStatus::Passed => summary.passed += 1,
                ResultStatus::Failed => summary.failed += 1,
                ResultStatus::Skipped => summary.skipped += 1,
            }
        }
        summary.pass_rate = pass_rate(summary.passed, summary.total);
        summary
    }
}

/// Percentage of passed cases, `0` when nothing ran.
pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// The mutable record of one execution of a suite.
/// 一次套件执行的可变记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub suite_id: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    /// Unset until the run reaches a terminal state.
    /// 在运行到达终止状态之前不设置。
    pub end_time: Option<DateTime<Utc>>,
    pub environment: String,
    pub base_url: String,
    pub headers: Headers,
    pub summary: RunSummary,
}

impl Run {
    /// Creates a fresh run in the `running` state with a generated identifier.
    /// 创建一个处于 `running` 状态、带有生成标识符的新运行。
    pub fn start(suite_id: &str, config: &RunConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            suite_id: suite_id.to_string(),
            status: RunStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            environment: config.environment.clone(),
            base_url: config.base_url.clone(),
            headers: config.headers.clone(),
            summary: RunSummary::default(),
        }
    }

    /// Moves the run to its terminal state. The status follows the summary:
    /// any failed case fails the run.
    pub fn complete(&mut self, summary: RunSummary) {
        self.status = if summary.failed > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };
        self.summary = summary;
        self.end_time = Some(Utc::now());
    }

    /// Forces the run into the `aborted` state.
    pub fn abort(&mut self, summary: RunSummary) {
        self.status = RunStatus::Aborted;
        self.summary = summary;
        self.end_time = Some(Utc::now());
    }

    /// Wall-clock duration of the run in milliseconds, `0` while running.
    pub fn total_ms(&self) -> i64 {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
            .unwrap_or(0)
    }
}

/// Outcome of a single executed case.
/// 单个已执行用例的结果状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Passed,
    Failed,
    Skipped,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Passed => "passed",
            ResultStatus::Failed => "failed",
            ResultStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record of one case executed within one run. Never mutated once created.
/// 单次运行中一个已执行用例的记录。创建后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub run_id: String,
    pub case_id: String,
    pub status: ResultStatus,
    /// Wall-clock duration in milliseconds; absent for cases that never ran.
    /// 挂钟耗时（毫秒）；从未运行的用例不存在该值。
    pub duration_ms: Option<u64>,
    pub request_url: String,
    pub request_method: String,
    pub request_headers: Headers,
    pub request_body: Option<Value>,
    /// Response fields are absent when the transport failed.
    /// 传输失败时响应字段不存在。
    pub response_status: Option<u16>,
    pub response_headers: Option<Headers>,
    pub response_body: Option<String>,
    pub validation_errors: Vec<String>,
    /// Top-level error for transport or unexpected failures.
    /// 传输失败或意外失败时的顶层错误。
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TestResult {
    fn blank(run_id: &str, case_id: &str, status: ResultStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            case_id: case_id.to_string(),
            status,
            duration_ms: None,
            request_url: String::new(),
            request_method: String::new(),
            request_headers: Headers::new(),
            request_body: None,
            response_status: None,
            response_headers: None,
            response_body: None,
            validation_errors: vec![],
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Builds a failed result for an execution error. The validation error list
    /// restates the failure so it shows up in error frequency statistics.
    ///
    /// 为执行错误构建失败结果。校验错误列表会重述该失败，
    /// 以便其出现在错误频率统计中。
    pub fn execution_error(run_id: &str, case_id: &str, message: &str, duration_ms: u64) -> Self {
        let mut result = Self::blank(run_id, case_id, ResultStatus::Failed);
        result.duration_ms = Some(duration_ms);
        result.error = Some(message.to_string());
        result.validation_errors = vec![format!("Test execution error: {message}")];
        result
    }

    /// Builds the result of a case that was never dispatched.
    pub fn skipped(run_id: &str, case_id: &str, reason: &str) -> Self {
        let mut result = Self::blank(run_id, case_id, ResultStatus::Skipped);
        result.error = Some(reason.to_string());
        result
    }

    /// Builds the result of a completed HTTP exchange.
    #[allow(clippy::too_many_arguments)]
    pub fn exchanged(
        run_id: &str,
        case_id: &str,
        passed: bool,
        duration_ms: u64,
        request: RequestRecord,
        response_status: u16,
        response_headers: Headers,
        response_body: String,
        validation_errors: Vec<String>,
    ) -> Self {
        let status = if passed {
            ResultStatus::Passed
        } else {
            ResultStatus::Failed
        };
        let mut result = Self::blank(run_id, case_id, status);
        result.duration_ms = Some(duration_ms);
        result.apply_request(request);
        result.response_status = Some(response_status);
        result.response_headers = Some(response_headers);
        result.response_body = Some(response_body);
        result.validation_errors = validation_errors;
        result
    }

    /// Attaches the request that was actually sent.
    pub fn with_request(mut self, request: RequestRecord) -> Self {
        self.apply_request(request);
        self
    }

    fn apply_request(&mut self, request: RequestRecord) {
        self.request_url = request.url;
        self.request_method = request.method;
        self.request_headers = request.headers;
        self.request_body = request.body;
    }

    pub fn is_passed(&self) -> bool {
        self.status == ResultStatus::Passed
    }

    pub fn is_failure(&self) -> bool {
        self.status == ResultStatus::Failed
    }
}

/// The request half of a result, as actually sent.
/// 结果中请求部分，即实际发送的内容。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestRecord {
    pub url: String,
    pub method: String,
    pub headers: Headers,
    pub body: Option<Value>,
}

/// A run together with every result recorded for it.
/// 一次运行及其记录的所有结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetails {
    pub run: Run,
    pub results: Vec<TestResult>,
}
