//! # Report Assembly Module / 报告组装模块
//!
//! Builds the full report of one run: the run record, per-result rows with
//! their case names resolved, aggregated statistics and, when a text
//! generator is available, improvement insights.
//!
//! 构建单次运行的完整报告：运行记录、解析出用例名称的逐结果行、
//! 聚合统计，以及在文本生成器可用时的改进洞察。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::core::error::Result;
use crate::core::models::{ResultStatus, Run, RunStatus, RunSummary, TestCase, TestResult};
use crate::core::statistics::{compute_statistics, Statistics};
use crate::infra::llm::{improvement_prompt, TextGenerator};
use crate::infra::store::Store;

/// Case name shown for results whose case no longer exists.
pub const UNKNOWN_TEST: &str = "Unknown Test";
/// Category shown for results whose case no longer exists.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Start, end and total wall-clock time of a run.
/// 运行的开始、结束时间与总耗时。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationInfo {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Zero while the run has no end time / 运行没有结束时间时为零
    pub total_ms: i64,
}

/// Free-text analysis of the run's failures.
/// 对运行失败情况的自由文本分析。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: String,
    pub details: String,
}

impl Insights {
    pub fn disabled() -> Self {
        Self {
            summary: "Insights disabled".to_string(),
            details: String::new(),
        }
    }

    fn failed(reason: &str) -> Self {
        Self {
            summary: "Failed to generate insights".to_string(),
            details: format!("An error occurred while analyzing test results: {reason}"),
        }
    }

    /// Splits generated text at the first blank line: the first paragraph is
    /// the summary, everything after it the details.
    ///
    /// 在第一个空行处拆分生成的文本：第一段为摘要，其余为详情。
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self {
                summary: "No insights available".to_string(),
                details: String::new(),
            };
        }
        match text.split_once("\n\n") {
            Some((summary, details)) => Self {
                summary: summary.trim().to_string(),
                details: details.trim().to_string(),
            },
            None => Self {
                summary: text.to_string(),
                details: String::new(),
            },
        }
    }
}

/// One row of the report's result table / 报告结果表中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: String,
    pub case_id: String,
    pub case_name: String,
    pub category: String,
    pub status: ResultStatus,
    pub duration_ms: Option<u64>,
    pub request_url: String,
    pub request_method: String,
    pub response_status: Option<u16>,
    pub error: Option<String>,
    pub validation_errors: Vec<String>,
}

impl ResultRow {
    fn new(result: &TestResult, case: Option<&TestCase>) -> Self {
        Self {
            id: result.id.clone(),
            case_id: result.case_id.clone(),
            case_name: case.map_or(UNKNOWN_TEST, |c| c.name.as_str()).to_string(),
            category: case.map_or(UNKNOWN_CATEGORY, TestCase::category_label).to_string(),
            status: result.status,
            duration_ms: result.duration_ms,
            request_url: result.request_url.clone(),
            request_method: result.request_method.clone(),
            response_status: result.response_status,
            error: result.error.clone(),
            validation_errors: result.validation_errors.clone(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == ResultStatus::Failed
    }
}

/// The complete report of one run / 单次运行的完整报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub suite_id: String,
    pub suite_name: String,
    pub report_name: String,
    pub generated_at: DateTime<Utc>,
    pub status: RunStatus,
    pub environment: String,
    pub base_url: String,
    pub duration: DurationInfo,
    pub summary: RunSummary,
    pub statistics: Statistics,
    pub insights: Insights,
    pub results: Vec<ResultRow>,
}

/// Generates the report of `run_id`.
///
/// # Errors
/// `NotFound` when the run or its suite does not exist. A failing text
/// generator never fails the report; its error is folded into the insights.
///
/// 生成 `run_id` 的报告。
/// 运行或其套件不存在时返回 `NotFound`。文本生成器失败不会导致报告失败，
/// 其错误会写入洞察中。
pub async fn generate_report(
    store: &dyn Store,
    generator: Option<&dyn TextGenerator>,
    run_id: &str,
) -> Result<Report> {
    info!(run = %run_id, "generating report");

    let run = store.load_run(run_id).await?;
    let suite = store.load_suite(&run.suite_id).await?;
    let results = store.load_results_by_run(run_id).await?;
    let cases: HashMap<String, TestCase> = store
        .load_cases_by_suite(&suite.id)
        .await?
        .into_iter()
        .map(|case| (case.id.clone(), case))
        .collect();

    let statistics = compute_statistics(&results, &cases);
    let insights = match generator {
        Some(generator) => generate_insights(generator, &run, &results, &cases).await,
        None => Insights::disabled(),
    };
    let rows = results
        .iter()
        .map(|result| ResultRow::new(result, cases.get(&result.case_id)))
        .collect();

    Ok(Report {
        id: run.id.clone(),
        suite_id: run.suite_id.clone(),
        report_name: format!("{} - Run Report {}", suite.name, run.id),
        suite_name: suite.name,
        generated_at: Utc::now(),
        status: run.status,
        environment: run.environment.clone(),
        base_url: run.base_url.clone(),
        duration: DurationInfo {
            start_time: run.start_time,
            end_time: run.end_time,
            total_ms: run.total_ms(),
        },
        summary: run.summary,
        statistics,
        insights,
        results: rows,
    })
}

async fn generate_insights(
    generator: &dyn TextGenerator,
    run: &Run,
    results: &[TestResult],
    cases: &HashMap<String, TestCase>,
) -> Insights {
    let failed_tests: Vec<_> = results
        .iter()
        .filter(|r| r.status == ResultStatus::Failed)
        .map(|r| {
            let case = cases.get(&r.case_id);
            json!({
                "testName": case.map_or(UNKNOWN_TEST, |c| c.name.as_str()),
                "category": case.map_or(UNKNOWN_CATEGORY, TestCase::category_label),
                "errors": r.validation_errors,
                "responseStatus": r.response_status,
            })
        })
        .collect();

    let payload = json!({
        "testRunSummary": run.summary,
        "failedTests": failed_tests,
    });

    match generator.generate(&improvement_prompt(&payload.to_string())).await {
        Ok(text) => Insights::from_text(&text),
        Err(e) => {
            warn!(run = %run.id, error = %e, "insight generation failed");
            Insights::failed(&e.to_string())
        }
    }
}
