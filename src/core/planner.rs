//! # Test Execution Planner Module / 测试执行计划模块
//!
//! This module turns a suite's cases plus a run configuration into an
//! execution plan: which cases run, how many workers execute them and which
//! per-case timeout applies.
//!
//! 此模块将套件的用例与运行配置转换为执行计划：
//! 运行哪些用例、由多少个工作者执行以及适用的单用例超时。

use std::time::Duration;

use crate::core::config::RunnerSettings;
use crate::core::error::{EngineError, Result};
use crate::core::models::{RunConfig, TestCase};

/// Represents a complete execution plan for one run.
/// 表示一次运行的完整执行计划。
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// The cases to execute, in declaration order / 按声明顺序执行的用例
    pub cases_to_run: Vec<TestCase>,
    /// Size of the run-scoped worker pool / 运行级工作池的大小
    pub workers: usize,
    /// Timeout applied to every case / 应用于每个用例的超时
    pub timeout: Duration,
    /// The number of cases dropped by the category filter.
    /// 被类别过滤器排除的用例数量。
    pub filtered_count: usize,
}

/// Creates an execution plan.
///
/// # Arguments
/// * `cases` - Every case of the suite
/// * `config` - The caller's run configuration
/// * `settings` - Engine-wide limits
/// * `categories` - Optional category filter; empty keeps every case
///
/// # Errors
/// `InvalidState` when no case survives filtering.
pub fn plan_execution(
    cases: Vec<TestCase>,
    config: &RunConfig,
    settings: &RunnerSettings,
    categories: &[String],
) -> Result<ExecutionPlan> {
    let total = cases.len();
    let cases_to_run: Vec<_> = if categories.is_empty() {
        cases
    } else {
        cases
            .into_iter()
            .filter(|case| categories.iter().any(|c| c == case.category_label()))
            .collect()
    };

    if cases_to_run.is_empty() {
        return Err(EngineError::InvalidState(
            "No test cases to run for this suite".to_string(),
        ));
    }

    Ok(ExecutionPlan {
        filtered_count: total - cases_to_run.len(),
        cases_to_run,
        workers: settings.resolve_workers(config.concurrency),
        timeout: settings.resolve_timeout(config.timeout_ms),
    })
}
