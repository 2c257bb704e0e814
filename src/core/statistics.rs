//! # Statistics Aggregator / 统计聚合器
//!
//! Pure aggregation over a completed result set: global counts, per-category
//! pass rates, response-time distribution and the most frequent validation
//! errors. Output order is deterministic, so recomputing over the same
//! results yields identical statistics.
//!
//! 对已完成结果集的纯聚合：全局计数、按类别的通过率、响应时间分布以及
//! 最常见的校验错误。输出顺序是确定的，因此对相同结果重复计算会得到相同的统计。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::models::{pass_rate, ResultStatus, RunSummary, TestCase, TestResult, UNCATEGORIZED};

/// Number of entries kept in [`Statistics::most_common_errors`].
pub const TOP_ERRORS: usize = 5;

/// Counts for one category / 单个类别的计数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pass_rate: f64,
}

impl CategoryStats {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            pass_rate: 0.0,
        }
    }

    fn record(&mut self, status: ResultStatus) {
        self.total += 1;
        match status {
            ResultStatus::Passed => self.passed += 1,
            ResultStatus::Failed => self.failed += 1,
            ResultStatus::Skipped => self.skipped += 1,
        }
        self.pass_rate = pass_rate(self.passed, self.total);
    }
}

/// Response-time distribution in milliseconds. All zero when no durations exist.
/// 响应时间分布（毫秒）。没有耗时数据时全部为零。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeStats {
    pub average: f64,
    pub min: u64,
    pub max: u64,
}

/// One validation error string and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrequency {
    pub error: String,
    pub count: usize,
}

/// Aggregated statistics of one run / 单次运行的聚合统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub summary: RunSummary,
    /// One entry per observed category, in order of first appearance.
    /// 每个出现过的类别一项，按首次出现的顺序排列。
    pub category_stats: Vec<CategoryStats>,
    pub response_time: ResponseTimeStats,
    pub most_common_errors: Vec<ErrorFrequency>,
}

/// Computes statistics for `results`. `cases` maps case ids to their
/// definitions; results whose case is missing count as `"uncategorized"`.
///
/// 为 `results` 计算统计数据。`cases` 将用例 id 映射到其定义；
/// 找不到对应用例的结果计为 `"uncategorized"`。
pub fn compute_statistics(results: &[TestResult], cases: &HashMap<String, TestCase>) -> Statistics {
    Statistics {
        summary: RunSummary::from_results(results),
        category_stats: category_stats(results, cases),
        response_time: response_time_stats(results),
        most_common_errors: most_common_errors(results, TOP_ERRORS),
    }
}

fn category_stats(results: &[TestResult], cases: &HashMap<String, TestCase>) -> Vec<CategoryStats> {
    let mut stats: Vec<CategoryStats> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for result in results {
        let category = cases
            .get(&result.case_id)
            .map(TestCase::category_label)
            .unwrap_or(UNCATEGORIZED);
        let slot = *index.entry(category).or_insert_with(|| {
            stats.push(CategoryStats::new(category));
            stats.len() - 1
        });
        stats[slot].record(result.status);
    }

    stats
}

fn response_time_stats(results: &[TestResult]) -> ResponseTimeStats {
    let durations: Vec<u64> = results.iter().filter_map(|r| r.duration_ms).collect();
    let (Some(min), Some(max)) = (durations.iter().min(), durations.iter().max()) else {
        return ResponseTimeStats::default();
    };
    let sum: u64 = durations.iter().sum();
    ResponseTimeStats {
        average: sum as f64 / durations.len() as f64,
        min: *min,
        max: *max,
    }
}

/// The `limit` most frequent validation errors among failed results, by
/// descending count. Ties keep first-seen order.
///
/// 失败结果中出现频率最高的 `limit` 个校验错误，按次数降序排列；
/// 次数相同时保持首次出现的顺序。
pub fn most_common_errors(results: &[TestResult], limit: usize) -> Vec<ErrorFrequency> {
    let mut frequencies: Vec<ErrorFrequency> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    let errors = results
        .iter()
        .filter(|r| r.status == ResultStatus::Failed)
        .flat_map(|r| r.validation_errors.iter());

    for error in errors {
        match index.get(error.as_str()) {
            Some(&slot) => frequencies[slot].count += 1,
            None => {
                index.insert(error, frequencies.len());
                frequencies.push(ErrorFrequency {
                    error: error.clone(),
                    count: 1,
                });
            }
        }
    }

    // `sort_by` is stable, which keeps first-seen order among equal counts.
    frequencies.sort_by(|a, b| b.count.cmp(&a.count));
    frequencies.truncate(limit);
    frequencies
}
