//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles the display of run reports in the console.
//! It provides functionality for printing colorful, formatted summaries with
//! internationalization support.
//!
//! 此模块处理控制台中运行报告的显示。
//! 它提供打印彩色格式化摘要的功能，支持国际化。

use colored::*;

use crate::core::models::{ResultStatus, RunStatus};
use crate::infra::t;
use crate::reporting::report::{Report, ResultRow};

/// Localized label for a result status.
/// 结果状态的本地化标签。
pub fn status_label(status: ResultStatus, locale: &str) -> String {
    match status {
        ResultStatus::Passed => t!("status_passed", locale = locale).to_string(),
        ResultStatus::Failed => t!("status_failed", locale = locale).to_string(),
        ResultStatus::Skipped => t!("status_skipped", locale = locale).to_string(),
    }
}

fn colored_status(status: ResultStatus, locale: &str) -> ColoredString {
    let label = status_label(status, locale);
    match status {
        ResultStatus::Passed => label.green(),
        ResultStatus::Failed => label.red(),
        ResultStatus::Skipped => label.dimmed(),
    }
}

/// Prints a formatted summary of a report to the console.
/// Displays one line per result, followed by the totals, the per-category
/// breakdown, response times, the most common errors and the insights.
///
/// 在控制台打印报告的格式化摘要。
/// 每个结果一行，随后是总计、按类别的细分、响应时间、最常见错误以及洞察。
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Passed     | Get pet                                  | positive     |     12 ms
///   - Failed     | Create pet with bad body                 | negative     |     31 ms
///   - Skipped    | Delete pet                               | positive     |       N/A
/// ```
pub fn print_summary(report: &Report, locale: &str) {
    println!("\n{}", t!("test_summary_banner", locale = locale).bold());

    for row in &report.results {
        let duration = row
            .duration_ms
            .map(|ms| format!("{ms} ms"))
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "  - {:<10} | {:<40} | {:<12} | {:>9}",
            colored_status(row.status, locale),
            row.case_name,
            row.category,
            duration
        );
    }

    let summary = &report.summary;
    println!(
        "\n{}",
        t!(
            "totals",
            locale = locale,
            total = summary.total,
            passed = summary.passed.to_string().green(),
            failed = summary.failed.to_string().red(),
            skipped = summary.skipped
        )
    );
    println!(
        "{}",
        t!("pass_rate", locale = locale, rate = format!("{:.2}", summary.pass_rate)).bold()
    );

    let stats = &report.statistics;
    if !stats.category_stats.is_empty() {
        println!("\n{}", t!("category_banner", locale = locale).bold());
        for category in &stats.category_stats {
            println!(
                "  - {:<16} {:>3}/{:<3} ({:.2}%)",
                category.category, category.passed, category.total, category.pass_rate
            );
        }
    }

    println!(
        "\n{}",
        t!(
            "response_time",
            locale = locale,
            average = format!("{:.1}", stats.response_time.average),
            min = stats.response_time.min,
            max = stats.response_time.max
        )
    );

    if !stats.most_common_errors.is_empty() {
        println!("\n{}", t!("top_errors_banner", locale = locale).bold());
        for entry in &stats.most_common_errors {
            println!("  {:>3} x {}", entry.count, entry.error.yellow());
        }
    }

    println!("\n{}", t!("insights_banner", locale = locale).bold());
    println!("  {}", report.insights.summary);
    if !report.insights.details.is_empty() {
        println!("\n{}", report.insights.details);
    }
}

/// Prints the outcome line of the run.
/// 打印运行的结果行。
pub fn print_run_status(report: &Report, locale: &str) {
    let line = match report.status {
        RunStatus::Passed => t!("all_tests_passed", locale = locale).green().bold(),
        RunStatus::Failed => t!("run_failed", locale = locale).red().bold(),
        RunStatus::Aborted => t!("run_aborted", locale = locale).red().bold(),
        RunStatus::Running => t!("run_still_running", locale = locale).yellow().bold(),
    };
    println!("\n{line}");
}

/// Prints detailed information about failed results: the request, the
/// response status and every validation error, so a failing check can be
/// reproduced by hand.
///
/// 打印失败结果的详细信息：请求、响应状态以及每个校验错误，便于手动复现失败的检查。
pub fn print_failure_details(failures: &[&ResultRow], locale: &str) {
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("failure_details_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, row) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failures.len(),
            t!("report_header_failure", locale = locale).red(),
            row.case_name.cyan()
        );
        println!("  {} {}", row.request_method.bold(), row.request_url);
        if let Some(status) = row.response_status {
            println!("  {}", t!("response_status", locale = locale, status = status));
        }
        if let Some(error) = &row.error {
            println!("  {} {}", t!("error_label", locale = locale).yellow(), error);
        }
        for error in &row.validation_errors {
            println!("    - {error}");
        }
        println!("{}", "-".repeat(80));
    }
}
