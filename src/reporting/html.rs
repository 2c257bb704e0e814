//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a run report as a single self-contained HTML page:
//! summary counters, per-category statistics, response times, the most
//! common errors, insights and an expandable table of every result.
//!
//! 此模块将运行报告渲染为单个自包含的 HTML 页面：摘要计数、按类别统计、
//! 响应时间、最常见错误、洞察以及可展开的全部结果表格。

use anyhow::Result;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::path::Path;

use crate::core::models::ResultStatus;
use crate::infra::fs::write_atomic;
use crate::infra::t;
use crate::reporting::console::status_label;
use crate::reporting::report::{Report, ResultRow};

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem; color: #1f2328; }
h1 { margin-bottom: 0.25rem; }
.meta { color: #656d76; margin-bottom: 1.5rem; }
.summary-container { display: flex; gap: 1rem; margin-bottom: 1.5rem; }
.summary-item { border: 1px solid #d0d7de; border-radius: 6px; padding: 0.75rem 1.25rem; text-align: center; }
.summary-item .count { display: block; font-size: 1.75rem; font-weight: 600; }
.passed-text { color: #1a7f37; }
.failed-text { color: #cf222e; }
.skipped-text { color: #656d76; }
table { border-collapse: collapse; width: 100%; margin-bottom: 1.5rem; }
th, td { border-bottom: 1px solid #d0d7de; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }
.status-cell { display: inline-block; border-radius: 4px; padding: 0 0.5rem; color: #fff; }
.status-passed { background: #1a7f37; }
.status-failed { background: #cf222e; }
.status-skipped { background: #8c959f; }
.duration-cell { text-align: right; white-space: nowrap; }
details summary { cursor: pointer; color: #0969da; }
pre.output-content { background: #f6f8fa; padding: 0.75rem; white-space: pre-wrap; }
"#;

fn status_class(status: ResultStatus) -> &'static str {
    match status {
        ResultStatus::Passed => "status-passed",
        ResultStatus::Failed => "status-failed",
        ResultStatus::Skipped => "status-skipped",
    }
}

/// Renders the report to an HTML string.
/// 将报告渲染为 HTML 字符串。
pub fn render_html_report(report: &Report, locale: &str) -> String {
    let summary = &report.summary;
    let stats = &report.statistics;

    let markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (report.report_name) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                div.meta {
                    (report.report_name) " · " (report.environment) " · " (report.base_url)
                    " · " (report.status.as_str()) " · " (report.duration.total_ms) " ms"
                }
                div.summary-container {
                    (counter(summary.total, "", &t!("html_report.summary.total", locale = locale)))
                    (counter(summary.passed, "passed-text", &t!("html_report.summary.passed", locale = locale)))
                    (counter(summary.failed, "failed-text", &t!("html_report.summary.failed", locale = locale)))
                    (counter(summary.skipped, "skipped-text", &t!("html_report.summary.skipped", locale = locale)))
                    div.summary-item {
                        span.count { (format!("{:.2}%", summary.pass_rate)) }
                        span.label { (t!("html_report.summary.pass_rate", locale = locale)) }
                    }
                }

                h2 { (t!("html_report.categories", locale = locale)) }
                table {
                    thead { tr {
                        th { (t!("html_report.table.header.category", locale = locale)) }
                        th { (t!("html_report.summary.total", locale = locale)) }
                        th { (t!("html_report.summary.passed", locale = locale)) }
                        th { (t!("html_report.summary.failed", locale = locale)) }
                        th { (t!("html_report.summary.skipped", locale = locale)) }
                        th { (t!("html_report.summary.pass_rate", locale = locale)) }
                    } }
                    tbody {
                        @for category in &stats.category_stats {
                            tr {
                                td { (category.category) }
                                td { (category.total) }
                                td { (category.passed) }
                                td { (category.failed) }
                                td { (category.skipped) }
                                td { (format!("{:.2}%", category.pass_rate)) }
                            }
                        }
                    }
                }

                p {
                    (t!(
                        "response_time",
                        locale = locale,
                        average = format!("{:.1}", stats.response_time.average),
                        min = stats.response_time.min,
                        max = stats.response_time.max
                    ))
                }

                @if !stats.most_common_errors.is_empty() {
                    h2 { (t!("top_errors_banner", locale = locale)) }
                    ol {
                        @for entry in &stats.most_common_errors {
                            li { (entry.error) " (" (entry.count) ")" }
                        }
                    }
                }

                h2 { (t!("insights_banner", locale = locale)) }
                p { strong { (report.insights.summary) } }
                @if !report.insights.details.is_empty() {
                    pre.output-content { (report.insights.details) }
                }

                h2 { (t!("html_report.results", locale = locale)) }
                table {
                    thead { tr {
                        th { (t!("html_report.table.header.name", locale = locale)) }
                        th { (t!("html_report.table.header.category", locale = locale)) }
                        th { (t!("html_report.table.header.status", locale = locale)) }
                        th.duration-cell { (t!("html_report.table.header.duration", locale = locale)) }
                    } }
                    tbody {
                        @for row in &report.results {
                            (result_row(row, locale))
                        }
                    }
                }
            }
        }
    };
    markup.into_string()
}

fn counter(count: usize, class: &str, label: &str) -> Markup {
    html! {
        div.summary-item {
            span class={ "count " (class) } { (count) }
            span.label { (label) }
        }
    }
}

fn result_row(row: &ResultRow, locale: &str) -> Markup {
    let duration = row
        .duration_ms
        .map(|ms| format!("{ms} ms"))
        .unwrap_or_else(|| "N/A".to_string());
    let has_details = row.error.is_some() || !row.validation_errors.is_empty();

    html! {
        tr {
            td {
                (row.case_name)
                @if has_details {
                    details {
                        summary { (t!("html_report.toggle_output", locale = locale)) }
                        pre.output-content {
                            (row.request_method) " " (row.request_url) "\n"
                            @if let Some(status) = row.response_status {
                                "HTTP " (status) "\n"
                            }
                            @if let Some(error) = &row.error {
                                (error) "\n"
                            }
                            @for error in &row.validation_errors {
                                "- " (error) "\n"
                            }
                        }
                    }
                }
            }
            td { (row.category) }
            td { div class={ "status-cell " (status_class(row.status)) } { (status_label(row.status, locale)) } }
            td.duration-cell { (duration) }
        }
    }
}

/// Generates an HTML report file at `output_path`.
///
/// # Errors / 错误
/// Fails when the file cannot be written.
/// 无法写入文件时失败。
pub fn generate_html_report(report: &Report, output_path: &Path, locale: &str) -> Result<()> {
    write_atomic(output_path, render_html_report(report, locale).as_bytes())
}
