//! # Report Command Module / 报告命令模块
//!
//! Re-renders a JSON report written by `run --json`: prints the console
//! summary and optionally produces the HTML page.
//!
//! 重新渲染由 `run --json` 写出的 JSON 报告：打印控制台摘要，并可选地生成 HTML 页面。

use anyhow::Result;
use colored::*;
use std::path::{Path, PathBuf};

use crate::infra::{fs::read_json, t};
use crate::reporting::{
    console::{print_failure_details, print_run_status, print_summary},
    html::generate_html_report,
    report::Report,
};

pub fn execute(input: &Path, html: Option<PathBuf>, locale: &str) -> Result<()> {
    let report: Report = read_json(input)?;
    println!("{}", report.report_name.bold());

    print_summary(&report, locale);
    let failures: Vec<_> = report.results.iter().filter(|r| r.is_failure()).collect();
    print_failure_details(&failures, locale);
    print_run_status(&report, locale);

    if let Some(report_path) = html {
        println!(
            "\n{}",
            t!("generating_html_report", locale = locale, path = report_path.display())
        );
        generate_html_report(&report, &report_path, locale)?;
    }
    Ok(())
}
