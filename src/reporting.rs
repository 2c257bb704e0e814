//! # Reporting Module / 报告模块
//!
//! This module assembles run reports and presents them in multiple formats:
//! a colorful, localized console summary, a styled HTML page and JSON.
//!
//! 此模块组装运行报告并以多种格式呈现：彩色的本地化控制台摘要、
//! 样式化的 HTML 页面以及 JSON。

pub mod console;
pub mod html;
pub mod report;

// Re-export common reporting functions
pub use console::{print_failure_details, print_run_status, print_summary};
pub use html::generate_html_report;
pub use report::{generate_report, Insights, Report, ResultRow};
