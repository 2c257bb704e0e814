//! # API Runner Library / API Runner 库
//!
//! This library provides the core functionality for the API Runner tool,
//! a configuration-driven execution engine for declarative HTTP API test suites.
//!
//! 此库为 API Runner 工具提供核心功能，
//! 这是一个配置驱动的声明式 HTTP API 测试套件执行引擎。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, validation, execution, orchestration and statistics
//! - `infra` - Infrastructure services: HTTP transport, store, text generation, files, logging
//! - `reporting` - Report assembly and presentation
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、校验、执行、编排与统计
//! - `infra` - 基础设施服务：HTTP 传输、存储、文本生成、文件、日志
//! - `reporting` - 报告组装与展示
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::models;
pub use core::orchestrator::Engine;

/// Detects the best supported locale from the system settings.
///
/// It attempts to match the full locale (e.g., "zh-CN"), then just the
/// language code (e.g., "en"), and finally falls back to "en".
pub fn detect_locale() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }
    locale
        .split('-')
        .next()
        .filter(|lang_code| available_locales.contains(lang_code))
        .unwrap_or("en")
        .to_string()
}

/// Initializes the application's internationalization (i18n) based on the system locale.
pub fn init() {
    rust_i18n::set_locale(&detect_locale());
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
