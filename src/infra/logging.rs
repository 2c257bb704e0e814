//! # Logging Setup / 日志初始化
//!
//! Installs the global `tracing` subscriber. Diagnostics go to stderr so the
//! coloured report on stdout stays clean.
//!
//! 安装全局 `tracing` 订阅者。诊断信息输出到 stderr，使 stdout 上的彩色报告保持整洁。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the tracing subscriber.
///
/// # Arguments / 参数
/// * `json` - Emit one JSON object per event instead of human-readable lines.
///            以 JSON 对象而非可读文本输出每个事件。
/// * `default_level` - Filter used when `RUST_LOG` is not set (e.g. "warn", "debug").
///                     未设置 `RUST_LOG` 时使用的过滤级别。
///
/// Calling this more than once keeps the first subscriber.
pub fn setup_logging(json: bool, default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
