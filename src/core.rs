//! # Core Module / 核心模块
//!
//! This module contains the engine itself: data models, configuration,
//! planning, rule interpretation, response validation, case execution,
//! run orchestration and statistics.
//!
//! 此模块包含引擎本身：数据模型、配置、执行计划、规则解释、
//! 响应校验、用例执行、运行编排以及统计。

pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod orchestrator;
pub mod planner;
pub mod rules;
pub mod statistics;
pub mod validator;

// Re-exports
pub use config::SuiteConfig;
pub use error::{EngineError, Result};
pub use execution::CaseExecutor;
pub use models::{Run, RunStatus, TestCase, TestResult};
pub use orchestrator::Engine;
pub use statistics::{compute_statistics, Statistics};
pub use validator::ResponseValidator;
