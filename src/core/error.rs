//! # Engine Errors / 引擎错误
//!
//! Failure taxonomy of the execution engine. `NotFound` and `InvalidState`
//! are client-visible conditions; `Orchestration` faults abort a whole run.
//! Transport failures and validation failures never leave the case executor:
//! they are folded into the case's `TestResult`.
//!
//! 执行引擎的失败分类。`NotFound` 与 `InvalidState` 是客户端可见的情况；
//! `Orchestration` 故障会中止整个运行。传输失败和校验失败不会离开用例执行器，
//! 而是被折叠进该用例的 `TestResult`。

use thiserror::Error;

/// Result alias used across the engine.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A suite, case or run identifier is unknown.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is well-formed but cannot be honoured, e.g. an empty suite.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A fault outside the per-case isolation boundary.
    #[error("Orchestration fault: {0}")]
    Orchestration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        EngineError::NotFound(format!("{kind} not found: {id}"))
    }

    /// `true` for conditions the caller caused and can correct.
    /// 对于调用方造成且可以纠正的情况返回 `true`。
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::NotFound(_) | EngineError::InvalidState(_))
    }
}
