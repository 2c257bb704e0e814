//! # Infrastructure Module / 基础设施模块
//!
//! This module provides the services the engine talks to: the HTTP transport,
//! the result store, the text-generation client, file system helpers and the
//! logging setup.
//!
//! 此模块提供引擎所依赖的服务：HTTP 传输、结果存储、文本生成客户端、
//! 文件系统辅助函数以及日志初始化。

pub mod fs;
pub mod http;
pub mod llm;
pub mod logging;
pub mod store;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
