//! # Persistence Module / 持久化模块
//!
//! The document-store contract consumed by the engine, keyed by opaque string
//! identifiers, plus an in-process implementation. Every lookup of an unknown
//! identifier fails with `NotFound`.
//!
//! 引擎使用的文档存储契约（以不透明字符串标识符为键），以及一个进程内实现。
//! 查找未知标识符时均以 `NotFound` 失败。

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::core::error::{EngineError, Result};
use crate::core::models::{Run, TestCase, TestResult, TestSuite};

#[async_trait]
pub trait Store: Send + Sync {
    async fn save_suite(&self, suite: &TestSuite, cases: &[TestCase]) -> Result<()>;
    async fn load_suite(&self, suite_id: &str) -> Result<TestSuite>;
    async fn load_cases_by_suite(&self, suite_id: &str) -> Result<Vec<TestCase>>;
    async fn save_run(&self, run: &Run) -> Result<()>;
    async fn load_run(&self, run_id: &str) -> Result<Run>;
    async fn delete_run(&self, run_id: &str) -> Result<()>;
    async fn save_result(&self, result: &TestResult) -> Result<()>;
    async fn load_results_by_run(&self, run_id: &str) -> Result<Vec<TestResult>>;
}

#[derive(Debug, Default)]
struct Collections {
    suites: HashMap<String, TestSuite>,
    cases: HashMap<String, Vec<TestCase>>,
    runs: HashMap<String, Run>,
    results: HashMap<String, Vec<TestResult>>,
}

/// A store kept entirely in memory for the lifetime of the process.
/// 在进程生命周期内完全保存在内存中的存储。
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_suite(&self, suite: &TestSuite, cases: &[TestCase]) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.suites.insert(suite.id.clone(), suite.clone());
        inner.cases.insert(suite.id.clone(), cases.to_vec());
        Ok(())
    }

    async fn load_suite(&self, suite_id: &str) -> Result<TestSuite> {
        self.inner
            .read()
            .await
            .suites
            .get(suite_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("Test suite", suite_id))
    }

    async fn load_cases_by_suite(&self, suite_id: &str) -> Result<Vec<TestCase>> {
        let inner = self.inner.read().await;
        if !inner.suites.contains_key(suite_id) {
            return Err(EngineError::not_found("Test suite", suite_id));
        }
        Ok(inner.cases.get(suite_id).cloned().unwrap_or_default())
    }

    async fn save_run(&self, run: &Run) -> Result<()> {
        self.inner
            .write()
            .await
            .runs
            .insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn load_run(&self, run_id: &str) -> Result<Run> {
        self.inner
            .read()
            .await
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("Test run", run_id))
    }

    async fn delete_run(&self, run_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .runs
            .remove(run_id)
            .ok_or_else(|| EngineError::not_found("Test run", run_id))?;
        inner.results.remove(run_id);
        Ok(())
    }

    async fn save_result(&self, result: &TestResult) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.runs.contains_key(&result.run_id) {
            return Err(EngineError::not_found("Test run", &result.run_id));
        }
        inner
            .results
            .entry(result.run_id.clone())
            .or_default()
            .push(result.clone());
        Ok(())
    }

    async fn load_results_by_run(&self, run_id: &str) -> Result<Vec<TestResult>> {
        let inner = self.inner.read().await;
        if !inner.runs.contains_key(run_id) {
            return Err(EngineError::not_found("Test run", run_id));
        }
        Ok(inner.results.get(run_id).cloned().unwrap_or_default())
    }
}
