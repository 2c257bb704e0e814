//! # Run Orchestrator Module / 运行编排模块
//!
//! This module owns the lifecycle of a run. `start_run` validates the suite,
//! persists a `running` run and returns immediately; the cases are then
//! executed on a separate, run-scoped workflow by a fixed-size worker pool.
//! When every case has produced a result, the summary is computed and the
//! run is finalized. Faults outside the per-case boundary abort the run.
//!
//! 此模块负责运行的生命周期。`start_run` 校验套件、持久化 `running` 状态的运行
//! 并立即返回；随后由固定大小的工作池在独立的运行级工作流中执行用例。
//! 当所有用例都产生结果后，计算摘要并完成运行。单用例边界之外的故障会中止运行。

use futures::{FutureExt, TryStreamExt};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::config::RunnerSettings;
use crate::core::error::{EngineError, Result};
use crate::core::execution::CaseExecutor;
use crate::core::models::{Run, RunConfig, RunDetails, RunSummary, TestCase, TestResult};
use crate::core::planner::{plan_execution, ExecutionPlan};
use crate::core::rules::{KeywordRuleInterpreter, RuleInterpreter};
use crate::core::validator::ResponseValidator;
use crate::infra::http::Transport;
use crate::infra::store::Store;

/// Reason recorded on cases that were never dispatched.
const SKIPPED_REASON: &str = "Run cancelled before the case was dispatched";

/// A run whose workflow has been spawned and not yet awaited.
/// `handle` is taken by the caller of `await_run`; the entry stays so the
/// run can still be cancelled while it is being awaited.
struct ActiveRun {
    cancel: CancellationToken,
    handle: Option<JoinHandle<Run>>,
}

/// The entry point of the engine: starts, tracks, cancels and reads runs.
/// 引擎入口：启动、跟踪、取消和读取运行。
pub struct Engine {
    store: Arc<dyn Store>,
    executor: CaseExecutor,
    settings: RunnerSettings,
    active: Mutex<HashMap<String, ActiveRun>>,
}

impl Engine {
    /// Creates an engine using the keyword rule interpreter.
    pub fn new(store: Arc<dyn Store>, transport: Arc<dyn Transport>, settings: RunnerSettings) -> Self {
        Self::with_interpreter(store, transport, settings, Arc::new(KeywordRuleInterpreter))
    }

    /// Creates an engine with a custom rule interpreter.
    /// 使用自定义规则解释器创建引擎。
    pub fn with_interpreter(
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
        settings: RunnerSettings,
        interpreter: Arc<dyn RuleInterpreter>,
    ) -> Self {
        let validator = ResponseValidator::new(interpreter, settings.strict_rules);
        let executor = CaseExecutor::new(transport, store.clone(), validator);
        Self {
            store,
            executor,
            settings,
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    /// Starts a run of every case in the suite.
    ///
    /// # Errors
    /// * `NotFound` if the suite or its cases cannot be loaded
    /// * `InvalidState` if the suite has no cases
    pub async fn start_run(&self, suite_id: &str, config: RunConfig) -> Result<Run> {
        self.start_filtered_run(suite_id, config, &[]).await
    }

    /// Starts a run restricted to the given categories (all when empty).
    /// The returned run is in the `running` state; execution continues in the background.
    ///
    /// 启动仅限于给定类别（为空时为全部）的运行。
    /// 返回的运行处于 `running` 状态；执行在后台继续。
    pub async fn start_filtered_run(
        &self,
        suite_id: &str,
        config: RunConfig,
        categories: &[String],
    ) -> Result<Run> {
        info!(suite = %suite_id, "starting test run");

        self.store.load_suite(suite_id).await?;
        let cases = self.store.load_cases_by_suite(suite_id).await?;
        if cases.is_empty() {
            return Err(EngineError::InvalidState(format!(
                "No test cases found for test suite: {suite_id}"
            )));
        }

        let plan = plan_execution(cases, &config, &self.settings, categories)?;
        let run = Run::start(suite_id, &config);
        self.store.save_run(&run).await?;

        let cancel = CancellationToken::new();
        let workflow = RunWorkflow {
            store: self.store.clone(),
            executor: self.executor.clone(),
            cancel: cancel.clone(),
        };
        let snapshot = run.clone();
        let handle = tokio::spawn(async move { workflow.drive(snapshot, plan).await });

        let mut active = self.lock_active();
        active.retain(|_, entry| entry.handle.as_ref().is_none_or(|h| !h.is_finished()));
        active.insert(
            run.id.clone(),
            ActiveRun {
                cancel,
                handle: Some(handle),
            },
        );

        Ok(run)
    }

    /// Loads a run together with its results.
    /// 加载一次运行及其结果。
    pub async fn get_run(&self, run_id: &str) -> Result<RunDetails> {
        let run = self.store.load_run(run_id).await?;
        let results = self.store.load_results_by_run(run_id).await?;
        Ok(RunDetails { run, results })
    }

    /// Stops submitting new cases for a run. In-flight cases finish normally.
    /// Returns `false` if the run is not active in this engine.
    ///
    /// 停止为某次运行提交新用例。进行中的用例正常完成。
    /// 如果该运行在此引擎中不活跃，返回 `false`。
    pub fn cancel_run(&self, run_id: &str) -> bool {
        match self.lock_active().get(run_id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Waits until the run reaches its terminal state and returns it.
    /// Runs that already finished and were awaited are read from the store.
    ///
    /// 等待运行到达终止状态并返回。已完成且已被等待的运行从存储中读取。
    pub async fn await_run(&self, run_id: &str) -> Result<Run> {
        let handle = self
            .lock_active()
            .get_mut(run_id)
            .and_then(|entry| entry.handle.take());
        let Some(handle) = handle else {
            return self.store.load_run(run_id).await;
        };

        let outcome = handle.await;
        self.lock_active().remove(run_id);
        outcome.map_err(|e| EngineError::Orchestration(format!("run workflow failed: {e}")))
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, HashMap<String, ActiveRun>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Everything the background workflow of one run needs.
struct RunWorkflow {
    store: Arc<dyn Store>,
    executor: CaseExecutor,
    cancel: CancellationToken,
}

impl RunWorkflow {
    /// Executes the plan and always leaves the run in a terminal state,
    /// including when the workflow itself panics.
    async fn drive(self, snapshot: Run, plan: ExecutionPlan) -> Run {
        let run_id = snapshot.id.clone();
        let outcome = AssertUnwindSafe(self.execute(&run_id, plan))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(run)) => run,
            Ok(Err(fault)) => self.abort(snapshot, fault).await,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                let fault = EngineError::Orchestration(format!("run workflow panicked: {message}"));
                self.abort(snapshot, fault).await
            }
        }
    }

    async fn execute(&self, run_id: &str, plan: ExecutionPlan) -> Result<Run> {
        let run = Arc::new(self.store.load_run(run_id).await?);
        info!(
            run = %run_id,
            cases = plan.cases_to_run.len(),
            filtered = plan.filtered_count,
            workers = plan.workers,
            timeout_ms = plan.timeout.as_millis() as u64,
            "dispatching test cases"
        );

        let mut pool = WorkerPool::spawn(plan.workers, self.executor.clone(), run.clone(), plan.timeout);
        let unsubmitted = pool.submit_all(plan.cases_to_run, &self.cancel).await?;
        let mut results = pool.collect().await?;
        pool.shutdown().await;

        for case in &unsubmitted {
            let skipped = TestResult::skipped(run_id, &case.id, SKIPPED_REASON);
            self.store.save_result(&skipped).await?;
            results.push(skipped);
        }

        let summary = RunSummary::from_results(&results);
        let mut run = self.store.load_run(run_id).await?;
        if unsubmitted.is_empty() {
            run.complete(summary);
        } else {
            warn!(run = %run_id, skipped = unsubmitted.len(), "run cancelled");
            run.abort(summary);
        }
        self.store.save_run(&run).await?;

        info!(
            run = %run_id,
            status = %run.status,
            pass_rate = %format!("{:.2}", summary.pass_rate),
            "completed test run"
        );
        Ok(run)
    }

    /// Forces the run to `aborted`, counting whatever results were persisted.
    /// 强制将运行置为 `aborted`，并统计已持久化的结果。
    async fn abort(&self, mut run: Run, fault: EngineError) -> Run {
        error!(run = %run.id, error = %fault, "run aborted by orchestration fault");
        let results = self
            .store
            .load_results_by_run(&run.id)
            .await
            .unwrap_or_default();
        run.abort(RunSummary::from_results(&results));
        if let Err(e) = self.store.save_run(&run).await {
            error!(run = %run.id, error = %e, "failed to persist aborted run");
        }
        run
    }
}

/// A fixed-size pool of workers scoped to one run. Dropping the pool aborts
/// any worker still alive.
///
/// 作用于单次运行的固定大小工作池。丢弃工作池会中止仍存活的工作者。
struct WorkerPool {
    workers: JoinSet<()>,
    jobs: Option<mpsc::Sender<TestCase>>,
    results: Option<mpsc::UnboundedReceiver<Result<TestResult>>>,
}

impl WorkerPool {
    fn spawn(size: usize, executor: CaseExecutor, run: Arc<Run>, timeout: Duration) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<TestCase>(size);
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let job_rx = Arc::new(tokio::sync::Mutex::new(job_rx));

        let mut workers = JoinSet::new();
        for worker in 0..size {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let executor = executor.clone();
            let run = run.clone();
            workers.spawn(async move {
                loop {
                    let next = job_rx.lock().await.recv().await;
                    let Some(case) = next else { break };
                    let result = run_isolated(&executor, &case, &run, timeout).await;
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
                debug!(worker, "worker finished");
            });
        }

        Self {
            workers,
            jobs: Some(job_tx),
            results: Some(result_rx),
        }
    }

    /// Submits every case exactly once, unless the run is cancelled.
    /// Returns the cases that were never submitted.
    ///
    /// 每个用例恰好提交一次，除非运行被取消。返回从未提交的用例。
    async fn submit_all(&mut self, cases: Vec<TestCase>, cancel: &CancellationToken) -> Result<Vec<TestCase>> {
        let jobs = self
            .jobs
            .take()
            .ok_or_else(|| EngineError::Orchestration("cases were already submitted".into()))?;
        let mut unsubmitted = Vec::new();
        let mut pending = cases.into_iter();

        while let Some(case) = pending.next() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    unsubmitted.push(case);
                    unsubmitted.extend(pending.by_ref());
                    break;
                }
                permit = jobs.reserve() => match permit {
                    Ok(permit) => permit.send(case),
                    Err(_) => {
                        return Err(EngineError::Orchestration(
                            "worker pool stopped accepting cases".into(),
                        ))
                    }
                },
            }
        }

        // Closing the queue lets idle workers exit once it drains.
        drop(jobs);
        Ok(unsubmitted)
    }

    /// Waits for the result of every submitted case.
    /// 等待每个已提交用例的结果。
    async fn collect(&mut self) -> Result<Vec<TestResult>> {
        let results = self
            .results
            .take()
            .ok_or_else(|| EngineError::Orchestration("results were already collected".into()))?;
        UnboundedReceiverStream::new(results).try_collect().await
    }

    async fn shutdown(mut self) {
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker terminated abnormally");
            }
        }
    }
}

/// Runs one case, converting a panic into a failed result for that case only.
async fn run_isolated(
    executor: &CaseExecutor,
    case: &TestCase,
    run: &Run,
    timeout: Duration,
) -> Result<TestResult> {
    match AssertUnwindSafe(executor.run_case(case, run, timeout))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(case = %case.id, "test case panicked: {message}");
            let result = TestResult::execution_error(&run.id, &case.id, &message, 0);
            executor.record(&result).await?;
            Ok(result)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
