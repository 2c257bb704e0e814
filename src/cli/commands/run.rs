//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command of the API Runner CLI, which
//! loads a suite file, executes every selected case against the target
//! service and reports the outcome.
//!
//! 此模块实现了 API Runner CLI 的 `run` 命令：加载套件文件，
//! 针对目标服务执行所有选中的用例并报告结果。

use anyhow::{Context, Result};
use colored::*;
use std::{path::PathBuf, sync::Arc};
use tokio::{signal, task::JoinHandle};

use crate::{
    core::{
        config::{self, SuiteConfig},
        models::{RunConfig, RunStatus},
        orchestrator::Engine,
    },
    infra::{
        fs::write_json,
        http::ReqwestTransport,
        llm::{OllamaGenerator, TextGenerator},
        store::{MemoryStore, Store},
        t,
    },
    reporting::{
        console::{print_failure_details, print_run_status, print_summary},
        html::generate_html_report,
        report::generate_report,
    },
};

/// Options of the `run` command / `run` 命令的选项
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: PathBuf,
    pub base_url: Option<String>,
    pub environment: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub categories: Vec<String>,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub insights: bool,
}

/// Executes the run command with the provided options.
///
/// # Arguments
/// * `options` - Parsed command line options
/// * `language` - Language given with `--lang`; the suite file's language applies otherwise
///
/// # Returns
/// An error when the suite cannot be loaded or started, or when the run
/// ends `failed` or `aborted`.
pub async fn execute(options: RunOptions, language: Option<String>) -> Result<()> {
    let suite_config = config::load_suite_config(&options.config)
        .with_context(|| t!("config_read_failed_path", path = options.config.display()).to_string())?;
    let locale = language.unwrap_or_else(|| suite_config.language.clone());
    rust_i18n::set_locale(&locale);

    println!(
        "{}",
        t!("loading_suite", locale = locale, path = options.config.display())
    );

    let run_config = resolve_run_config(&suite_config, &options)?;
    let settings = suite_config.runner.clone();

    let store = Arc::new(MemoryStore::new());
    store
        .save_suite(&suite_config.test_suite(), &suite_config.cases)
        .await?;

    let transport = ReqwestTransport::new(settings.resolve_timeout(run_config.timeout_ms))?;
    let engine = Arc::new(Engine::new(store.clone(), Arc::new(transport), settings.clone()));

    println!(
        "{}",
        t!(
            "run_target",
            locale = locale,
            suite = suite_config.suite.name.yellow(),
            url = run_config.base_url.cyan()
        )
    );
    if !options.categories.is_empty() {
        println!(
            "{}",
            t!("category_filter", locale = locale, categories = options.categories.join(", ")).cyan()
        );
    }

    let workers = settings.resolve_workers(run_config.concurrency);
    let run = engine
        .start_filtered_run(&suite_config.suite.id, run_config, &options.categories)
        .await?;
    println!(
        "{}",
        t!(
            "run_started",
            locale = locale,
            id = run.id,
            workers = workers
        )
        .bold()
    );

    let signal_handler = setup_signal_handler(engine.clone(), run.id.clone(), &locale);
    let finished = engine.await_run(&run.id).await?;
    signal_handler.abort();

    let generator = if options.insights {
        Some(OllamaGenerator::new(&suite_config.generator)?)
    } else {
        None
    };
    let report = generate_report(
        store.as_ref(),
        generator.as_ref().map(|g| g as &dyn TextGenerator),
        &finished.id,
    )
    .await?;

    print_summary(&report, &locale);

    if let Some(report_path) = &options.html {
        println!(
            "\n{}",
            t!("generating_html_report", locale = locale, path = report_path.display())
        );
        if let Err(e) = generate_html_report(&report, report_path, &locale) {
            eprintln!("{} {:#}", t!("report_write_failed", locale = locale).red(), e);
        }
    }

    if let Some(report_path) = &options.json {
        println!(
            "\n{}",
            t!("generating_json_report", locale = locale, path = report_path.display())
        );
        if let Err(e) = write_json(report_path, &report) {
            eprintln!("{} {:#}", t!("report_write_failed", locale = locale).red(), e);
        }
    }

    let failures: Vec<_> = report.results.iter().filter(|r| r.is_failure()).collect();
    print_failure_details(&failures, &locale);
    print_run_status(&report, &locale);

    match finished.status {
        RunStatus::Passed => Ok(()),
        status => anyhow::bail!(t!("run_ended_with_status", locale = locale, status = status).to_string()),
    }
}

/// The suite file's `[run]` table overridden by command line flags.
/// 由命令行参数覆盖后的套件文件 `[run]` 表。
pub fn resolve_run_config(suite_config: &SuiteConfig, options: &RunOptions) -> Result<RunConfig> {
    let mut run_config = suite_config.run.clone();
    if let Some(base_url) = &options.base_url {
        run_config.base_url = config::expand_env(base_url)?;
    }
    if let Some(environment) = &options.environment {
        run_config.environment = environment.clone();
    }
    if options.concurrency.is_some() {
        run_config.concurrency = options.concurrency;
    }
    if options.timeout_ms.is_some() {
        run_config.timeout_ms = options.timeout_ms;
    }
    if run_config.base_url.trim().is_empty() {
        anyhow::bail!(t!("missing_base_url").to_string());
    }
    Ok(run_config)
}

/// Cancels the run on Ctrl-C. Cases already dispatched still finish.
fn setup_signal_handler(engine: Arc<Engine>, run_id: String, locale: &str) -> JoinHandle<()> {
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
            engine.cancel_run(&run_id);
        }
    })
}
