//! # Suite Initialization Module / 套件初始化模块
//!
//! This module creates a new `ApiSuite.toml`, either from a commented
//! template or through an interactive command-line wizard that asks for the
//! suite, the target service and a selection of starter cases.
//!
//! 此模块创建新的 `ApiSuite.toml`：可以基于带注释的模板，
//! 也可以通过交互式命令行向导询问套件、目标服务以及一组起始用例。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};
use serde_json::json;
use std::path::Path;

use crate::core::config::{SuiteConfig, SuiteSettings};
use crate::core::models::{RunConfig, TestCase};
use crate::infra::fs::write_new_file;
use crate::infra::t;

/// The file written by `init --non-interactive`.
pub const DEFAULT_CONFIG: &str = r#"# API Suite Configuration / API 套件配置

# Language for output messages / 输出消息的语言
language = "en"

# Engine limits / 引擎限制
[runner]
default_timeout_ms = 30000
max_concurrency = 10
default_concurrency = 5
# Fail unrecognized validation rules instead of passing them
# 对无法识别的校验规则判定失败，而不是放行
strict_rules = false

# Text generation service used by `run --insights` / `run --insights` 使用的文本生成服务
[generator]
url = "http://localhost:11434/api"
model = "deepseek-r1:1.5b"
timeout_ms = 120000

[suite]
id = "example-api"
name = "Example API"
description = "Starter suite generated by api-runner init"

# Default run configuration, overridable from the command line
# 默认运行配置，可通过命令行覆盖
# Header values may reference environment variables, e.g. "Bearer ${API_TOKEN}"
# 头部值可以引用环境变量，例如 "Bearer ${API_TOKEN}"
[run]
environment = "local"
base_url = "http://localhost:8080"
headers = { Accept = "application/json" }
concurrency = 5

[[cases]]
id = "health"
name = "Health check responds"
method = "GET"
endpoint = "/health"
expected_status = 200
category = "positive"

[[cases]]
id = "create-item"
name = "Create item"
method = "POST"
endpoint = "/items"
headers = { Content-Type = "application/json" }
body = { name = "example" }
expected_status = 201
expected_response = { name = "example" }
validation = ["Check response has property id", "Verify id is number"]
category = "positive"

[[cases]]
id = "missing-item"
name = "Unknown item is not found"
method = "GET"
endpoint = "/items/does-not-exist"
expected_status = 404
category = "negative"
"#;

/// Runs the init command: writes the template directly when
/// `non_interactive` is set, otherwise asks the user step by step.
///
/// 运行 init 命令：设置 `non_interactive` 时直接写入模板，否则逐步询问用户。
pub fn run_init_wizard(output: &Path, language: &str, non_interactive: bool, force: bool) -> Result<()> {
    let theme = ColorfulTheme::default();

    if non_interactive {
        return write_config(output, DEFAULT_CONFIG, force, language);
    }

    println!("\n{}", t!("init_wizard_welcome", locale = language).cyan().bold());
    println!("{}", t!("init_wizard_description", locale = language));

    let mut force = force;
    if output.exists() && !force {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init_overwrite_prompt", locale = language, path = output.display()))
            .default(false)
            .interact()
            .context(t!("init_user_confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init_aborted", locale = language));
            return Ok(());
        }
        force = true;
    }

    let suite_id: String = Input::with_theme(&theme)
        .with_prompt(t!("init_suite_id_prompt", locale = language))
        .default("example-api".to_string())
        .interact_text()?;
    let suite_name: String = Input::with_theme(&theme)
        .with_prompt(t!("init_suite_name_prompt", locale = language))
        .default("Example API".to_string())
        .interact_text()?;
    let base_url: String = Input::with_theme(&theme)
        .with_prompt(t!("init_base_url_prompt", locale = language))
        .default("http://localhost:8080".to_string())
        .interact_text()?;

    let options = vec![
        ("health", t!("init_template_health", locale = language)),
        ("create", t!("init_template_create", locale = language)),
        ("not_found", t!("init_template_not_found", locale = language)),
    ];

    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init_case_selection_prompt", locale = language))
        .items(&options.iter().map(|o| o.1.clone()).collect::<Vec<_>>())
        .interact()
        .context(t!("init_user_confirmation_failed", locale = language).to_string())?;

    if selections.is_empty() {
        println!("{}", t!("init_no_cases_selected", locale = language).yellow());
    }

    let cases = selections
        .into_iter()
        .filter_map(|i| starter_case(options[i].0))
        .collect();

    let suite_config = SuiteConfig {
        language: language.to_string(),
        runner: Default::default(),
        generator: Default::default(),
        suite: SuiteSettings {
            id: suite_id,
            name: suite_name,
            description: String::new(),
        },
        run: RunConfig {
            environment: "local".to_string(),
            base_url,
            ..Default::default()
        },
        cases,
    };

    let content = format!(
        "# API Suite Configuration / API 套件配置\n\n{}",
        toml::to_string_pretty(&suite_config).context("Failed to serialize configuration")?
    );
    write_config(output, &content, force, language)
}

/// One of the starter cases offered by the wizard.
/// 向导提供的起始用例之一。
fn starter_case(key: &str) -> Option<TestCase> {
    let case = match key {
        "health" => TestCase {
            id: "health".to_string(),
            name: "Health check responds".to_string(),
            endpoint: "/health".to_string(),
            category: Some("positive".to_string()),
            ..Default::default()
        },
        "create" => TestCase {
            id: "create-item".to_string(),
            name: "Create item".to_string(),
            method: "POST".to_string(),
            endpoint: "/items".to_string(),
            body: Some(json!({ "name": "example" })),
            expected_status: 201,
            validation: vec!["Check response has property id".to_string()],
            category: Some("positive".to_string()),
            ..Default::default()
        },
        "not_found" => TestCase {
            id: "missing-item".to_string(),
            name: "Unknown item is not found".to_string(),
            endpoint: "/items/does-not-exist".to_string(),
            expected_status: 404,
            category: Some("negative".to_string()),
            ..Default::default()
        },
        _ => return None,
    };
    Some(case)
}

fn write_config(path: &Path, content: &str, force: bool, language: &str) -> Result<()> {
    let written = write_new_file(path, content, force)
        .with_context(|| t!("init_write_failed", locale = language, path = path.display()).to_string())?;

    if written {
        println!("{}", t!("init_success", locale = language, path = path.display()).green());
        println!("{}", t!("init_next_steps", locale = language));
    } else {
        println!("{}", t!("init_file_exists", locale = language, path = path.display()).red());
        println!("{}", t!("init_use_force", locale = language).yellow());
    }
    Ok(())
}
