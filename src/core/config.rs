//! # Configuration Module / 配置模块
//!
//! Parsing of the `ApiSuite.toml` file: engine settings, the text-generation
//! service, the suite definition, the default run configuration and the list
//! of test cases.
//!
//! 解析 `ApiSuite.toml` 文件：引擎设置、文本生成服务、套件定义、
//! 默认运行配置以及测试用例列表。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::error::{EngineError, Result};
use crate::core::models::{Headers, RunConfig, TestCase, TestSuite};

/// The default name of the suite configuration file.
/// 套件配置文件的默认名称。
pub const CONFIG_FILE_NAME: &str = "ApiSuite.toml";

/// Engine-wide execution limits.
/// 引擎级别的执行限制。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Per-case timeout used when a run does not override it.
    /// 运行未覆盖时使用的单用例超时。
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// Upper bound for any run's worker count.
    /// 任何运行的工作者数量上限。
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Worker count used when a run does not request one.
    #[serde(default = "default_concurrency")]
    pub default_concurrency: usize,
    /// Fail rules the interpreter does not recognize instead of passing them.
    /// 对解释器无法识别的规则判定失败，而不是放行。
    #[serde(default)]
    pub strict_rules: bool,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrency() -> usize {
    10
}

fn default_concurrency() -> usize {
    5
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            default_concurrency: default_concurrency(),
            strict_rules: false,
        }
    }
}

impl RunnerSettings {
    /// Effective worker count: the request (or the default), clamped to the
    /// configured maximum and never below one.
    ///
    /// 有效工作者数量：请求值（或默认值），限制在配置的最大值内且不小于 1。
    pub fn resolve_workers(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_concurrency)
            .min(self.max_concurrency)
            .max(1)
    }

    /// Effective per-case timeout / 有效的单用例超时
    pub fn resolve_timeout(&self, requested: Option<u64>) -> Duration {
        Duration::from_millis(requested.unwrap_or(self.default_timeout_ms))
    }
}

/// Connection settings of the text-generation service used for insights.
/// 用于生成洞察的文本生成服务的连接设置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default = "default_generator_url")]
    pub url: String,
    #[serde(default = "default_generator_model")]
    pub model: String,
    #[serde(default = "default_generator_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_generator_url() -> String {
    "http://localhost:11434/api".to_string()
}

fn default_generator_model() -> String {
    "deepseek-r1:1.5b".to_string()
}

fn default_generator_timeout_ms() -> u64 {
    120_000
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            url: default_generator_url(),
            model: default_generator_model(),
            timeout_ms: default_generator_timeout_ms(),
        }
    }
}

/// The `[suite]` table / `[suite]` 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteSettings {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Represents the whole configuration file, loaded from TOML.
/// 代表从 TOML 加载的整个配置文件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub runner: RunnerSettings,
    #[serde(default)]
    pub generator: GeneratorSettings,
    pub suite: SuiteSettings,
    /// Default run configuration; command line flags override it.
    /// 默认运行配置；命令行参数会覆盖它。
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

fn default_language() -> String {
    "en".to_string()
}

impl SuiteConfig {
    /// Parses a configuration from TOML text and normalizes it.
    /// 从 TOML 文本解析配置并进行规范化。
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: SuiteConfig =
            toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.normalize()?;
        Ok(config)
    }

    /// Fills in generated case identifiers, binds cases to the suite and
    /// expands environment variables in the base URL and header values.
    fn normalize(&mut self) -> Result<()> {
        if self.suite.id.trim().is_empty() {
            return Err(EngineError::Config("suite.id must not be empty".into()));
        }
        self.run.base_url = expand_env(&self.run.base_url)?;
        self.run.headers = expand_headers(&self.run.headers)?;

        for (index, case) in self.cases.iter_mut().enumerate() {
            if case.id.trim().is_empty() {
                case.id = format!("case-{}", index + 1);
            }
            case.suite_id = self.suite.id.clone();
            case.headers = expand_headers(&case.headers)?;
        }
        Ok(())
    }

    /// The suite entity described by this file.
    pub fn test_suite(&self) -> TestSuite {
        TestSuite {
            id: self.suite.id.clone(),
            name: self.suite.name.clone(),
            description: self.suite.description.clone(),
            api_spec: None,
            case_ids: self.cases.iter().map(|c| c.id.clone()).collect(),
        }
    }
}

/// Loads and parses a suite configuration file.
/// 加载并解析套件配置文件。
pub fn load_suite_config(path: &Path) -> Result<SuiteConfig> {
    let content = fs::read_to_string(path)?;
    SuiteConfig::from_toml_str(&content)
}

/// Expands `$VAR` and `${VAR}` references from the process environment.
/// 从进程环境中展开 `$VAR` 与 `${VAR}` 引用。
pub fn expand_env(input: &str) -> Result<String> {
    shellexpand::env(input)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| EngineError::Config(format!("cannot expand `{input}`: {e}")))
}

fn expand_headers(headers: &Headers) -> Result<Headers> {
    headers
        .iter()
        .map(|(key, value)| Ok((key.clone(), expand_env(value)?)))
        .collect()
}
