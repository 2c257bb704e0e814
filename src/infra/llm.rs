//! # Text Generation Module / 文本生成模块
//!
//! The client used to turn a run's failures into improvement suggestions.
//! The engine only needs "prompt in, text out"; the bundled implementation
//! talks to an Ollama-compatible `/generate` endpoint.
//!
//! 用于将一次运行的失败转化为改进建议的客户端。引擎只需要"输入提示、输出文本"；
//! 自带的实现对接兼容 Ollama 的 `/generate` 端点。

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::core::config::GeneratorSettings;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Failed to communicate with the text generator: {0}")]
    Request(String),
    #[error("Text generator returned status {0}")]
    Status(u16),
    #[error("Failed to decode text generator reply: {0}")]
    Decode(String),
    #[error("Empty response from the text generator")]
    Empty,
}

/// Produces free text from a prompt.
/// 根据提示生成自由文本。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Client for an Ollama-compatible generation API.
/// 兼容 Ollama 生成 API 的客户端。
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(settings: &GeneratorSettings) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| GeneratorError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/generate", settings.url.trim_end_matches('/')),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "calling text generator");

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                top_p: 0.9,
                num_predict: 2048,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeneratorError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeneratorError::Status(response.status().as_u16()));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Decode(e.to_string()))?;

        match reply.response {
            Some(text) => {
                debug!(reply_len = text.len(), "text generator replied");
                Ok(text)
            }
            None => Err(GeneratorError::Empty),
        }
    }
}

/// Wraps serialized test results in the improvement-suggestion prompt.
/// 将序列化后的测试结果包装进改进建议提示中。
pub fn improvement_prompt(test_results: &str) -> String {
    format!(
        "You are an API testing expert. Given the following test results, suggest improvements to the test suite.\n\
         Focus on enhancing coverage, finding edge cases, and improving test reliability.\n\
         \n\
         TEST RESULTS:\n\
         {test_results}\n\
         \n\
         Provide your suggestions in a clear, actionable format.\n"
    )
}
