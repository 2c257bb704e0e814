//! # HTTP Transport Module / HTTP 传输模块
//!
//! The "send a request, get status/headers/body" contract used by the case
//! executor, and its `reqwest` implementation. Connection pooling, TLS and
//! redirects are the client library's business.
//!
//! 用例执行器使用的"发送请求、获取状态/头部/响应体"契约及其 `reqwest` 实现。
//! 连接池、TLS 与重定向由客户端库负责。

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::core::models::{Headers, HttpMethod};

/// A fully resolved request / 一个已完全解析的请求
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Value>,
    /// Applies to connecting and to reading the response.
    /// 同时作用于建立连接与读取响应。
    pub timeout: Duration,
}

/// What came back from the target service / 目标服务返回的内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

/// Transport-level failures. Always recovered into a failed test result.
/// 传输层失败。总是被恢复为失败的测试结果。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out after {0} ms")]
    Timeout(u64),
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Failed to read response: {0}")]
    Body(String),
    #[error("Request failed: {0}")]
    Other(String),
}

/// Sends one HTTP request.
/// 发送一个 HTTP 请求。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport sharing one connection pool across cases.
/// 基于 `reqwest` 的传输，在所有用例间共享一个连接池。
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the client. `connect_timeout` bounds connection setup for every
    /// request; each request additionally carries its own total timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|err| TransportError::Other(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout_ms = request.timeout.as_millis() as u64;
        let headers = build_headers(&request.headers)?;

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .headers(headers)
            .timeout(request.timeout);

        if request.method != HttpMethod::Head {
            builder = match &request.body {
                Some(Value::String(text)) => builder.body(text.clone()),
                Some(body) => builder.json(body),
                None => builder,
            };
        }

        let response = builder
            .send()
            .await
            .map_err(|err| classify(err, timeout_ms))?;

        let status = response.status().as_u16();
        let mut response_headers = Headers::new();
        for (key, value) in response.headers() {
            let value = value.to_str().unwrap_or("<binary>");
            response_headers
                .entry(key.to_string())
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let bytes = response.bytes().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout(timeout_ms)
            } else {
                TransportError::Body(err.to_string())
            }
        })?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

fn classify(err: reqwest::Error, timeout_ms: u64) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout_ms)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

/// Converts a header map into `reqwest` headers, rejecting invalid names or values.
/// 将头部映射转换为 `reqwest` 头部，拒绝无效的名称或值。
pub fn build_headers(input: &Headers) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        if key.is_empty() {
            continue;
        }

        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
            TransportError::InvalidRequest(format!("Invalid header name `{key}`: {err}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            TransportError::InvalidRequest(format!("Invalid header value for `{key}`: {err}"))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}
