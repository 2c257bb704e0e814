//! # Response Validator / 响应校验器
//!
//! Checks an HTTP response against a test case: status code first, then the
//! declared validation rules in order, then the expected-response fragment.
//! Every check runs; errors accumulate in that deterministic order.
//!
//! 根据测试用例检查 HTTP 响应：先检查状态码，再按顺序检查声明的校验规则，
//! 最后检查期望响应片段。所有检查都会执行，错误按该确定顺序累积。

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::core::models::TestCase;
use crate::core::rules::{resolve_path, KeywordRuleInterpreter, RuleInterpreter, RuleOutcome};
use crate::infra::http::HttpResponse;

/// Applies status, rule and expected-response checks.
/// 应用状态码、规则与期望响应检查。
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    interpreter: Arc<dyn RuleInterpreter>,
    strict_rules: bool,
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new(Arc::new(KeywordRuleInterpreter), false)
    }
}

impl ResponseValidator {
    pub fn new(interpreter: Arc<dyn RuleInterpreter>, strict_rules: bool) -> Self {
        Self {
            interpreter,
            strict_rules,
        }
    }

    /// Validates `response` against `case` and returns every error found.
    /// An empty list means the response satisfied the case.
    ///
    /// 根据 `case` 校验 `response` 并返回发现的所有错误。
    /// 空列表表示响应满足该用例。
    pub fn validate(&self, response: &HttpResponse, case: &TestCase) -> Vec<String> {
        let mut errors = Vec::new();

        if response.status != case.expected_status {
            errors.push(format!(
                "Expected status code {} but got {}",
                case.expected_status, response.status
            ));
        }

        if case.validation.is_empty() {
            return errors;
        }

        let body = parse_body(&response.body);

        for rule in &case.validation {
            match self.interpreter.evaluate(rule, body.as_ref()) {
                Ok(RuleOutcome::Passed) => {}
                Ok(RuleOutcome::Failed) => errors.push(format!("Validation failed: {rule}")),
                Ok(RuleOutcome::Unrecognized) => {
                    warn!(case = %case.id, rule = %rule, "unrecognized validation rule");
                    if self.strict_rules {
                        errors.push(format!("Unrecognized validation rule: {rule}"));
                    }
                }
                Err(e) => errors.push(format!("Validation error for rule '{rule}': {e}")),
            }
        }

        if let Some(expected) = &case.expected_response {
            for (key, expected_value) in expected {
                let actual = body
                    .as_ref()
                    .and_then(|b| resolve_path(b, key))
                    .filter(|v| !v.is_null());
                let expected_str = string_form(expected_value);
                match actual {
                    Some(actual) if string_form(actual) == expected_str => {}
                    Some(actual) => errors.push(format!(
                        "Expected response.{key} to be {expected_str} but got {}",
                        string_form(actual)
                    )),
                    None => errors.push(format!(
                        "Expected response.{key} to be {expected_str} but got null"
                    )),
                }
            }
        }

        errors
    }
}

/// Parses the body as JSON. An empty body is treated as `null`.
fn parse_body(raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return Some(Value::Null);
    }
    serde_json::from_str(raw).ok()
}

/// String form used for comparisons: bare text for strings, JSON otherwise.
/// 用于比较的字符串形式：字符串取原文，其余取 JSON 表示。
fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
