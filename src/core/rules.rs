//! # Validation Rule Interpreter / 校验规则解释器
//!
//! Validation rules are free-text sentences such as `"response has property id"`
//! or `"count is number"`. They are interpreted by keyword matching, not by a
//! grammar. The [`RuleInterpreter`] trait isolates that matching so another
//! rule format can be plugged into the validator later.
//!
//! 校验规则是诸如 `"response has property id"` 或 `"count is number"` 的自由文本。
//! 它们通过关键字匹配而非语法进行解释。[`RuleInterpreter`] trait 隔离了这种匹配，
//! 以便日后可以向校验器接入其他规则格式。
//!
//! ## Recognized families / 已识别的规则族
//!
//! - Existence: `has property <path>`, `contains field <path>`
//! - Type: `<path> is number`, `<path> is integer` (any numeric value passes)

use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

/// Outcome of evaluating one rule.
/// 评估单条规则的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Passed,
    Failed,
    /// The rule matched no known family.
    /// 规则未匹配任何已知规则族。
    Unrecognized,
}

/// An error raised while evaluating a rule, reported against that rule only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct RuleError(pub String);

/// Interprets validation rules against a response body.
/// 针对响应体解释校验规则。
pub trait RuleInterpreter: Send + Sync + Debug {
    /// Evaluates `rule`. `body` is `None` when the response body is not JSON.
    /// 评估 `rule`。当响应体不是 JSON 时 `body` 为 `None`。
    fn evaluate(&self, rule: &str, body: Option<&Value>) -> Result<RuleOutcome, RuleError>;
}

const EXISTENCE_KEYWORDS: [&str; 2] = ["has property", "contains field"];
const TYPE_KEYWORDS: [&str; 2] = ["is number", "is integer"];

/// The keyword-matching interpreter for the legacy sentence rules.
/// 针对旧式语句规则的关键字匹配解释器。
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordRuleInterpreter;

impl RuleInterpreter for KeywordRuleInterpreter {
    fn evaluate(&self, rule: &str, body: Option<&Value>) -> Result<RuleOutcome, RuleError> {
        if EXISTENCE_KEYWORDS.iter().any(|k| rule.contains(k)) {
            let body = json_body(body)?;
            let present = token_after(rule, &["property", "field"])
                .and_then(|path| resolve_path(body, &path))
                .is_some_and(is_present);
            return Ok(outcome(present));
        }

        if TYPE_KEYWORDS.iter().any(|k| rule.contains(k)) {
            let body = json_body(body)?;
            let numeric = token_before_is(rule)
                .and_then(|path| resolve_path(body, &path))
                .is_some_and(Value::is_number);
            return Ok(outcome(numeric));
        }

        Ok(RuleOutcome::Unrecognized)
    }
}

fn outcome(passed: bool) -> RuleOutcome {
    if passed {
        RuleOutcome::Passed
    } else {
        RuleOutcome::Failed
    }
}

fn json_body(body: Option<&Value>) -> Result<&Value, RuleError> {
    body.ok_or_else(|| RuleError("response body is not valid JSON".to_string()))
}

/// A value is present unless it is `null` or an empty string.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Strips punctuation from a path token, keeping separators used by paths.
/// 去除路径标记中的标点，保留路径使用的分隔符。
fn clean_token(token: &str) -> Option<String> {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// The token immediately following the first of `keywords`.
fn token_after(rule: &str, keywords: &[&str]) -> Option<String> {
    let words: Vec<&str> = rule.split_whitespace().collect();
    let position = words.iter().position(|w| keywords.contains(w))?;
    words.get(position + 1).and_then(|w| clean_token(w))
}

/// The token immediately preceding the `is` of an `is number`/`is integer` phrase.
fn token_before_is(rule: &str) -> Option<String> {
    let words: Vec<&str> = rule.split_whitespace().collect();
    let position = words.windows(2).position(|pair| {
        pair[0] == "is" && (pair[1].starts_with("number") || pair[1].starts_with("integer"))
    })?;
    if position == 0 {
        return None;
    }
    clean_token(words[position - 1])
}

/// Resolves a dotted path (`data.items[0].id` or `data.items.0.id`) in a JSON value.
/// 在 JSON 值中解析点分路径（`data.items[0].id` 或 `data.items.0.id`）。
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let normalized = path.replace('[', ".").replace(']', "");
    normalized
        .split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}
