use api_runner::core::models::TestCase;
use api_runner::core::rules::{KeywordRuleInterpreter, RuleError, RuleInterpreter, RuleOutcome};
use api_runner::core::validator::ResponseValidator;
use api_runner::infra::http::HttpResponse;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
        ..Default::default()
    }
}

fn case_with_rules(rules: &[&str]) -> TestCase {
    TestCase {
        id: "case-1".to_string(),
        name: "rules".to_string(),
        validation: rules.iter().map(|r| r.to_string()).collect(),
        ..Default::default()
    }
}

fn expected(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[test]
fn test_matching_response_has_no_errors() {
    let case = case_with_rules(&["response has property id"]);
    let errors = ResponseValidator::default().validate(&response(200, r#"{"id": 42}"#), &case);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[test]
fn test_status_mismatch_is_reported_exactly() {
    let case = case_with_rules(&["response has property id"]);
    let errors = ResponseValidator::default().validate(&response(404, r#"{"id": 42}"#), &case);
    assert_eq!(errors, vec!["Expected status code 200 but got 404".to_string()]);
}

#[test]
fn test_status_mismatch_does_not_short_circuit_rules() {
    let case = case_with_rules(&["response has property id"]);
    let errors = ResponseValidator::default().validate(&response(500, r#"{"error": "boom"}"#), &case);
    assert_eq!(
        errors,
        vec![
            "Expected status code 200 but got 500".to_string(),
            "Validation failed: response has property id".to_string(),
        ]
    );
}

#[test]
fn test_non_numeric_value_fails_type_rule() {
    let case = case_with_rules(&["count is number"]);
    let errors = ResponseValidator::default().validate(&response(200, r#"{"count": "abc"}"#), &case);
    assert_eq!(errors, vec!["Validation failed: count is number".to_string()]);
}

#[test]
fn test_type_rule_accepts_any_numeric_value() {
    let case = case_with_rules(&["price is number", "total is integer", "ratio is integer"]);
    let errors = ResponseValidator::default().validate(
        &response(200, r#"{"price": 9.99, "total": 3, "ratio": 0.5}"#),
        &case,
    );
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[test]
fn test_existence_rule_treats_null_and_empty_string_as_missing() {
    let case = case_with_rules(&["has property name", "contains field email", "has property age"]);
    let errors = ResponseValidator::default().validate(
        &response(200, r#"{"name": null, "email": "", "age": 0}"#),
        &case,
    );
    assert_eq!(
        errors,
        vec![
            "Validation failed: has property name".to_string(),
            "Validation failed: contains field email".to_string(),
        ]
    );
}

#[test]
fn test_existence_rule_resolves_nested_paths() {
    let case = case_with_rules(&[
        "Check response has property data.items[0].id",
        "Check response contains field 'data.total'.",
    ]);
    let errors = ResponseValidator::default().validate(
        &response(200, r#"{"data": {"items": [{"id": 1}], "total": 1}}"#),
        &case,
    );
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[test]
fn test_rules_against_non_json_body_report_rule_errors() {
    let case = case_with_rules(&["response has property id", "count is number"]);
    let errors = ResponseValidator::default().validate(&response(200, "<html>oops</html>"), &case);
    assert_eq!(
        errors,
        vec![
            "Validation error for rule 'response has property id': response body is not valid JSON"
                .to_string(),
            "Validation error for rule 'count is number': response body is not valid JSON".to_string(),
        ]
    );
}

#[test]
fn test_unrecognized_rule_passes_by_default() {
    let case = case_with_rules(&["response time under 200ms"]);
    let errors = ResponseValidator::default().validate(&response(200, "{}"), &case);
    assert!(errors.is_empty());
}

#[test]
fn test_unrecognized_rule_fails_in_strict_mode() {
    let validator = ResponseValidator::new(Arc::new(KeywordRuleInterpreter), true);
    let case = case_with_rules(&["response time under 200ms"]);
    let errors = validator.validate(&response(200, "{}"), &case);
    assert_eq!(
        errors,
        vec!["Unrecognized validation rule: response time under 200ms".to_string()]
    );
}

#[test]
fn test_expected_response_is_skipped_without_rules() {
    let mut case = case_with_rules(&[]);
    case.expected_response = expected(json!({"id": 1}));
    let errors = ResponseValidator::default().validate(&response(200, r#"{"id": 2}"#), &case);
    assert!(errors.is_empty());
}

#[test]
fn test_expected_response_mismatches_in_declared_order() {
    let mut case = case_with_rules(&["response has property id"]);
    case.expected_response = expected(json!({
        "name": "Rex",
        "id": 1,
        "owner": "alice",
        "tags": ["a"],
    }));
    let errors = ResponseValidator::default().validate(
        &response(200, r#"{"id": 2, "name": "Rex", "tags": ["b"]}"#),
        &case,
    );
    assert_eq!(
        errors,
        vec![
            "Expected response.id to be 1 but got 2".to_string(),
            "Expected response.owner to be alice but got null".to_string(),
            r#"Expected response.tags to be ["a"] but got ["b"]"#.to_string(),
        ]
    );
}

#[test]
fn test_expected_response_compares_string_forms() {
    let mut case = case_with_rules(&["has property id"]);
    case.expected_response = expected(json!({"id": "7", "active": true}));
    let errors = ResponseValidator::default().validate(
        &response(200, r#"{"id": 7, "active": "true"}"#),
        &case,
    );
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[test]
fn test_error_order_is_status_then_rules_then_expected_response() {
    let mut case = case_with_rules(&["has property missing", "count is number"]);
    case.expected_status = 201;
    case.expected_response = expected(json!({"count": 5}));
    let errors = ResponseValidator::default().validate(&response(200, r#"{"count": "x"}"#), &case);
    assert_eq!(
        errors,
        vec![
            "Expected status code 201 but got 200".to_string(),
            "Validation failed: has property missing".to_string(),
            "Validation failed: count is number".to_string(),
            "Expected response.count to be 5 but got x".to_string(),
        ]
    );
}

#[derive(Debug)]
struct ExplodingInterpreter;

impl RuleInterpreter for ExplodingInterpreter {
    fn evaluate(&self, rule: &str, _body: Option<&Value>) -> Result<RuleOutcome, RuleError> {
        if rule.contains("explode") {
            Err(RuleError("interpreter blew up".to_string()))
        } else {
            Ok(RuleOutcome::Failed)
        }
    }
}

#[test]
fn test_rule_error_does_not_stop_later_rules() {
    let validator = ResponseValidator::new(Arc::new(ExplodingInterpreter), false);
    let case = case_with_rules(&["explode now", "anything else"]);
    let errors = validator.validate(&response(200, "{}"), &case);
    assert_eq!(
        errors,
        vec![
            "Validation error for rule 'explode now': interpreter blew up".to_string(),
            "Validation failed: anything else".to_string(),
        ]
    );
}
