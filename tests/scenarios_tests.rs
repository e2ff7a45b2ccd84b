// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_safety_core::{
    config::ValidatorConfig, context::SqlContext, risk::RiskLevel, validator::Validator
};

fn validator() -> Validator {
    Validator::new(ValidatorConfig::default()).unwrap()
}

#[test]
fn s1_delete_without_where_is_critical() {
    let ctx = SqlContext::derive("DELETE FROM users", "s1");
    let result = validator().validate(&ctx).unwrap();
    assert!(!result.passed);
    assert_eq!(result.risk, RiskLevel::Critical);
    assert!(result.violations.iter().any(|v| v.rule_tag == "no_where_clause"));
}

#[test]
fn s2_tautology_over_low_cardinality_column_is_high() {
    let ctx = SqlContext::derive("SELECT * FROM user WHERE 1=1 AND status=1", "s2");
    let result = validator().validate(&ctx).unwrap();
    assert!(!result.passed);
    assert_eq!(result.risk, RiskLevel::High);
    assert!(result.violations.iter().any(|v| v.rule_tag == "dummy_condition"));
    assert!(result.violations.iter().any(|v| v.rule_tag == "blacklist_fields"));
}

#[test]
fn s3_denied_wildcard_table_plus_unallowed_union_aggregate_to_critical() {
    let validator = validator();
    let ctx = SqlContext::derive("SELECT * FROM sys_user UNION SELECT * FROM system", "s3");
    let result = validator.validate(&ctx).unwrap();
    assert!(!result.passed);
    assert_eq!(result.risk, RiskLevel::Critical);

    let denied: Vec<_> = result.violations.iter().filter(|v| v.rule_tag == "denied_table").collect();
    assert_eq!(denied.len(), 1, "sys_* must match sys_user but not system");
    assert_eq!(denied[0].risk, RiskLevel::Critical);
    assert!(denied[0].message.contains("sys_user"));

    let set_op = result.violations.iter().find(|v| v.rule_tag == "set_operation").unwrap();
    assert_eq!(set_op.risk, RiskLevel::High);
}

#[test]
fn s4_multi_statement_is_flagged_in_lenient_mode() {
    let mut config = ValidatorConfig::default();
    config.parser.lenient = true;
    let validator = Validator::new(config).unwrap();
    let ctx = SqlContext::derive("SELECT * FROM users WHERE id = 1; DROP TABLE users --", "s4");
    let result = validator.validate(&ctx).unwrap();
    assert!(!result.passed);
    assert_eq!(result.risk, RiskLevel::Critical);
    assert!(result.violations.iter().any(|v| v.rule_tag == "multi_statement"));
}

#[test]
fn s4_strict_mode_demotes_an_unrecognized_statement_to_an_unparseable_sql_violation() {
    // §4.6 step 3's companion to S4: when the configured dialect rejects a
    // statement outright in strict mode, the validator still returns a
    // result rather than propagating a parse error — a single
    // `unparseable_sql` violation at the configured risk.
    let validator = validator();
    let ctx = SqlContext::derive("SELEC * FRM users", "s4-strict");
    let result = validator.validate(&ctx).unwrap();
    assert!(!result.passed);
    assert_eq!(result.risk, RiskLevel::Critical);
    assert!(result.violations.iter().any(|v| v.rule_tag == "unparseable_sql"));
}

#[test]
fn s5_dangerous_function_call_is_critical() {
    let ctx = SqlContext::derive("SELECT id, LOAD_FILE('/etc/passwd') FROM users WHERE id=1", "s5");
    let result = validator().validate(&ctx).unwrap();
    assert!(!result.passed);
    assert_eq!(result.risk, RiskLevel::Critical);
    assert!(result.violations.iter().any(|v| v.rule_tag == "dangerous_function"));
}

#[test]
fn s6_deep_offset_is_medium() {
    let ctx = SqlContext::derive("SELECT * FROM users WHERE id=1 LIMIT 10 OFFSET 50000", "s6");
    let result = validator().validate(&ctx).unwrap();
    assert!(!result.passed);
    assert_eq!(result.risk, RiskLevel::Medium);
    assert!(result.violations.iter().any(|v| v.rule_tag == "deep_pagination"));
}
