// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_safety_core::{
    config::ValidatorConfig, context::SqlContext, pagination_plugin::NoPaginationFramework,
    risk::RiskLevel, rules::{self, CheckInput, Checker, Dispatch}, sql_text::normalize,
    validator::Validator, violation::ValidationResult
};

struct AlwaysFires {
    enabled: bool
}

impl Checker for AlwaysFires {
    fn rule_tag(&self) -> &'static str {
        "always_fires"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::RawText
    }

    fn check(&self, _input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.enabled {
            return;
        }
        result.add_violation(sql_safety_core::violation::Violation {
            risk:       RiskLevel::High,
            message:    "always fires".to_string(),
            suggestion: None,
            rule_tag:   "always_fires".to_string()
        });
    }
}

fn run_checker(checker: &dyn Checker, sql: &str) -> ValidationResult {
    let ctx = SqlContext::derive(sql, "t1");
    let statement = sql_safety_core::ast::Statement::unparsed(sql.to_string());
    let pagination = NoPaginationFramework;
    let input = CheckInput {
        ctx: &ctx,
        statement: &statement,
        pagination: &pagination
    };
    let mut result = ValidationResult::new();
    checker.check(&input, &mut result);
    result
}

#[test]
fn risk_is_the_max_of_its_violations_and_passed_mirrors_safe() {
    let mut result = ValidationResult::new();
    assert!(result.passed);
    assert_eq!(result.risk, RiskLevel::Safe);

    result.add_violation(sql_safety_core::violation::Violation {
        risk:       RiskLevel::Medium,
        message:    "x".to_string(),
        suggestion: None,
        rule_tag:   "x".to_string()
    });
    result.add_violation(sql_safety_core::violation::Violation {
        risk:       RiskLevel::Low,
        message:    "y".to_string(),
        suggestion: None,
        rule_tag:   "y".to_string()
    });
    assert_eq!(result.risk, RiskLevel::Medium);
    assert!(!result.passed);
}

#[test]
fn a_disabled_checker_never_produces_a_violation() {
    let checker = AlwaysFires {
        enabled: false
    };
    assert!(run_checker(&checker, "DELETE FROM users").is_empty());
}

#[test]
fn reordering_disabled_checkers_does_not_change_the_result() {
    let config = ValidatorConfig::default();
    let mut registry_a = rules::build_registry(&config.rules);
    let mut registry_b = rules::build_registry(&config.rules);
    registry_a.swap(0, 1);
    registry_b.swap(2, 3);

    let ctx = SqlContext::derive("SELECT * FROM users WHERE id = 1 LIMIT 10", "t1");
    let statement = sql_safety_core::parse::ParseFacade::new(sql_safety_core::parse::ParseMode::Strict)
        .parse(ctx.sql())
        .unwrap();
    let pagination = NoPaginationFramework;
    let input = CheckInput {
        ctx: &ctx,
        statement: &statement,
        pagination: &pagination
    };
    let a = rules::run(&registry_a, &input);
    let b = rules::run(&registry_b, &input);
    assert_eq!(a.risk, b.risk);
    assert_eq!(a.violations.len(), b.violations.len());
}

#[test]
fn validate_is_deterministic_across_repeated_calls() {
    let validator = Validator::new(ValidatorConfig::default()).unwrap();
    let ctx = SqlContext::derive("UPDATE orders SET status = 'x' WHERE status = 'y'", "t1");
    let first = validator.validate(&ctx).unwrap();
    let second = validator.validate(&ctx).unwrap();
    assert_eq!(first.risk, second.risk);
    let first_tags: Vec<_> = first.violations.iter().map(|v| v.rule_tag.clone()).collect();
    let second_tags: Vec<_> = second.violations.iter().map(|v| v.rule_tag.clone()).collect();
    assert_eq!(first_tags, second_tags);
}

#[test]
fn a_cache_hit_within_ttl_matches_a_fresh_computation() {
    let validator = Validator::new(ValidatorConfig::default()).unwrap();
    let ctx = SqlContext::derive("DELETE FROM users", "t1");
    let fresh = validator.validate(&ctx).unwrap();
    let cached = validator.validate(&ctx).unwrap();
    assert_eq!(fresh.risk, cached.risk);
    assert_eq!(fresh.violations.len(), cached.violations.len());
}

#[test]
fn normalization_collapses_whitespace_case_and_comment_differences() {
    let a = normalize("SELECT * FROM users -- note\nWHERE id = 1");
    let b = normalize("select   *\nfrom USERS where id=1");
    assert_eq!(a, b);
}

#[test]
fn normalization_is_idempotent() {
    let sql = "SELECT * FROM Users /* note */ WHERE id = 1";
    let once = normalize(sql);
    assert_eq!(normalize(&once), once);
}

#[test]
fn multi_statement_detection_ignores_semicolons_inside_string_literals() {
    assert!(!sql_safety_core::sql_text::has_significant_semicolon(
        "SELECT 'a;b' FROM t"
    ));
    assert!(sql_safety_core::sql_text::has_significant_semicolon(
        "SELECT 1; DROP TABLE t"
    ));
}

#[test]
fn wildcard_matches_one_segment_with_an_underscore_boundary() {
    let pattern = sql_safety_core::pattern::TablePattern::new("sys_*");
    assert!(pattern.matches("sys_user"));
    assert!(!pattern.matches("system"));
    assert!(!pattern.matches("sys_user_detail"));
}

#[test]
fn fixing_a_violation_makes_revalidation_pass() {
    let validator = Validator::new(ValidatorConfig::default()).unwrap();
    let broken = SqlContext::derive("DELETE FROM users", "t1");
    assert!(!validator.validate(&broken).unwrap().passed);

    let fixed = SqlContext::derive("DELETE FROM users WHERE id = 1", "t1");
    assert!(validator.validate(&fixed).unwrap().passed);
}
