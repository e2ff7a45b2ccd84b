//! §4.3(b) — pagination hygiene: `LogicalPagination`, `NoConditionPagination`,
//! `DeepPagination`, `LargePageSize`, `MissingOrderBy`, `NoPagination`.

use crate::{
    ast::Statement,
    config::{
        DeepPaginationConfig, LargePageSizeConfig, LogicalPaginationConfig, MissingOrderByConfig,
        NoConditionPaginationConfig, NoPaginationConfig
    },
    risk::RiskLevel,
    rules::{where_integrity::BlacklistFields, CheckInput, Checker, Dispatch},
    violation::{ValidationResult, Violation}
};

/// A caller-supplied signal (`ctx.parameters()["logical_pagination"]`) that
/// the framework believes it is paginating this statement, even though no
/// physical `LIMIT`/`OFFSET` rewrite took place. The core has no opinion on
/// how a host populates this; it only reads it.
fn claims_logical_pagination(ctx: &crate::context::SqlContext) -> bool {
    ctx.parameters()
        .and_then(|params| params.get("logical_pagination"))
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

/// Triggers when the host claims logical (application-level) pagination but
/// has no [`crate::pagination_plugin::PaginationPluginDetector`] reporting a
/// genuine physical rewrite — the query will be fetched in full regardless
/// of what the framework believes.
pub struct LogicalPagination {
    config: LogicalPaginationConfig
}

impl LogicalPagination {
    pub fn new(config: LogicalPaginationConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for LogicalPagination {
    fn rule_tag(&self) -> &'static str {
        "logical_pagination"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled || !matches!(input.statement, Statement::Select(_)) {
            return;
        }
        if claims_logical_pagination(input.ctx) && !input.pagination.has_physical_pagination(input.ctx) {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    "logical_pagination: framework claims pagination but no physical rewriter is installed"
                    .to_string(),
                suggestion: Some("install a physical LIMIT/OFFSET pagination plugin for this datasource".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// `LIMIT` without any `WHERE` is still a full table scan, just truncated on
/// the way out.
pub struct NoConditionPagination {
    config: NoConditionPaginationConfig
}

impl NoConditionPagination {
    pub fn new(config: NoConditionPaginationConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for NoConditionPagination {
    fn rule_tag(&self) -> &'static str {
        "no_condition_pagination"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        let Statement::Select(select) = input.statement else {
            return;
        };
        if self.config.enabled && select.limit.is_some() && !select.where_present {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    "no_condition_pagination: LIMIT without WHERE still scans the whole table".to_string(),
                suggestion: Some("add a WHERE clause before paginating".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// `OFFSET` beyond `max_offset`: the database still has to walk and discard
/// every skipped row.
pub struct DeepPagination {
    config: DeepPaginationConfig
}

impl DeepPagination {
    pub fn new(config: DeepPaginationConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for DeepPagination {
    fn rule_tag(&self) -> &'static str {
        "deep_pagination"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        let Statement::Select(select) = input.statement else {
            return;
        };
        if let Some(offset) = select.offset
            && self.config.enabled
            && offset > self.config.max_offset
        {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    format!(
                    "deep_pagination: OFFSET {offset} exceeds the configured maximum of {}",
                    self.config.max_offset
                ),
                suggestion: Some("use keyset (seek) pagination instead of a large OFFSET".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// `LIMIT` beyond `max_page_size`: an over-large page defeats the purpose of
/// paginating at all.
pub struct LargePageSize {
    config: LargePageSizeConfig
}

impl LargePageSize {
    pub fn new(config: LargePageSizeConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for LargePageSize {
    fn rule_tag(&self) -> &'static str {
        "large_page_size"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        let Statement::Select(select) = input.statement else {
            return;
        };
        if let Some(limit) = select.limit
            && self.config.enabled
            && limit > self.config.max_page_size
        {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    format!(
                    "large_page_size: LIMIT {limit} exceeds the configured maximum of {}",
                    self.config.max_page_size
                ),
                suggestion: Some("reduce the page size".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// A paginated `SELECT` without `ORDER BY` has no stable row order across
/// pages — rows can be skipped or repeated as the underlying table changes.
pub struct MissingOrderBy {
    config: MissingOrderByConfig
}

impl MissingOrderBy {
    pub fn new(config: MissingOrderByConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for MissingOrderBy {
    fn rule_tag(&self) -> &'static str {
        "missing_order_by"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        let Statement::Select(select) = input.statement else {
            return;
        };
        if self.config.enabled && select.limit.is_some() && !select.has_order_by {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    "missing_order_by: paginated SELECT has no ORDER BY, page contents are unstable"
                    .to_string(),
                suggestion: Some("add a deterministic ORDER BY".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// `SELECT` with no `LIMIT` at all: risk is stratified by how selective the
/// (absent or blacklist-only) `WHERE` clause is.
pub struct NoPagination {
    config:            NoPaginationConfig,
    blacklist_columns: Vec<String>
}

impl NoPagination {
    pub fn new(config: NoPaginationConfig, blacklist_columns: Vec<String>) -> Self {
        Self {
            config,
            blacklist_columns
        }
    }
}

impl Checker for NoPagination {
    fn rule_tag(&self) -> &'static str {
        "no_pagination"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        let Statement::Select(select) = input.statement else {
            return;
        };
        if !self.config.enabled || select.limit.is_some() {
            return;
        }
        let risk = if !select.where_present {
            RiskLevel::Critical
        } else if BlacklistFields::only_blacklisted(&select.where_cols, &self.blacklist_columns) {
            RiskLevel::High
        } else {
            self.config.risk
        };
        result.add_violation(Violation {
            risk,
            message: "no_pagination: SELECT has no LIMIT".to_string(),
            suggestion: Some("add a LIMIT clause".to_string()),
            rule_tag: self.rule_tag().to_string()
        });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        context::SqlContext, pagination_plugin::{NoPaginationFramework, PaginationPluginDetector},
        parse::{ParseFacade, ParseMode}
    };

    fn statement_for(sql: &str) -> Statement {
        ParseFacade::new(ParseMode::Strict).parse(sql).unwrap()
    }

    fn run_one(checker: &dyn Checker, ctx: &SqlContext) -> ValidationResult {
        let statement = statement_for(ctx.sql());
        let pagination = NoPaginationFramework;
        let input = CheckInput {
            ctx,
            statement: &statement,
            pagination: &pagination
        };
        let mut result = ValidationResult::new();
        checker.check(&input, &mut result);
        result
    }

    #[test]
    fn deep_pagination_triggers_past_the_default_offset() {
        let checker = DeepPagination::new(DeepPaginationConfig::default());
        let ctx = SqlContext::derive("SELECT * FROM users WHERE id=1 LIMIT 10 OFFSET 50000", "t1");
        let result = run_one(&checker, &ctx);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].risk, RiskLevel::Medium);
    }

    #[test]
    fn deep_pagination_passes_within_the_default_offset() {
        let checker = DeepPagination::new(DeepPaginationConfig::default());
        let ctx = SqlContext::derive("SELECT * FROM users WHERE id=1 LIMIT 10 OFFSET 10", "t1");
        assert!(run_one(&checker, &ctx).is_empty());
    }

    #[test]
    fn large_page_size_triggers_past_the_default_limit() {
        let checker = LargePageSize::new(LargePageSizeConfig::default());
        let ctx = SqlContext::derive("SELECT * FROM users WHERE id=1 LIMIT 5000", "t1");
        assert_eq!(run_one(&checker, &ctx).violations.len(), 1);
    }

    #[test]
    fn missing_order_by_triggers_on_paginated_select_without_order_by() {
        let checker = MissingOrderBy::new(MissingOrderByConfig::default());
        let ctx = SqlContext::derive("SELECT * FROM users WHERE id=1 LIMIT 10", "t1");
        assert_eq!(run_one(&checker, &ctx).violations.len(), 1);
    }

    #[test]
    fn missing_order_by_passes_when_order_by_present() {
        let checker = MissingOrderBy::new(MissingOrderByConfig::default());
        let ctx = SqlContext::derive("SELECT * FROM users WHERE id=1 ORDER BY id LIMIT 10", "t1");
        assert!(run_one(&checker, &ctx).is_empty());
    }

    #[test]
    fn no_condition_pagination_triggers_on_limit_without_where() {
        let checker = NoConditionPagination::new(NoConditionPaginationConfig::default());
        let ctx = SqlContext::derive("SELECT * FROM users LIMIT 10", "t1");
        assert_eq!(run_one(&checker, &ctx).violations.len(), 1);
    }

    #[test]
    fn no_pagination_escalates_to_critical_without_where() {
        let checker = NoPagination::new(NoPaginationConfig::default(), vec!["status".to_string()]);
        let ctx = SqlContext::derive("SELECT * FROM users", "t1");
        let result = run_one(&checker, &ctx);
        assert_eq!(result.violations[0].risk, RiskLevel::Critical);
    }

    #[test]
    fn no_pagination_escalates_to_high_for_blacklist_only_where() {
        let checker = NoPagination::new(NoPaginationConfig::default(), vec!["status".to_string()]);
        let ctx = SqlContext::derive("SELECT * FROM users WHERE status = 1", "t1");
        let result = run_one(&checker, &ctx);
        assert_eq!(result.violations[0].risk, RiskLevel::High);
    }

    #[test]
    fn no_pagination_uses_configured_risk_for_a_selective_where() {
        let checker = NoPagination::new(NoPaginationConfig::default(), vec!["status".to_string()]);
        let ctx = SqlContext::derive("SELECT * FROM users WHERE id = 1", "t1");
        let result = run_one(&checker, &ctx);
        assert_eq!(result.violations[0].risk, RiskLevel::Medium);
    }

    #[test]
    fn no_pagination_passes_when_limit_present() {
        let checker = NoPagination::new(NoPaginationConfig::default(), vec!["status".to_string()]);
        let ctx = SqlContext::derive("SELECT * FROM users LIMIT 10", "t1");
        assert!(run_one(&checker, &ctx).is_empty());
    }

    struct AlwaysPaginates;

    impl PaginationPluginDetector for AlwaysPaginates {
        fn has_physical_pagination(&self, _ctx: &SqlContext) -> bool {
            true
        }
    }

    #[test]
    fn logical_pagination_triggers_when_claimed_but_no_physical_rewrite_installed() {
        let checker = LogicalPagination::new(LogicalPaginationConfig::default());
        let mut parameters = std::collections::HashMap::new();
        parameters.insert("logical_pagination".to_string(), json!(true));
        let ctx = SqlContext::derive("SELECT * FROM users", "t1").with_parameters(parameters);
        let statement = statement_for(ctx.sql());
        let pagination = NoPaginationFramework;
        let input = CheckInput {
            ctx: &ctx,
            statement: &statement,
            pagination: &pagination
        };
        let mut result = ValidationResult::new();
        checker.check(&input, &mut result);
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn logical_pagination_passes_when_a_physical_rewriter_is_installed() {
        let checker = LogicalPagination::new(LogicalPaginationConfig::default());
        let mut parameters = std::collections::HashMap::new();
        parameters.insert("logical_pagination".to_string(), json!(true));
        let ctx = SqlContext::derive("SELECT * FROM users", "t1").with_parameters(parameters);
        let statement = statement_for(ctx.sql());
        let pagination = AlwaysPaginates;
        let input = CheckInput {
            ctx: &ctx,
            statement: &statement,
            pagination: &pagination
        };
        let mut result = ValidationResult::new();
        checker.check(&input, &mut result);
        assert!(result.is_empty());
    }
}
