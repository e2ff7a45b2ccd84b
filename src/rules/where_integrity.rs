//! §4.3(a) — integrity of the `WHERE` clause: `NoWhereClause`,
//! `DummyCondition`, `BlacklistFields`, `WhitelistFields`.

use crate::{
    ast::{self, Statement},
    config::{BlacklistFieldsConfig, DummyConditionConfig, NoWhereClauseConfig, WhitelistFieldsConfig},
    pattern::normalize_identifier,
    risk::RiskLevel,
    rules::{CheckInput, Checker, Dispatch},
    violation::{ValidationResult, Violation}
};

/// `UPDATE`/`DELETE` always need a real `WHERE`; `SELECT` needs one unless
/// it is aggregate or already paginated. A `WHERE` made up entirely of
/// tautological conjuncts (`is_where_vacuous`) does not count as "present"
/// for this rule's purposes.
pub struct NoWhereClause {
    config: NoWhereClauseConfig
}

impl NoWhereClause {
    pub fn new(config: NoWhereClauseConfig) -> Self {
        Self {
            config
        }
    }

    fn where_is_missing_or_vacuous(statement: &Statement) -> bool {
        if !statement.where_present() {
            return true;
        }
        statement.where_expr().is_some_and(ast::is_where_vacuous)
    }
}

impl Checker for NoWhereClause {
    fn rule_tag(&self) -> &'static str {
        "no_where_clause"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled {
            return;
        }
        let triggers = match input.statement {
            Statement::Update(_) | Statement::Delete(_) => Self::where_is_missing_or_vacuous(input.statement),
            Statement::Select(select) => {
                !select.is_aggregate
                    && select.limit.is_none()
                    && Self::where_is_missing_or_vacuous(input.statement)
            }
            _ => false
        };
        if triggers {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    format!(
                    "no_where_clause: {} statement has no effective WHERE clause",
                    input.statement.label()
                ),
                suggestion: Some("add a WHERE clause that restricts the affected rows".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// Flags `WHERE` predicates that are logically a constant truth value, tree
/// aware enough to separate a real conjunct (`status = 'active'`) from a
/// dummy one (`1 = 1`) inside the same `AND` chain.
pub struct DummyCondition {
    config: DummyConditionConfig
}

impl DummyCondition {
    pub fn new(config: DummyConditionConfig) -> Self {
        Self {
            config
        }
    }

    fn normalize_pattern(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase()
    }

    /// Structural detection (`ast::dummy_conjuncts`) plus a fallback: any
    /// top-level conjunct whose rendered text matches one of
    /// `config.patterns` verbatim (modulo whitespace/case), for patterns the
    /// structural detector has no opinion on.
    fn matched_labels(&self, where_expr: &sqlparser::ast::Expr) -> Vec<String> {
        let mut labels = ast::dummy_conjuncts(where_expr);
        let seen: Vec<String> = labels.iter().map(|l| Self::normalize_pattern(l)).collect();
        let configured: Vec<String> = self.config.patterns.iter().map(|p| Self::normalize_pattern(p)).collect();
        for conjunct in ast::top_level_and_conjuncts(where_expr) {
            let rendered = conjunct.to_string();
            let normalized = Self::normalize_pattern(&rendered);
            if configured.contains(&normalized) && !seen.contains(&normalized) {
                labels.push(rendered);
            }
        }
        labels
    }
}

impl Checker for DummyCondition {
    fn rule_tag(&self) -> &'static str {
        "dummy_condition"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled {
            return;
        }
        let Some(where_expr) = input.statement.where_expr() else {
            return;
        };
        for label in self.matched_labels(where_expr) {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    format!("dummy_condition: tautological WHERE conjunct `{label}`"),
                suggestion: Some("remove the tautological condition and filter on real columns".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// Triggers when the `WHERE` clause references *only* low-cardinality
/// columns (`deleted`, `status`, ...) — still effectively a full scan.
pub struct BlacklistFields {
    config: BlacklistFieldsConfig
}

impl BlacklistFields {
    pub fn new(config: BlacklistFieldsConfig) -> Self {
        Self {
            config
        }
    }

    pub fn only_blacklisted(columns: &indexmap::IndexSet<compact_str::CompactString>, blacklist: &[String]) -> bool {
        !columns.is_empty()
            && columns
                .iter()
                .all(|col| blacklist.iter().any(|b| b.eq_ignore_ascii_case(col.as_str())))
    }
}

impl Checker for BlacklistFields {
    fn rule_tag(&self) -> &'static str {
        "blacklist_fields"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled || !input.statement.where_present() {
            return;
        }
        let columns = input.statement.where_columns();
        if Self::only_blacklisted(&columns, &self.config.columns) {
            let names = columns.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ");
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    format!("blacklist_fields: WHERE references only low-cardinality column(s) [{names}]"),
                suggestion: Some("add a selective column to the WHERE clause".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// For a configured `table -> required columns` map, triggers when a
/// statement touches a whitelisted table without any of its required
/// columns in the `WHERE` clause.
pub struct WhitelistFields {
    config: WhitelistFieldsConfig
}

impl WhitelistFields {
    pub fn new(config: WhitelistFieldsConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for WhitelistFields {
    fn rule_tag(&self) -> &'static str {
        "whitelist_fields"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled || self.config.required.is_empty() {
            return;
        }
        let where_columns = input.statement.where_columns();
        for table in input.statement.tables() {
            let normalized_table = normalize_identifier(&table);
            let Some(required) = self
                .config
                .required
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&normalized_table))
                .map(|(_, cols)| cols)
            else {
                continue;
            };
            let has_required = required
                .iter()
                .any(|req| where_columns.iter().any(|col| col.eq_ignore_ascii_case(req)));
            if !has_required {
                result.add_violation(Violation {
                    risk:       self.config.risk,
                    message:    format!(
                        "whitelist_fields: table `{normalized_table}` requires one of [{}] in WHERE",
                        required.join(", ")
                    ),
                    suggestion: Some("include one of the required fields in the WHERE clause".to_string()),
                    rule_tag:   self.rule_tag().to_string()
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::SqlContext, pagination_plugin::NoPaginationFramework, parse::{ParseFacade, ParseMode}
    };

    fn statement_for(sql: &str) -> Statement {
        ParseFacade::new(ParseMode::Strict).parse(sql).unwrap()
    }

    fn run_one(checker: &dyn Checker, sql: &str) -> ValidationResult {
        let ctx = SqlContext::derive(sql, "t1");
        let statement = statement_for(sql);
        let pagination = NoPaginationFramework;
        let input = CheckInput {
            ctx:        &ctx,
            statement:  &statement,
            pagination: &pagination
        };
        let mut result = ValidationResult::new();
        checker.check(&input, &mut result);
        result
    }

    #[test]
    fn delete_without_where_triggers_no_where_clause() {
        let checker = NoWhereClause::new(NoWhereClauseConfig::default());
        let result = run_one(&checker, "DELETE FROM users");
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].risk, RiskLevel::Critical);
    }

    #[test]
    fn select_with_limit_is_not_flagged_by_no_where_clause() {
        let checker = NoWhereClause::new(NoWhereClauseConfig::default());
        let result = run_one(&checker, "SELECT * FROM users LIMIT 10");
        assert!(result.is_empty());
    }

    #[test]
    fn select_with_aggregate_is_not_flagged_by_no_where_clause() {
        let checker = NoWhereClause::new(NoWhereClauseConfig::default());
        let result = run_one(&checker, "SELECT COUNT(*) FROM users");
        assert!(result.is_empty());
    }

    #[test]
    fn vacuous_where_still_triggers_no_where_clause() {
        let checker = NoWhereClause::new(NoWhereClauseConfig::default());
        let result = run_one(&checker, "SELECT * FROM users WHERE 1=1");
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn disabled_checker_is_a_no_op() {
        let mut config = NoWhereClauseConfig::default();
        config.enabled = false;
        let checker = NoWhereClause::new(config);
        let result = run_one(&checker, "DELETE FROM users");
        assert!(result.is_empty());
    }

    #[test]
    fn dummy_condition_flags_the_matched_fragment() {
        let checker = DummyCondition::new(DummyConditionConfig::default());
        let result = run_one(&checker, "SELECT * FROM user WHERE 1=1 AND status=1");
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].message.contains("1 = 1"));
    }

    #[test]
    fn dummy_condition_flags_a_configured_or_based_tautology_by_text() {
        // Not an AND-conjunct, so only the literal-text fallback against
        // `config.patterns` catches it (structural detection only inspects
        // AND chains).
        let checker = DummyCondition::new(DummyConditionConfig::default());
        let result = run_one(&checker, "SELECT * FROM user WHERE 1<>1 OR 1=1");
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn blacklist_fields_triggers_when_only_low_cardinality_columns_present() {
        let checker = BlacklistFields::new(BlacklistFieldsConfig::default());
        let result = run_one(&checker, "SELECT * FROM user WHERE status=1");
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn blacklist_fields_passes_when_a_selective_column_is_present() {
        let checker = BlacklistFields::new(BlacklistFieldsConfig::default());
        let result = run_one(&checker, "SELECT * FROM user WHERE id = 1 AND status=1");
        assert!(result.is_empty());
    }

    #[test]
    fn whitelist_fields_triggers_when_required_column_absent() {
        let mut config = WhitelistFieldsConfig::default();
        config.required.insert("orders".to_string(), vec!["tenant_id".to_string()]);
        let checker = WhitelistFields::new(config);
        let result = run_one(&checker, "DELETE FROM orders WHERE id = 1");
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn whitelist_fields_passes_when_required_column_present() {
        let mut config = WhitelistFieldsConfig::default();
        config.required.insert("orders".to_string(), vec!["tenant_id".to_string()]);
        let checker = WhitelistFields::new(config);
        let result = run_one(&checker, "DELETE FROM orders WHERE tenant_id = 9");
        assert!(result.is_empty());
    }
}
