//! §4.3(c) — injection, dangerous operations, access control: the eleven
//! remaining checkers in the catalogue. Five of these (`MultiStatement`,
//! `SqlComment`, `IntoOutfile`, `MetadataStatement`, `SetStatement`) are
//! raw-text shaped and are exactly the set that still runs when the façade
//! demoted a statement to [`Statement::Unknown`] (§4.3(i)).

use std::collections::HashSet;

use crate::{
    ast::Statement,
    config::{
        CallStatementConfig, DangerousFunctionConfig, DdlOperationConfig, DeniedTableConfig,
        IntoOutfileConfig, MetadataStatementConfig, MultiStatementConfig, ReadOnlyTableConfig,
        SetOperationConfig, SetStatementConfig, SqlCommentConfig
    },
    pattern::normalize_identifier,
    rules::{CheckInput, Checker, Dispatch},
    sql_text::{self, leading_keyword, CharClass},
    violation::{ValidationResult, Violation}
};

/// A semicolon outside any string literal that is not purely trailing —
/// the statement carries a second, smuggled statement.
pub struct MultiStatement {
    config: MultiStatementConfig
}

impl MultiStatement {
    pub fn new(config: MultiStatementConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for MultiStatement {
    fn rule_tag(&self) -> &'static str {
        "multi_statement"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::RawText
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if self.config.enabled && sql_text::has_significant_semicolon(input.ctx.sql()) {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    "multi_statement: a non-trailing, unquoted semicolon suggests a second smuggled statement"
                    .to_string(),
                suggestion: Some("execute one statement per call".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// `UNION`/`INTERSECT`/`EXCEPT` not on a configured allowlist.
pub struct SetOperation {
    config: SetOperationConfig
}

impl SetOperation {
    pub fn new(config: SetOperationConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for SetOperation {
    fn rule_tag(&self) -> &'static str {
        "set_operation"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        let Statement::Select(select) = input.statement else {
            return;
        };
        if !self.config.enabled {
            return;
        }
        for op in &select.set_operations {
            let allowed = self.config.allowed.iter().any(|a| a.eq_ignore_ascii_case(&op.operator));
            if allowed {
                continue;
            }
            let variant = if op.all {
                format!("{} ALL", op.operator)
            } else {
                op.operator.clone()
            };
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    format!("set_operation: {variant} is not on the configured allowlist"),
                suggestion: Some("replace the set operation with an explicit JOIN, or allowlist it".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// `--`, `/* ... */`, or `#` comments outside string literals. Oracle-style
/// `/*+ ... */` hints are permitted when `allow_hint_comments` is set.
/// MyBatis placeholders (`#{...}`, `${...}`) are never comments.
pub struct SqlComment {
    config: SqlCommentConfig
}

impl SqlComment {
    pub fn new(config: SqlCommentConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for SqlComment {
    fn rule_tag(&self) -> &'static str {
        "sql_comment"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::RawText
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if self.config.enabled
            && sql_text::has_disallowed_comment(input.ctx.sql(), self.config.allow_hint_comments)
        {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    "sql_comment: statement contains a comment outside any string literal".to_string(),
                suggestion: Some("remove comments from executed SQL text".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// `INTO OUTFILE`/`INTO DUMPFILE` outside a string literal. Oracle's
/// `SELECT ... INTO <var>` (no OUTFILE/DUMPFILE keyword) must not trigger.
pub struct IntoOutfile {
    config: IntoOutfileConfig
}

impl IntoOutfile {
    pub fn new(config: IntoOutfileConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for IntoOutfile {
    fn rule_tag(&self) -> &'static str {
        "into_outfile"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::RawText
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled {
            return;
        }
        let masked = sql_text::code_only_uppercase(input.ctx.sql());
        if masked.contains("INTO OUTFILE") || masked.contains("INTO DUMPFILE") {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    "into_outfile: statement writes query results to the filesystem".to_string(),
                suggestion: Some("remove the INTO OUTFILE/DUMPFILE clause".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// Any `Ddl(*)` variant not in `allowed_operations`.
pub struct DdlOperation {
    config: DdlOperationConfig
}

impl DdlOperation {
    pub fn new(config: DdlOperationConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for DdlOperation {
    fn rule_tag(&self) -> &'static str {
        "ddl_operation"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        let Statement::Ddl(ddl) = input.statement else {
            return;
        };
        if !self.config.enabled {
            return;
        }
        let keyword = ddl.kind.to_string();
        let allowed = self.config.allowed_operations.iter().any(|a| a.eq_ignore_ascii_case(&keyword));
        if !allowed {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    format!("ddl_operation: {keyword} is not on the configured allowlist"),
                suggestion: Some("run DDL through a migration tool instead of the hot path".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

/// Recursive walk of every reachable [`sqlparser::ast::Function`] node,
/// flagging names on a configured denylist (`load_file`, `sys_exec`, ...).
pub struct DangerousFunction {
    config: DangerousFunctionConfig
}

impl DangerousFunction {
    pub fn new(config: DangerousFunctionConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for DangerousFunction {
    fn rule_tag(&self) -> &'static str {
        "dangerous_function"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled {
            return;
        }
        let mut seen = HashSet::new();
        for name in input.statement.function_names() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if self.config.functions.iter().any(|f| f.eq_ignore_ascii_case(name)) {
                result.add_violation(Violation {
                    risk:       self.config.risk,
                    message:    format!("dangerous_function: call to `{name}` is denylisted"),
                    suggestion: Some("remove the call or route it through an audited code path".to_string()),
                    rule_tag:   self.rule_tag().to_string()
                });
            }
        }
    }
}

/// A stored-procedure call statement (`CALL`/`EXEC`/`EXECUTE` at the
/// statement start). A function call inside a `SELECT` projection is not a
/// procedure call and does not reach here (it's a different AST variant).
pub struct CallStatement {
    config: CallStatementConfig
}

impl CallStatement {
    pub fn new(config: CallStatementConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for CallStatement {
    fn rule_tag(&self) -> &'static str {
        "call_statement"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if self.config.enabled && matches!(input.statement, Statement::Execute(_)) {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    "call_statement: statement invokes a stored procedure".to_string(),
                suggestion: Some("review the called procedure's own safety separately".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
        }
    }
}

const METADATA_KEYWORDS: &[&str] = &["SHOW", "DESCRIBE", "DESC", "USE"];

/// A leading `SHOW`/`DESCRIBE`/`DESC`/`USE` not on `allowed_statements`.
/// `SELECT ... FROM information_schema.*` has a leading `SELECT`, not one of
/// these keywords, and is unaffected.
pub struct MetadataStatement {
    config: MetadataStatementConfig
}

impl MetadataStatement {
    pub fn new(config: MetadataStatementConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for MetadataStatement {
    fn rule_tag(&self) -> &'static str {
        "metadata_statement"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::RawText
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled {
            return;
        }
        let Some(keyword) = leading_keyword(input.ctx.sql()) else {
            return;
        };
        if !METADATA_KEYWORDS.contains(&keyword.as_str()) {
            return;
        }
        if self.config.allowed_statements.iter().any(|a| a.eq_ignore_ascii_case(&keyword)) {
            return;
        }
        result.add_violation(Violation {
            risk:       self.config.risk,
            message:    format!("metadata_statement: {keyword} is not on the configured allowlist"),
            suggestion: Some("allowlist the statement or remove it from the hot path".to_string()),
            rule_tag:   self.rule_tag().to_string()
        });
    }
}

/// A leading `SET` keyword (session variable assignment), distinguished from
/// `UPDATE ... SET ...` which is a column assignment, not a session command.
pub struct SetStatement {
    config: SetStatementConfig
}

impl SetStatement {
    pub fn new(config: SetStatementConfig) -> Self {
        Self {
            config
        }
    }

    /// The token right after the leading `SET` keyword, preserving its
    /// original case (unlike [`sql_text::code_only_uppercase`], which exists
    /// for keyword matching, not for rendering back to the user).
    fn variable_name(sql: &str) -> Option<String> {
        let chars: Vec<char> = sql.chars().collect();
        let classes = sql_text::classify_chars(sql);
        let mut i = 0;
        let skip_gap = |i: &mut usize| {
            while *i < chars.len() && (classes[*i] != CharClass::Code || chars[*i].is_whitespace()) {
                *i += 1;
            }
        };
        skip_gap(&mut i);
        while i < chars.len() && classes[i] == CharClass::Code && (chars[i].is_alphanumeric() || chars[i] == '_') {
            i += 1;
        }
        skip_gap(&mut i);
        let mut token = String::new();
        while i < chars.len() && classes[i] == CharClass::Code {
            let c = chars[i];
            if c.is_alphanumeric() || c == '_' || c == '@' {
                token.push(c);
                i += 1;
            } else {
                break;
            }
        }
        if token.is_empty() {
            None
        } else {
            Some(token.trim_start_matches('@').to_string())
        }
    }
}

impl Checker for SetStatement {
    fn rule_tag(&self) -> &'static str {
        "set_statement"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::RawText
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled {
            return;
        }
        if leading_keyword(input.ctx.sql()).as_deref() != Some("SET") {
            return;
        }
        let variable = Self::variable_name(input.ctx.sql());
        let message = match variable {
            Some(name) => format!("set_statement: session variable `{name}` is assigned outside UPDATE"),
            None => "set_statement: a session SET command was issued outside UPDATE".to_string()
        };
        result.add_violation(Violation {
            risk: self.config.risk,
            message,
            suggestion: Some("avoid session-level SET statements on pooled connections".to_string()),
            rule_tag: self.rule_tag().to_string()
        });
    }
}

/// Every table reference (FROM/JOINs/subqueries/CTEs) matched against
/// configured denylist patterns (§4.8 wildcard semantics).
pub struct DeniedTable {
    config: DeniedTableConfig
}

impl DeniedTable {
    pub fn new(config: DeniedTableConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for DeniedTable {
    fn rule_tag(&self) -> &'static str {
        "denied_table"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled || self.config.patterns.is_empty() {
            return;
        }
        let patterns = self.config.compiled();
        for table in input.statement.tables() {
            let normalized = normalize_identifier(&table);
            if patterns.iter().any(|p| p.matches(&normalized)) {
                result.add_violation(Violation {
                    risk:       self.config.risk,
                    message:    format!("denied_table: `{normalized}` matches a denied-table pattern"),
                    suggestion: Some("remove the reference to this table".to_string()),
                    rule_tag:   self.rule_tag().to_string()
                });
            }
        }
    }
}

/// The single *target* table of an `INSERT`/`UPDATE`/`DELETE` (never a
/// `WHERE`/subquery table) matched against configured readonly patterns.
/// `SELECT` is always allowed.
pub struct ReadOnlyTable {
    config: ReadOnlyTableConfig
}

impl ReadOnlyTable {
    pub fn new(config: ReadOnlyTableConfig) -> Self {
        Self {
            config
        }
    }
}

impl Checker for ReadOnlyTable {
    fn rule_tag(&self) -> &'static str {
        "read_only_table"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Ast
    }

    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult) {
        if !self.config.enabled || self.config.patterns.is_empty() {
            return;
        }
        if matches!(input.statement, Statement::Select(_)) {
            return;
        }
        let Some(table) = input.statement.target_table() else {
            return;
        };
        let normalized = normalize_identifier(&table);
        let patterns = self.config.compiled();
        if patterns.iter().any(|p| p.matches(&normalized)) {
            result.add_violation(Violation {
                risk:       self.config.risk,
                message:    format!(
                    "read_only_table: {} on read-only table `{normalized}`",
                    input.statement.label()
                ),
                suggestion: Some("route writes to this table through its owning service".to_string()),
                rule_tag:   self.rule_tag().to_string()
            });
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
        ParseFacade::new(ParseMode::Lenient).parse(sql).unwrap()
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
    fn multi_statement_triggers_on_trailing_drop() {
        let checker = MultiStatement::new(MultiStatementConfig::default());
        let result = run_one(&checker, "SELECT * FROM users WHERE id = 1; DROP TABLE users --");
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn multi_statement_ignores_a_trailing_semicolon() {
        let checker = MultiStatement::new(MultiStatementConfig::default());
        assert!(run_one(&checker, "SELECT 1;").is_empty());
    }

    #[test]
    fn set_operation_flags_union_not_on_allowlist() {
        let checker = SetOperation::new(SetOperationConfig::default());
        let result = run_one(&checker, "SELECT * FROM sys_user UNION SELECT * FROM system");
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].message.contains("UNION"));
    }

    #[test]
    fn set_operation_allows_configured_operator() {
        let mut config = SetOperationConfig::default();
        config.allowed.push("UNION".to_string());
        let checker = SetOperation::new(config);
        let result = run_one(&checker, "SELECT * FROM a UNION SELECT * FROM b");
        assert!(result.is_empty());
    }

    #[test]
    fn sql_comment_triggers_on_line_comment() {
        let checker = SqlComment::new(SqlCommentConfig::default());
        assert_eq!(run_one(&checker, "SELECT 1 -- note").violations.len(), 1);
    }

    #[test]
    fn sql_comment_allows_hint_when_configured() {
        let mut config = SqlCommentConfig::default();
        config.allow_hint_comments = true;
        let checker = SqlComment::new(config);
        assert!(run_one(&checker, "SELECT /*+ INDEX(t idx) */ * FROM t").is_empty());
    }

    #[test]
    fn into_outfile_triggers_outside_literal() {
        let checker = IntoOutfile::new(IntoOutfileConfig::default());
        let result = run_one(&checker, "SELECT * FROM t INTO OUTFILE '/tmp/x'");
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn into_outfile_ignores_oracle_select_into_variable() {
        let checker = IntoOutfile::new(IntoOutfileConfig::default());
        assert!(run_one(&checker, "SELECT amount INTO v_amount FROM orders WHERE id = 1").is_empty());
    }

    #[test]
    fn ddl_operation_flags_unallowed_drop() {
        let checker = DdlOperation::new(DdlOperationConfig::default());
        assert_eq!(run_one(&checker, "DROP TABLE users").violations.len(), 1);
    }

    #[test]
    fn ddl_operation_allows_configured_keyword() {
        let mut config = DdlOperationConfig::default();
        config.allowed_operations.push("DROP".to_string());
        let checker = DdlOperation::new(config);
        assert!(run_one(&checker, "DROP TABLE users").is_empty());
    }

    #[test]
    fn dangerous_function_flags_load_file_in_projection() {
        let checker = DangerousFunction::new(DangerousFunctionConfig::default());
        let result = run_one(&checker, "SELECT id, LOAD_FILE('/etc/passwd') FROM users WHERE id=1");
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].message.contains("load_file"));
    }

    #[test]
    fn call_statement_triggers_on_call() {
        let checker = CallStatement::new(CallStatementConfig::default());
        assert_eq!(run_one(&checker, "CALL sp_cleanup()").violations.len(), 1);
    }

    #[test]
    fn metadata_statement_triggers_on_show() {
        let checker = MetadataStatement::new(MetadataStatementConfig::default());
        assert_eq!(run_one(&checker, "SHOW TABLES").violations.len(), 1);
    }

    #[test]
    fn metadata_statement_ignores_information_schema_select() {
        let checker = MetadataStatement::new(MetadataStatementConfig::default());
        assert!(run_one(&checker, "SELECT * FROM information_schema.tables").is_empty());
    }

    #[test]
    fn set_statement_triggers_on_session_set() {
        let checker = SetStatement::new(SetStatementConfig::default());
        let result = run_one(&checker, "SET @x = 1");
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].message.contains("x"));
    }

    #[test]
    fn set_statement_ignores_update_set() {
        let checker = SetStatement::new(SetStatementConfig::default());
        assert!(run_one(&checker, "UPDATE t SET x = 1 WHERE id = 1").is_empty());
    }

    #[test]
    fn denied_table_matches_wildcard_but_not_system() {
        let mut config = DeniedTableConfig::default();
        config.patterns.push("sys_*".to_string());
        let checker = DeniedTable::new(config);
        let result = run_one(&checker, "SELECT * FROM sys_user UNION SELECT * FROM system");
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].message.contains("sys_user"));
    }

    #[test]
    fn read_only_table_flags_update_on_target_but_not_select() {
        let mut config = ReadOnlyTableConfig::default();
        config.patterns.push("audit_log".to_string());
        let checker = ReadOnlyTable::new(config.clone());
        assert_eq!(run_one(&checker, "UPDATE audit_log SET note = 'x' WHERE id = 1").violations.len(), 1);
        let select_checker = ReadOnlyTable::new(config);
        assert!(run_one(&select_checker, "SELECT * FROM audit_log").is_empty());
    }

    #[test]
    fn read_only_table_ignores_where_clause_tables() {
        let mut config = ReadOnlyTableConfig::default();
        config.patterns.push("audit_log".to_string());
        let checker = ReadOnlyTable::new(config);
        let result = run_one(
            &checker,
            "UPDATE orders SET status = 'x' WHERE id IN (SELECT order_id FROM audit_log)"
        );
        assert!(result.is_empty());
    }
}
