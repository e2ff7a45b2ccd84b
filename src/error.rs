//! Error types and constructors for the SQL safety validation core.
//!
//! This module provides error construction functions that create properly
//! formatted [`AppError`] instances with context-specific messages, mirroring
//! the taxonomy the validator is built against:
//!
//! - **ParseError**: strict-mode parser failure.
//! - **Misconfiguration**: an invalid config value, caught at construction.
//! - **SafetyViolation**: the composite failure raised by the `BLOCK`
//!   strategy.
//!
//! A rule match itself is never an error here; it is data attached to a
//! [`crate::violation::ValidationResult`].

pub use masterror::{AppError, AppResult};

use crate::violation::ValidationResult;

/// Strict-mode parse failure: `sql` could not be parsed by the configured
/// dialect and the parse façade is not in lenient mode.
pub fn parse_error(sql: &str, cause: impl std::fmt::Display) -> AppError {
    AppError::bad_request(format_sql_error("SQL parse error", sql, &cause.to_string()))
}

/// Invalid configuration detected at validator-construction time.
pub fn misconfiguration_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Composite failure raised by the `BLOCK` strategy when a result did not
/// pass. Carries the rule tags and aggregate risk so host adapters can
/// translate it into a driver-level error.
pub fn safety_violation_error(result: &ValidationResult) -> AppError {
    let tags = result
        .violations
        .iter()
        .map(|v| v.rule_tag.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    AppError::service(format!(
        "SQL blocked at risk {}: violated rule(s) [{}]",
        result.risk, tags
    ))
}

/// Format a SQL-related error, attempting to extract position info from the
/// underlying parser's "Line: X, Column Y" message convention.
fn format_sql_error(prefix: &str, sql: &str, message: &str) -> String {
    let preview: String = sql.chars().take(120).collect();
    if let Some(pos) = extract_position(message) {
        format!(
            "{prefix} at line {line}, column {column} (sql: \"{preview}\"):\n  {message}",
            prefix = prefix,
            line = pos.line,
            column = pos.column,
            preview = preview,
            message = message
        )
    } else {
        format!("{prefix} (sql: \"{preview}\"):\n  {message}")
    }
}

struct SqlPosition {
    line:   usize,
    column: usize
}

/// Extract position from a sqlparser error message, e.g. `"... Line: 3,
/// Column 7"`.
fn extract_position(message: &str) -> Option<SqlPosition> {
    let line_marker = "Line: ";
    let col_marker = ", Column ";
    let line_start = message.find(line_marker)?;
    let line_num_start = line_start + line_marker.len();
    let rest = message.get(line_num_start..)?;
    let col_start = rest.find(col_marker)?;
    let line_str = message.get(line_num_start..line_num_start + col_start)?;
    let col_num_start = line_num_start + col_start + col_marker.len();
    let col_rest = message.get(col_num_start..)?;
    let col_end = col_rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(col_rest.len());
    let col_str = message.get(col_num_start..col_num_start + col_end)?;
    let line = line_str.parse().ok()?;
    let column = col_str.parse().ok()?;
    Some(SqlPosition {
        line,
        column
    })
}
