//! The caller-owned input to the validator: the SQL text plus a small
//! execution context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sql_text::leading_keyword;

/// A closed classification of the submitted statement, derived from the AST
/// when available, otherwise from a case-insensitive match on the leading
/// keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
#[non_exhaustive]
pub enum SqlCommandType {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    Call,
    Other,
    #[default]
    Unknown
}

impl SqlCommandType {
    /// Derive a command type from the leading keyword of raw SQL text. Used
    /// when the caller does not supply one explicitly.
    pub fn from_sql(sql: &str) -> Self {
        let Some(keyword) = leading_keyword(sql) else {
            return Self::Unknown;
        };
        match keyword.as_str() {
            "SELECT" | "WITH" => Self::Select,
            "INSERT" | "REPLACE" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "CREATE" | "ALTER" | "DROP" | "TRUNCATE" => Self::Ddl,
            "CALL" | "EXEC" | "EXECUTE" => Self::Call,
            "SET" | "SHOW" | "DESCRIBE" | "DESC" | "USE" | "GRANT" | "REVOKE" => Self::Other,
            _ => Self::Unknown
        }
    }
}

/// Input to [`crate::validator::Validator::validate`].
///
/// Immutable once built. The AST is never stored here; the parse façade
/// produces it fresh (or from its own cache) per call.
#[derive(Debug, Clone)]
pub struct SqlContext {
    sql:           String,
    command_type:  SqlCommandType,
    statement_id:  String,
    parameters:    Option<HashMap<String, Value>>
}

impl SqlContext {
    /// Build a context with an explicit command type (e.g. supplied by an
    /// ORM layer that already knows it).
    pub fn new(
        sql: impl Into<String>,
        command_type: SqlCommandType,
        statement_id: impl Into<String>
    ) -> Self {
        Self {
            sql: sql.into(),
            command_type,
            statement_id: statement_id.into(),
            parameters: None
        }
    }

    /// Build a context deriving the command type from the leading keyword of
    /// `sql`.
    pub fn derive(sql: impl Into<String>, statement_id: impl Into<String>) -> Self {
        let sql = sql.into();
        let command_type = SqlCommandType::from_sql(&sql);
        Self::new(sql, command_type, statement_id)
    }

    pub fn with_parameters(mut self, parameters: HashMap<String, Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn command_type(&self) -> SqlCommandType {
        self.command_type
    }

    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }

    pub fn parameters(&self) -> Option<&HashMap<String, Value>> {
        self.parameters.as_ref()
    }

    /// True when `sql` is empty or made up entirely of whitespace; the
    /// validator short-circuits to a passing result in this case.
    pub fn is_blank(&self) -> bool {
        self.sql.trim().is_empty()
    }
}
