//! The statement AST façade.
//!
//! Rather than a template-method visitor over `sqlparser`'s tree (one
//! overridable hook per node kind), the façade collapses a parsed statement
//! into a small set of tagged variants, each carrying exactly what the rule
//! checkers in [`crate::rules`] need: the reachable table names, the
//! where-clause expression tree (kept, not just flattened into a column
//! list, so tree-aware checkers like `DummyCondition` and `DangerousFunction`
//! can walk it), set-operation chains, pagination clauses, and so on.
//!
//! `Statement::Unknown` is the façade's sentinel for "AST-shape checkers do
//! not apply here" — used both for genuine lenient-mode parse failures and
//! for successfully-parsed statement kinds the checker catalogue has no
//! AST-shape opinion about (`SHOW`, `SET`, `GRANT`, ...). Both cases want
//! identical dispatch: skip AST-shape checkers, run raw-text checkers only.

use std::collections::HashSet;

use compact_str::CompactString;
use indexmap::IndexSet;
use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr,
    JoinConstraint, JoinOperator, LimitClause, OrderByKind, Query as SqlQuery, SelectItem, SetExpr,
    SetQuantifier, SetOperator, Statement as SqlStatement, TableFactor, Value as SqlValue,
    WindowType
};

use crate::sql_text::leading_keyword;

/// The closed set of DDL sub-kinds the checker catalogue reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlKind {
    CreateTable,
    CreateIndex,
    CreateView,
    Alter,
    Drop,
    Truncate
}

impl std::fmt::Display for DdlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::CreateTable => "CREATE TABLE",
            Self::CreateIndex => "CREATE INDEX",
            Self::CreateView => "CREATE VIEW",
            Self::Alter => "ALTER",
            Self::Drop => "DROP",
            Self::Truncate => "TRUNCATE"
        };
        write!(f, "{label}")
    }
}

/// One boundary of a set-operation chain (`UNION` / `INTERSECT` / `EXCEPT` /
/// whatever else the parser's dialect recognizes).
#[derive(Debug, Clone)]
pub struct SetOperationInfo {
    pub operator: String,
    pub all:      bool
}

#[derive(Debug, Clone, Default)]
pub struct SelectStatement {
    pub tables:         Vec<CompactString>,
    pub where_present:  bool,
    pub where_cols:     IndexSet<CompactString>,
    pub where_exprs:    Vec<Expr>,
    pub is_aggregate:   bool,
    pub has_distinct:   bool,
    pub has_order_by:   bool,
    pub limit:          Option<u64>,
    pub offset:         Option<u64>,
    pub set_operations: Vec<SetOperationInfo>,
    pub function_names: Vec<CompactString>
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStatement {
    pub table:          CompactString,
    pub where_present:  bool,
    pub where_cols:     IndexSet<CompactString>,
    pub where_expr:     Option<Expr>,
    pub function_names: Vec<CompactString>
}

#[derive(Debug, Clone, Default)]
pub struct DeleteStatement {
    pub tables:         Vec<CompactString>,
    pub where_present:  bool,
    pub where_cols:     IndexSet<CompactString>,
    pub where_expr:     Option<Expr>,
    pub function_names: Vec<CompactString>
}

#[derive(Debug, Clone, Default)]
pub struct InsertStatement {
    pub table: CompactString
}

#[derive(Debug, Clone)]
pub struct DdlStatement {
    pub kind:   DdlKind,
    pub tables: Vec<CompactString>
}

#[derive(Debug, Clone)]
pub struct ExecuteStatement {
    pub raw: String
}

#[derive(Debug, Clone)]
pub struct UnknownStatement {
    pub raw: String
}

/// The parsed, façade view of a single SQL statement.
#[derive(Debug, Clone)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Ddl(DdlStatement),
    Execute(ExecuteStatement),
    Unknown(UnknownStatement)
}

impl Statement {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// A lenient-mode sentinel carrying the raw SQL that failed to parse.
    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self::Unknown(UnknownStatement {
            raw: raw.into()
        })
    }

    /// Every table name reachable from this statement (targets, joins,
    /// derived subqueries). Used by `DeniedTable`/`WhitelistFields`.
    pub fn tables(&self) -> Vec<CompactString> {
        match self {
            Self::Select(s) => s.tables.clone(),
            Self::Insert(i) => vec![i.table.clone()],
            Self::Update(u) => vec![u.table.clone()],
            Self::Delete(d) => d.tables.clone(),
            Self::Ddl(d) => d.tables.clone(),
            Self::Execute(_) | Self::Unknown(_) => Vec::new()
        }
    }

    /// The single target table for `INSERT`/`UPDATE`/`DELETE`, used by
    /// `ReadOnlyTable` (which never looks at `WHERE`/subquery tables).
    pub fn target_table(&self) -> Option<CompactString> {
        match self {
            Self::Insert(i) => Some(i.table.clone()),
            Self::Update(u) => Some(u.table.clone()),
            Self::Delete(d) => d.tables.first().cloned(),
            _ => None
        }
    }

    /// Every column referenced in this statement's `WHERE` (and, for
    /// `SELECT`, `HAVING`/`GROUP BY`/join-`ON`) clause.
    pub fn where_columns(&self) -> IndexSet<CompactString> {
        match self {
            Self::Select(s) => s.where_cols.clone(),
            Self::Update(u) => u.where_cols.clone(),
            Self::Delete(d) => d.where_cols.clone(),
            _ => IndexSet::new()
        }
    }

    pub fn where_present(&self) -> bool {
        match self {
            Self::Select(s) => s.where_present,
            Self::Update(u) => u.where_present,
            Self::Delete(d) => d.where_present,
            _ => false
        }
    }

    pub fn where_expr(&self) -> Option<&Expr> {
        match self {
            Self::Select(s) => s.where_exprs.first(),
            Self::Update(u) => u.where_expr.as_ref(),
            Self::Delete(d) => d.where_expr.as_ref(),
            _ => None
        }
    }

    pub fn function_names(&self) -> &[CompactString] {
        match self {
            Self::Select(s) => &s.function_names,
            Self::Update(u) => &u.function_names,
            Self::Delete(d) => &d.function_names,
            _ => &[]
        }
    }

    /// Short, upper-case label used in violation messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::Ddl(_) => "DDL",
            Self::Execute(_) => "CALL",
            Self::Unknown(_) => "UNKNOWN"
        }
    }
}

/// Convert one parsed `sqlparser` statement into the façade's `Statement`.
pub fn from_sqlparser(raw: String, stmt: SqlStatement) -> Statement {
    match stmt {
        SqlStatement::Query(query) => Statement::Select(build_select(*query)),
        SqlStatement::Insert(insert) => Statement::Insert(InsertStatement {
            table: insert.table.to_string().into()
        }),
        SqlStatement::Update {
            table,
            selection,
            ..
        } => {
            let mut where_cols = IndexSet::new();
            let mut function_names = Vec::new();
            if let Some(expr) = &selection {
                extract_columns(expr, &mut where_cols);
                let mut visited = HashSet::new();
                walk_expr_functions(expr, &mut function_names, &mut visited);
            }
            Statement::Update(UpdateStatement {
                table: table.relation.to_string().into(),
                where_present: selection.is_some(),
                where_cols,
                where_expr: selection,
                function_names
            })
        }
        SqlStatement::Delete(delete) => {
            let mut tables = Vec::new();
            if let sqlparser::ast::FromTable::WithFromKeyword(items)
            | sqlparser::ast::FromTable::WithoutKeyword(items) = &delete.from
            {
                for item in items {
                    tables.push(item.relation.to_string().into());
                }
            }
            let mut where_cols = IndexSet::new();
            let mut function_names = Vec::new();
            if let Some(expr) = &delete.selection {
                extract_columns(expr, &mut where_cols);
                let mut visited = HashSet::new();
                walk_expr_functions(expr, &mut function_names, &mut visited);
            }
            Statement::Delete(DeleteStatement {
                tables,
                where_present: delete.selection.is_some(),
                where_cols,
                where_expr: delete.selection,
                function_names
            })
        }
        SqlStatement::Truncate {
            table_names, ..
        } => Statement::Ddl(DdlStatement {
            kind:   DdlKind::Truncate,
            tables: table_names.into_iter().map(|t| t.name.to_string().into()).collect()
        }),
        SqlStatement::Drop {
            names, ..
        } => Statement::Ddl(DdlStatement {
            kind:   DdlKind::Drop,
            tables: names.into_iter().map(|n| n.to_string().into()).collect()
        }),
        SqlStatement::CreateTable(create) => Statement::Ddl(DdlStatement {
            kind:   DdlKind::CreateTable,
            tables: vec![create.name.to_string().into()]
        }),
        SqlStatement::CreateIndex(create) => Statement::Ddl(DdlStatement {
            kind:   DdlKind::CreateIndex,
            tables: vec![create.table_name.to_string().into()]
        }),
        SqlStatement::CreateView {
            name, ..
        } => Statement::Ddl(DdlStatement {
            kind:   DdlKind::CreateView,
            tables: vec![name.to_string().into()]
        }),
        SqlStatement::AlterTable {
            name, ..
        } => Statement::Ddl(DdlStatement {
            kind:   DdlKind::Alter,
            tables: vec![name.to_string().into()]
        }),
        other => {
            let raw = if raw.is_empty() {
                other.to_string()
            } else {
                raw
            };
            match leading_keyword(&raw).as_deref() {
                Some("CALL") | Some("EXEC") | Some("EXECUTE") => {
                    Statement::Execute(ExecuteStatement {
                        raw
                    })
                }
                _ => Statement::Unknown(UnknownStatement {
                    raw
                })
            }
        }
    }
}

fn build_select(query: SqlQuery) -> SelectStatement {
    let mut select = SelectStatement::default();

    if let Some(limit_clause) = &query.limit_clause {
        apply_limit_clause(limit_clause, &mut select);
    }
    select.has_order_by = query.order_by.is_some();

    let mut visited = HashSet::new();
    walk_query_functions(&query, &mut select.function_names, &mut visited);
    collect_set_expr(&query.body, &mut select);

    select
}

fn apply_limit_clause(limit_clause: &LimitClause, select: &mut SelectStatement) {
    match limit_clause {
        LimitClause::LimitOffset {
            limit,
            offset,
            ..
        } => {
            if let Some(Expr::Value(v)) = limit
                && let SqlValue::Number(n, _) = &v.value
            {
                select.limit = n.parse().ok();
            }
            if let Some(offset_expr) = offset
                && let Expr::Value(v) = &offset_expr.value
                && let SqlValue::Number(n, _) = &v.value
            {
                select.offset = n.parse().ok();
            }
        }
        LimitClause::OffsetCommaLimit {
            offset,
            limit
        } => {
            if let Expr::Value(v) = limit
                && let SqlValue::Number(n, _) = &v.value
            {
                select.limit = n.parse().ok();
            }
            if let Expr::Value(v) = offset
                && let SqlValue::Number(n, _) = &v.value
            {
                select.offset = n.parse().ok();
            }
        }
    }
}

const AGGREGATE_FUNCTIONS: &[&str] = &["count", "sum", "avg", "min", "max"];

/// Recursively accumulate tables/where-clause/set-operation information from
/// a `SetExpr`, covering `UNION`/`INTERSECT`/`EXCEPT` chains by descending
/// into both sides.
fn collect_set_expr(set_expr: &SetExpr, select: &mut SelectStatement) {
    match set_expr {
        SetExpr::Select(inner) => {
            if inner.distinct.is_some() {
                select.has_distinct = true;
            }
            if !matches!(&inner.group_by, GroupByExpr::Expressions(exprs, _) if exprs.is_empty())
            {
                select.is_aggregate = true;
            }
            for item in &inner.projection {
                if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias {
                    expr, ..
                } = item
                    && expr_calls_aggregate(expr)
                {
                    select.is_aggregate = true;
                }
            }
            for twj in &inner.from {
                collect_table_factor(&twj.relation, &mut select.tables);
                for join in &twj.joins {
                    collect_table_factor(&join.relation, &mut select.tables);
                    if let Some(expr) = join_on_expr(&join.join_operator) {
                        extract_columns(expr, &mut select.where_cols);
                    }
                }
            }
            if let Some(selection) = &inner.selection {
                select.where_present = true;
                extract_columns(selection, &mut select.where_cols);
                select.where_exprs.push(selection.clone());
            }
            if let GroupByExpr::Expressions(exprs, _) = &inner.group_by {
                for expr in exprs {
                    extract_columns(expr, &mut select.where_cols);
                }
            }
            if let Some(having) = &inner.having {
                extract_columns(having, &mut select.where_cols);
            }
        }
        SetExpr::SetOperation {
            op,
            set_quantifier,
            left,
            right
        } => {
            select.set_operations.push(SetOperationInfo {
                operator: describe_set_operator(op),
                all:      matches!(set_quantifier, SetQuantifier::All)
            });
            collect_set_expr(left, select);
            collect_set_expr(right, select);
        }
        SetExpr::Query(inner) => {
            let mut visited = HashSet::new();
            walk_query_functions(inner, &mut select.function_names, &mut visited);
            collect_set_expr(&inner.body, select);
        }
        SetExpr::Values(_) | SetExpr::Insert(_) | SetExpr::Update(_) | SetExpr::Table(_)
        | SetExpr::Delete(_) | SetExpr::Merge(_) => {}
    }
}

fn describe_set_operator(op: &SetOperator) -> String {
    match op {
        SetOperator::Union => "UNION".to_string(),
        SetOperator::Except => "EXCEPT".to_string(),
        SetOperator::Intersect => "INTERSECT".to_string(),
        #[allow(unreachable_patterns)]
        other => format!("{other:?}").to_uppercase()
    }
}

fn join_on_expr(op: &JoinOperator) -> Option<&Expr> {
    match op {
        JoinOperator::Inner(JoinConstraint::On(expr))
        | JoinOperator::LeftOuter(JoinConstraint::On(expr))
        | JoinOperator::RightOuter(JoinConstraint::On(expr))
        | JoinOperator::FullOuter(JoinConstraint::On(expr)) => Some(expr),
        _ => None
    }
}

fn collect_table_factor(table_factor: &TableFactor, tables: &mut Vec<CompactString>) {
    match table_factor {
        TableFactor::Table {
            name, ..
        } => tables.push(name.to_string().into()),
        TableFactor::Derived {
            subquery, ..
        } => {
            let mut dummy = SelectStatement::default();
            collect_set_expr(&subquery.body, &mut dummy);
            tables.extend(dummy.tables);
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            collect_table_factor(&table_with_joins.relation, tables);
            for join in &table_with_joins.joins {
                collect_table_factor(&join.relation, tables);
            }
        }
        _ => {}
    }
}

fn expr_calls_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Function(func) => {
            let name = func.name.to_string().to_lowercase();
            AGGREGATE_FUNCTIONS.contains(&name.as_str())
        }
        Expr::Nested(e) => expr_calls_aggregate(e),
        Expr::BinaryOp {
            left,
            right,
            ..
        } => expr_calls_aggregate(left) || expr_calls_aggregate(right),
        _ => false
    }
}

/// Extract every plain column reference reachable from `expr`. Mirrors the
/// structural cases a `WHERE`/`HAVING`/`GROUP BY` clause can take.
pub fn extract_columns(expr: &Expr, columns: &mut IndexSet<CompactString>) {
    match expr {
        Expr::Identifier(ident) => {
            columns.insert(ident.value.as_str().into());
        }
        Expr::CompoundIdentifier(idents) => {
            if let Some(col) = idents.last() {
                columns.insert(col.value.as_str().into());
            }
        }
        Expr::BinaryOp {
            left,
            right,
            ..
        } => {
            extract_columns(left, columns);
            extract_columns(right, columns);
        }
        Expr::UnaryOp {
            expr, ..
        } => extract_columns(expr, columns),
        Expr::InList {
            expr,
            list,
            ..
        } => {
            extract_columns(expr, columns);
            for item in list {
                extract_columns(item, columns);
            }
        }
        Expr::InSubquery {
            expr, ..
        } => extract_columns(expr, columns),
        Expr::Between {
            expr,
            low,
            high,
            ..
        } => {
            extract_columns(expr, columns);
            extract_columns(low, columns);
            extract_columns(high, columns);
        }
        Expr::IsNull(e) | Expr::IsNotNull(e) | Expr::Nested(e) => extract_columns(e, columns),
        Expr::Function(func) => {
            if let FunctionArguments::List(args) = &func.args {
                for arg in &args.args {
                    if let FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) = arg {
                        extract_columns(e, columns);
                    }
                }
            }
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(op) = operand {
                extract_columns(op, columns);
            }
            for case_when in conditions {
                extract_columns(&case_when.condition, columns);
                extract_columns(&case_when.result, columns);
            }
            if let Some(e) = else_result {
                extract_columns(e, columns);
            }
        }
        Expr::Cast {
            expr, ..
        }
        | Expr::Extract {
            expr, ..
        } => extract_columns(expr, columns),
        _ => {}
    }
}

/// Recursively collect lower-cased function names reachable from `expr`,
/// descending into subqueries and `CASE` arms. A visited-set keyed by node
/// identity guards against re-visiting a shared subtree (the parser's AST is
/// a tree, so this is defensive rather than load-bearing).
fn walk_expr_functions(expr: &Expr, names: &mut Vec<CompactString>, visited: &mut HashSet<usize>) {
    if !visited.insert(std::ptr::addr_of!(*expr) as usize) {
        return;
    }
    match expr {
        Expr::Function(func) => {
            names.push(func.name.to_string().to_lowercase().into());
            if let FunctionArguments::List(args) = &func.args {
                for arg in &args.args {
                    if let FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                    | FunctionArg::Named {
                        arg: FunctionArgExpr::Expr(e),
                        ..
                    } = arg
                    {
                        walk_expr_functions(e, names, visited);
                    }
                }
            }
            if let Some(WindowType::WindowSpec(spec)) = &func.over {
                for part in &spec.partition_by {
                    walk_expr_functions(part, names, visited);
                }
                for order in &spec.order_by {
                    walk_expr_functions(&order.expr, names, visited);
                }
            }
        }
        Expr::BinaryOp {
            left,
            right,
            ..
        } => {
            walk_expr_functions(left, names, visited);
            walk_expr_functions(right, names, visited);
        }
        Expr::UnaryOp {
            expr, ..
        }
        | Expr::Nested(expr)
        | Expr::IsNull(expr)
        | Expr::IsNotNull(expr)
        | Expr::Cast {
            expr, ..
        }
        | Expr::Extract {
            expr, ..
        } => walk_expr_functions(expr, names, visited),
        Expr::InList {
            expr,
            list,
            ..
        } => {
            walk_expr_functions(expr, names, visited);
            for item in list {
                walk_expr_functions(item, names, visited);
            }
        }
        Expr::InSubquery {
            expr,
            subquery,
            ..
        } => {
            walk_expr_functions(expr, names, visited);
            walk_query_functions(subquery, names, visited);
        }
        Expr::Subquery(query) => walk_query_functions(query, names, visited),
        Expr::Exists {
            subquery, ..
        } => walk_query_functions(subquery, names, visited),
        Expr::Between {
            expr,
            low,
            high,
            ..
        } => {
            walk_expr_functions(expr, names, visited);
            walk_expr_functions(low, names, visited);
            walk_expr_functions(high, names, visited);
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(op) = operand {
                walk_expr_functions(op, names, visited);
            }
            for case_when in conditions {
                walk_expr_functions(&case_when.condition, names, visited);
                walk_expr_functions(&case_when.result, names, visited);
            }
            if let Some(e) = else_result {
                walk_expr_functions(e, names, visited);
            }
        }
        _ => {}
    }
}

fn walk_set_expr_functions(
    set_expr: &SetExpr,
    names: &mut Vec<CompactString>,
    visited: &mut HashSet<usize>
) {
    match set_expr {
        SetExpr::Select(select) => {
            for item in &select.projection {
                if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias {
                    expr, ..
                } = item
                {
                    walk_expr_functions(expr, names, visited);
                }
            }
            if let Some(selection) = &select.selection {
                walk_expr_functions(selection, names, visited);
            }
            if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
                for expr in exprs {
                    walk_expr_functions(expr, names, visited);
                }
            }
            if let Some(having) = &select.having {
                walk_expr_functions(having, names, visited);
            }
            for twj in &select.from {
                walk_table_factor_functions(&twj.relation, names, visited);
                for join in &twj.joins {
                    walk_table_factor_functions(&join.relation, names, visited);
                    if let Some(expr) = join_on_expr(&join.join_operator) {
                        walk_expr_functions(expr, names, visited);
                    }
                }
            }
        }
        SetExpr::SetOperation {
            left,
            right,
            ..
        } => {
            walk_set_expr_functions(left, names, visited);
            walk_set_expr_functions(right, names, visited);
        }
        SetExpr::Query(query) => walk_query_functions(query, names, visited),
        _ => {}
    }
}

fn walk_table_factor_functions(
    table_factor: &TableFactor,
    names: &mut Vec<CompactString>,
    visited: &mut HashSet<usize>
) {
    match table_factor {
        TableFactor::Derived {
            subquery, ..
        } => walk_query_functions(subquery, names, visited),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            walk_table_factor_functions(&table_with_joins.relation, names, visited);
            for join in &table_with_joins.joins {
                walk_table_factor_functions(&join.relation, names, visited);
            }
        }
        _ => {}
    }
}

fn walk_query_functions(query: &SqlQuery, names: &mut Vec<CompactString>, visited: &mut HashSet<usize>) {
    for cte in query.with.iter().flat_map(|w| &w.cte_tables) {
        walk_query_functions(&cte.query, names, visited);
    }
    if let Some(order_by) = &query.order_by
        && let OrderByKind::Expressions(exprs) = &order_by.kind
    {
        for expr in exprs {
            walk_expr_functions(&expr.expr, names, visited);
        }
    }
    walk_set_expr_functions(&query.body, names, visited);
}

/// Structural tautology detection for `DummyCondition`: flattens the
/// top-level `AND` chain of `expr` and reports, for every conjunct that is a
/// constant truth value, a human-readable label of the matched fragment.
/// `status = 'active' AND 1 = 1` reports one dummy conjunct (`1 = 1`) even
/// though the overall predicate is not vacuously true.
pub fn dummy_conjuncts(expr: &Expr) -> Vec<String> {
    let mut conjuncts = Vec::new();
    flatten_and(expr, &mut conjuncts);
    conjuncts.into_iter().filter_map(tautology_label).collect()
}

/// The top-level `AND`-chain conjuncts of `expr`, exposed for checkers that
/// need to test conjuncts against their own (configurable) tautology
/// patterns in addition to the structural detection above.
pub fn top_level_and_conjuncts(expr: &Expr) -> Vec<&Expr> {
    let mut conjuncts = Vec::new();
    flatten_and(expr, &mut conjuncts);
    conjuncts
}

/// True when `expr`'s top-level `AND` chain is made up *entirely* of
/// tautological conjuncts (`WHERE 1=1`, `WHERE 1=1 AND true`), i.e. the
/// predicate restricts nothing at all. `WHERE 1=1 AND status = 1` is not
/// vacuous by this measure — it still has `NoWhereClause`'s intended effect
/// of "does not actually filter rows," but carries a real conjunct and is
/// reported by `DummyCondition` instead.
pub fn is_where_vacuous(expr: &Expr) -> bool {
    let mut conjuncts = Vec::new();
    flatten_and(expr, &mut conjuncts);
    !conjuncts.is_empty() && conjuncts.iter().all(|c| tautology_label(c).is_some())
}

fn flatten_and<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right
        } => {
            flatten_and(left, out);
            flatten_and(right, out);
        }
        Expr::Nested(inner) => flatten_and(inner, out),
        other => out.push(other)
    }
}

#[derive(PartialEq)]
enum Literal {
    Number(String),
    Text(String),
    Boolean(bool)
}

fn literal_of(expr: &Expr) -> Option<Literal> {
    match expr {
        Expr::Value(v) => match &v.value {
            SqlValue::Number(n, _) => Some(Literal::Number(n.clone())),
            SqlValue::SingleQuotedString(s) | SqlValue::DoubleQuotedString(s) => {
                Some(Literal::Text(s.clone()))
            }
            SqlValue::Boolean(b) => Some(Literal::Boolean(*b)),
            _ => None
        },
        Expr::Nested(inner) => literal_of(inner),
        _ => None
    }
}

fn same_identifier(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (Expr::Identifier(x), Expr::Identifier(y)) => x.value.eq_ignore_ascii_case(&y.value),
        (Expr::CompoundIdentifier(x), Expr::CompoundIdentifier(y)) => {
            x.last().zip(y.last()).is_some_and(|(a, b)| a.value.eq_ignore_ascii_case(&b.value))
        }
        _ => false
    }
}

fn tautology_label(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(v) if matches!(&v.value, SqlValue::Boolean(true)) => Some("true".to_string()),
        Expr::BinaryOp {
            left,
            op: op @ (BinaryOperator::Eq | BinaryOperator::NotEq),
            right
        } => {
            let always_true = if let (Some(l), Some(r)) = (literal_of(left), literal_of(right)) {
                let equal = l == r;
                match op {
                    BinaryOperator::Eq => equal,
                    BinaryOperator::NotEq => !equal,
                    _ => false
                }
            } else {
                matches!(op, BinaryOperator::Eq) && same_identifier(left, right)
            };
            always_true.then(|| format!("{left} {op} {right}"))
        }
        _ => None
    }
}
