//! The rule checker catalogue.
//!
//! Reworked from the teacher's template-method `Rule` trait (one
//! `fn check(&self, query, index)` hook, overridden per rule, dispatched
//! through dynamic trait objects over a single statement shape) into the
//! structure spec.md's REDESIGN FLAGS call for: each checker pattern-matches
//! directly on the [`crate::ast::Statement`] tagged variant it cares about,
//! there is no per-variant visitor hook to override, and a checker that only
//! needs the raw SQL text (no AST opinion at all) is a distinct dispatch
//! kind rather than a degenerate AST checker.
//!
//! Checkers never mutate `ctx`/`statement`, never perform I/O, and are
//! deterministic with respect to `(sql, command_type, parsed, config)` —
//! the contract spec.md §4.3 requires of every entry in the catalogue.

mod injection;
mod pagination;
mod where_integrity;

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::{
    ast::Statement,
    config::RuleCatalogConfig,
    context::SqlContext,
    pagination_plugin::PaginationPluginDetector,
    risk::RiskLevel,
    violation::{ValidationResult, Violation}
};

/// Which half of §4.3's catalogue a checker belongs to, and therefore how
/// the orchestrator dispatches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Consults the parsed [`Statement`]; skipped entirely when the façade
    /// produced [`Statement::Unknown`] (§4.3(i)).
    Ast,
    /// Consults only `ctx.sql`; still runs against `Statement::Unknown`,
    /// which is what lets e.g. `SqlComment` fire on syntax the parser
    /// rejected outright.
    RawText
}

/// Everything a single checker invocation needs.
pub struct CheckInput<'a> {
    pub ctx:        &'a SqlContext,
    pub statement:  &'a Statement,
    pub pagination: &'a dyn PaginationPluginDetector
}

/// One independent safety predicate from spec.md §4.3.
pub trait Checker: Send + Sync {
    /// Stable identifier, used as [`Violation::rule_tag`] and in the
    /// orchestrator's internal-error containment message.
    fn rule_tag(&self) -> &'static str;

    fn dispatch(&self) -> Dispatch;

    /// Inspect `input` and append zero or more violations to `result`.
    /// Implementations own their own (cloned, frozen) config and must treat
    /// `config.enabled == false` as a no-op — the orchestrator does not
    /// filter disabled checkers out of the registry, it runs all of them
    /// (spec.md §4.3, §8 testable property 2).
    fn check(&self, input: &CheckInput<'_>, result: &mut ValidationResult);
}

/// Build the full, registration-ordered checker list from a frozen
/// [`RuleCatalogConfig`]. Order here is the order violations appear in a
/// [`ValidationResult`] (spec.md §4.4: "checker invocation order is the
/// registration order").
pub fn build_registry(config: &RuleCatalogConfig) -> Vec<Box<dyn Checker>> {
    vec![
        Box::new(where_integrity::NoWhereClause::new(config.no_where_clause.clone())),
        Box::new(where_integrity::DummyCondition::new(config.dummy_condition.clone())),
        Box::new(where_integrity::BlacklistFields::new(config.blacklist_fields.clone())),
        Box::new(where_integrity::WhitelistFields::new(config.whitelist_fields.clone())),
        Box::new(pagination::LogicalPagination::new(config.logical_pagination.clone())),
        Box::new(pagination::NoConditionPagination::new(
            config.no_condition_pagination.clone()
        )),
        Box::new(pagination::DeepPagination::new(config.deep_pagination.clone())),
        Box::new(pagination::LargePageSize::new(config.large_page_size.clone())),
        Box::new(pagination::MissingOrderBy::new(config.missing_order_by.clone())),
        Box::new(pagination::NoPagination::new(
            config.no_pagination.clone(),
            config.blacklist_fields.columns.clone()
        )),
        Box::new(injection::MultiStatement::new(config.multi_statement.clone())),
        Box::new(injection::SetOperation::new(config.set_operation.clone())),
        Box::new(injection::SqlComment::new(config.sql_comment.clone())),
        Box::new(injection::IntoOutfile::new(config.into_outfile.clone())),
        Box::new(injection::DdlOperation::new(config.ddl_operation.clone())),
        Box::new(injection::DangerousFunction::new(config.dangerous_function.clone())),
        Box::new(injection::CallStatement::new(config.call_statement.clone())),
        Box::new(injection::MetadataStatement::new(config.metadata_statement.clone())),
        Box::new(injection::SetStatement::new(config.set_statement.clone())),
        Box::new(injection::DeniedTable::new(config.denied_table.clone())),
        Box::new(injection::ReadOnlyTable::new(config.read_only_table.clone())),
    ]
}

/// Run every checker in `registry` against `input`, aggregating into one
/// [`ValidationResult`] (spec.md §4.4). A checker whose `check` panics is
/// contained: the orchestrator records it as a `MEDIUM` `internal_error`
/// violation tagged with the offending checker and continues with the rest
/// (§7 propagation policy).
pub fn run(registry: &[Box<dyn Checker>], input: &CheckInput<'_>) -> ValidationResult {
    let mut result = ValidationResult::new();
    for checker in registry {
        if checker.dispatch() == Dispatch::Ast && input.statement.is_unknown() {
            continue;
        }
        let mut local = ValidationResult::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| checker.check(input, &mut local)));
        match outcome {
            Ok(()) => result.merge(local),
            Err(_) => {
                tracing::error!(
                    checker = checker.rule_tag(),
                    "checker panicked, containing and continuing with the rest of the catalogue"
                );
                result.add_violation(Violation {
                    risk:       RiskLevel::Medium,
                    message:    format!("internal error in checker '{}'", checker.rule_tag()),
                    suggestion: None,
                    rule_tag:   "internal_error".to_string()
                })
            }
        }
    }
    result
}
