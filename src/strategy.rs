//! The validator-level enforcement strategy.
//!
//! Per-rule configuration only controls whether/how severely a violation is
//! emitted; what happens to a failing [`ValidationResult`] overall is a
//! single, validator-wide choice.

use serde::{Deserialize, Serialize};

use crate::{
    error::{safety_violation_error, AppError, AppResult},
    risk::RiskLevel,
    violation::ValidationResult
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Strategy {
    Pass,
    Log,
    Warn,
    Block
}

/// What a non-`BLOCK` strategy did with a failing result. `apply` also emits
/// a `tracing` event at the matching level so the core's own structured
/// logging carries the violation even if the host never inspects the
/// returned outcome; the outcome itself remains available for hosts that
/// want to render it through their own sink (e.g. an audit-log adapter).
#[derive(Debug, Clone)]
pub enum StrategyOutcome {
    /// The result passed, or the strategy is `PASS`: nothing to report.
    Passthrough,
    /// `LOG`/`WARN` on a failing result: carries the level to log at.
    Logged {
        level:  LogLevel,
        result: ValidationResult
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn
}

/// Apply `strategy` to `result`. `BLOCK` on a failing result surfaces a
/// [`crate::error::AppError`]; every other case returns normally.
pub fn apply(strategy: Strategy, result: ValidationResult) -> AppResult<StrategyOutcome> {
    if result.passed {
        return Ok(StrategyOutcome::Passthrough);
    }
    match strategy {
        Strategy::Pass => Ok(StrategyOutcome::Passthrough),
        Strategy::Log => {
            tracing::info!(risk = ?result.risk, violations = result.violations.len(), "sql safety violation");
            Ok(StrategyOutcome::Logged {
                level: LogLevel::Info,
                result
            })
        }
        Strategy::Warn => {
            tracing::warn!(risk = ?result.risk, violations = result.violations.len(), "sql safety violation");
            Ok(StrategyOutcome::Logged {
                level: LogLevel::Warn,
                result
            })
        }
        Strategy::Block => Err(block_error(result))
    }
}

fn block_error(result: ValidationResult) -> AppError {
    safety_violation_error(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::Violation;

    fn failing_result(risk: RiskLevel) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.add_violation(Violation {
            risk,
            message: "DELETE without WHERE".into(),
            suggestion: None,
            rule_tag: "no_where_clause".into()
        });
        result
    }

    #[test]
    fn pass_strategy_never_errors() {
        let outcome = apply(Strategy::Pass, failing_result(RiskLevel::Critical)).unwrap();
        assert!(matches!(outcome, StrategyOutcome::Passthrough));
    }

    #[test]
    fn log_strategy_reports_info_level() {
        let outcome = apply(Strategy::Log, failing_result(RiskLevel::Medium)).unwrap();
        assert!(matches!(
            outcome,
            StrategyOutcome::Logged {
                level: LogLevel::Info,
                ..
            }
        ));
    }

    #[test]
    fn warn_strategy_reports_warn_level() {
        let outcome = apply(Strategy::Warn, failing_result(RiskLevel::Medium)).unwrap();
        assert!(matches!(
            outcome,
            StrategyOutcome::Logged {
                level: LogLevel::Warn,
                ..
            }
        ));
    }

    #[test]
    fn block_strategy_errors_on_failure() {
        assert!(apply(Strategy::Block, failing_result(RiskLevel::Critical)).is_err());
    }

    #[test]
    fn passing_result_never_errors_under_block() {
        let outcome = apply(Strategy::Block, ValidationResult::new()).unwrap();
        assert!(matches!(outcome, StrategyOutcome::Passthrough));
    }
}
