//! The validator entry point, wiring the parse façade, the checker registry,
//! the per-thread deduplication filter, and the enforcement strategy into a
//! single `validate` call (§4.6).

use crate::{
    config::ValidatorConfig,
    context::SqlContext,
    dedup::DedupFilter,
    error::AppResult,
    pagination_plugin::{NoPaginationFramework, PaginationPluginDetector},
    parse::{ParseFacade, ParseMode},
    rules::{self, CheckInput, Checker},
    strategy::{self, StrategyOutcome},
    violation::{ValidationResult, Violation}
};

/// A frozen, construction-validated safety validator.
///
/// Cheap to clone the handle around via `Arc` at the call site; internally
/// the parse cache is already behind its own `Arc<Mutex<_>>` and the
/// deduplication cache is per-thread (and keyed to this instance via
/// `dedup`), so a single `Validator` is safe to share across threads without
/// additional synchronization, and two distinct `Validator`s never observe
/// each other's cached results even on the same thread.
pub struct Validator {
    config:     ValidatorConfig,
    parser:     ParseFacade,
    registry:   Vec<Box<dyn Checker>>,
    pagination: Box<dyn PaginationPluginDetector>,
    dedup:      DedupFilter
}

impl Validator {
    /// Build a validator from `config`, rejecting an out-of-range
    /// `deduplication.cache_size`/`ttl_ms` at construction (§4.6, §7).
    /// Uses [`NoPaginationFramework`] as the pagination detector; hosts that
    /// have a real physical-pagination rewriter should call
    /// [`Validator::with_pagination_detector`] instead.
    pub fn new(config: ValidatorConfig) -> AppResult<Self> {
        Self::with_pagination_detector(config, Box::new(NoPaginationFramework))
    }

    pub fn with_pagination_detector(
        config: ValidatorConfig,
        pagination: Box<dyn PaginationPluginDetector>
    ) -> AppResult<Self> {
        config.validate()?;
        let mode = if config.parser.lenient {
            ParseMode::Lenient
        } else {
            ParseMode::Strict
        };
        let registry = rules::build_registry(&config.rules);
        Ok(Self {
            parser: ParseFacade::with_cache_size(mode, config.deduplication.cache_size.max(1)),
            registry,
            pagination,
            dedup: DedupFilter::new(),
            config
        })
    }

    /// Run the full catalogue against `ctx` and return the aggregate result.
    ///
    /// Blank SQL short-circuits to an empty, passing result before touching
    /// the parser, the dedup cache, or the registry (§4.6 edge case). A
    /// deduplication hit returns the cached result without re-parsing or
    /// re-running any checker.
    ///
    /// A strict-mode parse failure does not propagate as an error here: per
    /// §4.6 step 3 it becomes a single `unparseable_sql` violation at the
    /// configured risk (CRITICAL by default), which is cached under the
    /// normalized key exactly like any other result. [`ParseFacade::parse`]
    /// itself still surfaces the raw [`crate::error::AppError`] to callers
    /// that use the façade directly, outside the validator entry point.
    pub fn validate(&self, ctx: &SqlContext) -> AppResult<ValidationResult> {
        if ctx.is_blank() {
            return Ok(ValidationResult::new());
        }

        let dedup_cfg = &self.config.deduplication;
        if dedup_cfg.enabled
            && let Some(cached) = self.dedup.probe(ctx.sql(), dedup_cfg.cache_size, dedup_cfg.ttl_ms)
        {
            return Ok(cached);
        }

        let statement = match self.parser.parse(ctx.sql()) {
            Ok(statement) => statement,
            Err(cause) => {
                let mut result = ValidationResult::new();
                result.add_violation(Violation {
                    risk:       self.config.rules.unparseable_sql.risk,
                    message:    format!("unparseable_sql: {cause}"),
                    suggestion: None,
                    rule_tag:   "unparseable_sql".to_string()
                });
                if dedup_cfg.enabled {
                    self.dedup
                        .store(ctx.sql(), result.clone(), dedup_cfg.cache_size, dedup_cfg.ttl_ms);
                }
                return Ok(result);
            }
        };
        let input = CheckInput {
            ctx,
            statement: &statement,
            pagination: self.pagination.as_ref()
        };
        let result = rules::run(&self.registry, &input);

        if dedup_cfg.enabled {
            self.dedup
                .store(ctx.sql(), result.clone(), dedup_cfg.cache_size, dedup_cfg.ttl_ms);
        }

        Ok(result)
    }

    /// `validate` followed by [`strategy::apply`] against the configured
    /// `active_strategy` — the single call most hosts want at the
    /// interception point.
    pub fn enforce(&self, ctx: &SqlContext) -> AppResult<StrategyOutcome> {
        let result = self.validate(ctx)?;
        strategy::apply(self.config.active_strategy, result)
    }
}
