//! Frozen, construction-time configuration for the validator.
//!
//! There is no file/env loader here: hosts build a [`ValidatorConfig`] value
//! however they like (literal, `serde_json`, their own config crate) and
//! hand it to [`crate::validator::Validator::new`]. Once built, a config is
//! immutable for the lifetime of the validator; a hot-reload means building a
//! new `Validator` and swapping it in at the call site.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{misconfiguration_error, AppResult},
    pattern::TablePattern,
    risk::RiskLevel,
    strategy::Strategy
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// When `true`, a statement that fails to parse is demoted to
    /// `Statement::Unknown` instead of surfacing a strict-mode parse error.
    pub lenient: bool
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            lenient: false
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicationConfig {
    pub enabled:    bool,
    pub cache_size: usize,
    pub ttl_ms:     u64
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            enabled:    true,
            cache_size: 1000,
            ttl_ms:     100
        }
    }
}

macro_rules! rule_config {
    ($name:ident { $($field:ident : $ty:ty = $default:expr),* $(,)? }, risk = $risk:expr) => {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            pub enabled: bool,
            pub risk: RiskLevel,
            $(pub $field: $ty,)*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    enabled: true,
                    risk: $risk,
                    $($field: $default,)*
                }
            }
        }
    };
}

rule_config!(NoWhereClauseConfig {}, risk = RiskLevel::Critical);

rule_config!(
    DummyConditionConfig {
        // Structural detection (`ast::dummy_conjuncts`) handles `1=1`, `true`,
        // and `'a'='a'` on its own; `1<>1 OR 1=1` is here because it is a
        // disjunction, not an `AND` conjunct, so it only matches through the
        // literal-text fallback (§4.3(a)).
        patterns: Vec<String> = vec![
            "1=1".to_string(),
            "true".to_string(),
            "'a'='a'".to_string(),
            "1<>1 OR 1=1".to_string()
        ],
    },
    risk = RiskLevel::High
);

rule_config!(
    BlacklistFieldsConfig {
        columns: Vec<String> = vec![
            "deleted".to_string(),
            "status".to_string(),
            "enabled".to_string()
        ],
    },
    risk = RiskLevel::High
);

rule_config!(
    WhitelistFieldsConfig {
        required: HashMap<String, Vec<String>> = HashMap::new(),
    },
    risk = RiskLevel::High
);

rule_config!(LogicalPaginationConfig {}, risk = RiskLevel::Critical);
rule_config!(NoConditionPaginationConfig {}, risk = RiskLevel::Critical);
rule_config!(
    DeepPaginationConfig {
        max_offset: u64 = 10_000,
    },
    risk = RiskLevel::Medium
);
rule_config!(
    LargePageSizeConfig {
        max_page_size: u64 = 1_000,
    },
    risk = RiskLevel::Medium
);
rule_config!(MissingOrderByConfig {}, risk = RiskLevel::Low);
rule_config!(NoPaginationConfig {}, risk = RiskLevel::Medium);

rule_config!(MultiStatementConfig {}, risk = RiskLevel::Critical);

rule_config!(
    SetOperationConfig {
        allowed: Vec<String> = Vec::new(),
    },
    risk = RiskLevel::High
);

rule_config!(
    SqlCommentConfig {
        allow_hint_comments: bool = false,
    },
    risk = RiskLevel::High
);

rule_config!(IntoOutfileConfig {}, risk = RiskLevel::Critical);

rule_config!(
    DdlOperationConfig {
        allowed_operations: Vec<String> = Vec::new(),
    },
    risk = RiskLevel::Critical
);

rule_config!(
    DangerousFunctionConfig {
        functions: Vec<String> = vec![
            "load_file".to_string(),
            "sys_exec".to_string(),
            "sys_eval".to_string(),
            "sleep".to_string(),
            "benchmark".to_string(),
            "pg_sleep".to_string(),
            "waitfor".to_string(),
            "xp_cmdshell".to_string(),
            "dbms_pipe".to_string(),
            "into_outfile".to_string()
        ],
    },
    risk = RiskLevel::Critical
);

rule_config!(CallStatementConfig {}, risk = RiskLevel::High);

rule_config!(
    MetadataStatementConfig {
        allowed_statements: Vec<String> = Vec::new(),
    },
    risk = RiskLevel::Medium
);

rule_config!(SetStatementConfig {}, risk = RiskLevel::Medium);

rule_config!(
    DeniedTableConfig {
        // Default denial set mirrors `BlacklistFieldsConfig`'s seeded
        // defaults rather than starting empty: these are the system/catalog
        // table families spec.md's own S3 worked example (`sys_*`) assumes a
        // default-configured validator already denies.
        patterns: Vec<String> = vec![
            "sys_*".to_string(),
            "pg_*".to_string(),
            "information_schema".to_string()
        ],
    },
    risk = RiskLevel::Critical
);

rule_config!(
    ReadOnlyTableConfig {
        patterns: Vec<String> = Vec::new(),
    },
    risk = RiskLevel::High
);

/// Not a checker: the risk assigned to the synthetic `unparseable_sql`
/// violation the validator entry point emits when the parse façade is in
/// strict mode and the parser rejects the statement (§4.6 step 3). Kept
/// alongside the rule catalogue since it is the one other configurable
/// "how severe is this" knob the validator exposes.
rule_config!(UnparseableSqlConfig {}, risk = RiskLevel::Critical);

impl DeniedTableConfig {
    pub fn compiled(&self) -> Vec<TablePattern> {
        self.patterns.iter().map(TablePattern::new).collect()
    }
}

impl ReadOnlyTableConfig {
    pub fn compiled(&self) -> Vec<TablePattern> {
        self.patterns.iter().map(TablePattern::new).collect()
    }
}

/// Every checker's configuration, keyed by field rather than by name string;
/// the orchestrator builds its ordered checker list directly from this.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuleCatalogConfig {
    pub no_where_clause:         NoWhereClauseConfig,
    pub dummy_condition:         DummyConditionConfig,
    pub blacklist_fields:        BlacklistFieldsConfig,
    pub whitelist_fields:        WhitelistFieldsConfig,
    pub logical_pagination:      LogicalPaginationConfig,
    pub no_condition_pagination: NoConditionPaginationConfig,
    pub deep_pagination:         DeepPaginationConfig,
    pub large_page_size:         LargePageSizeConfig,
    pub missing_order_by:        MissingOrderByConfig,
    pub no_pagination:           NoPaginationConfig,
    pub multi_statement:         MultiStatementConfig,
    pub set_operation:           SetOperationConfig,
    pub sql_comment:             SqlCommentConfig,
    pub into_outfile:            IntoOutfileConfig,
    pub ddl_operation:           DdlOperationConfig,
    pub dangerous_function:      DangerousFunctionConfig,
    pub call_statement:          CallStatementConfig,
    pub metadata_statement:      MetadataStatementConfig,
    pub set_statement:           SetStatementConfig,
    pub denied_table:            DeniedTableConfig,
    pub read_only_table:         ReadOnlyTableConfig,
    pub unparseable_sql:         UnparseableSqlConfig
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub parser:          ParserConfig,
    pub deduplication:   DeduplicationConfig,
    pub active_strategy: Strategy,
    pub rules:           RuleCatalogConfig
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            parser:          ParserConfig::default(),
            deduplication:   DeduplicationConfig::default(),
            active_strategy: Strategy::Block,
            rules:           RuleCatalogConfig::default()
        }
    }
}

impl ValidatorConfig {
    /// Construction-time validation. Called by
    /// [`crate::validator::Validator::new`] before the config is frozen.
    pub fn validate(&self) -> AppResult<()> {
        if !(1..=100_000).contains(&self.deduplication.cache_size) {
            return Err(misconfiguration_error(format!(
                "deduplication.cache_size must be in 1..=100000, got {}",
                self.deduplication.cache_size
            )));
        }
        if !(1..=60_000).contains(&self.deduplication.ttl_ms) {
            return Err(misconfiguration_error(format!(
                "deduplication.ttl_ms must be in 1..=60000, got {}",
                self.deduplication.ttl_ms
            )));
        }
        Ok(())
    }
}
