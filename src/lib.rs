//! # SQL safety validation core
//!
//! An in-process, AST-aware safety net for SQL text submitted through an ORM,
//! query builder, or raw driver call: a bounded-cache parse façade, roughly
//! twenty independent rule checkers organized into three families (WHERE
//! integrity, pagination hygiene, and injection/access control), an
//! orchestrator that aggregates their violations into one risk-ranked
//! result, a per-thread deduplication filter for repeated validation of the
//! same statement, and a configurable enforcement strategy (pass, log, warn,
//! or block).
//!
//! Framework interceptors, config file loading, build-time scanning, report
//! generation, audit sinks, and host wiring around a specific ORM or driver
//! are all out of scope here — this crate is the decision engine a host
//! plugs into, not the plugin itself. [`pagination_plugin::PaginationPluginDetector`]
//! is the one seam a host implements to tell the `logical_pagination` rule
//! whether a physical pagination rewrite is actually installed.
//!
//! ```no_run
//! use sql_safety_core::{config::ValidatorConfig, context::SqlContext, validator::Validator};
//!
//! let validator = Validator::new(ValidatorConfig::default())?;
//! let ctx = SqlContext::derive("DELETE FROM users", "req-1");
//! let outcome = validator.enforce(&ctx);
//! # Ok::<(), masterror::AppError>(())
//! ```

pub mod ast;
pub mod config;
pub mod context;
pub mod dedup;
pub mod error;
pub mod pagination_plugin;
pub mod parse;
pub mod pattern;
pub mod risk;
pub mod rules;
pub mod sql_text;
pub mod strategy;
pub mod validator;
pub mod violation;
