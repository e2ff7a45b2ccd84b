//! The parse façade: turns raw SQL text into a [`Statement`] façade value,
//! backed by a bounded, concurrency-safe LRU cache keyed on the SQL text
//! itself.
//!
//! Strict mode surfaces a [`crate::error::AppError`] on a parse failure;
//! lenient mode demotes the statement to [`Statement::Unknown`] instead, so
//! raw-text checkers still run against it.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use sqlparser::{dialect::GenericDialect, parser::Parser};

use crate::{
    ast::{self, Statement},
    error::{parse_error, AppResult}
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    Lenient
}

/// A bounded, move-to-front LRU cache of parsed statements, shared (behind a
/// mutex) across concurrent calls into the same façade. This is the only
/// internally-shared mutable structure in the core; everything else is
/// either per-call or per-thread.
struct ParseCache {
    entries:  IndexMap<String, Statement>,
    capacity: usize
}

impl ParseCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity.min(1024)),
            capacity
        }
    }

    fn get(&mut self, sql: &str) -> Option<Statement> {
        let (_, value) = self.entries.shift_remove_entry(sql)?;
        self.entries.insert(sql.to_string(), value.clone());
        Some(value)
    }

    fn put(&mut self, sql: &str, statement: Statement) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(sql) {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(sql.to_string(), statement);
    }
}

pub struct ParseFacade {
    mode:  ParseMode,
    cache: Arc<Mutex<ParseCache>>
}

impl ParseFacade {
    pub fn new(mode: ParseMode) -> Self {
        Self::with_cache_size(mode, 1000)
    }

    pub fn with_cache_size(mode: ParseMode, cache_size: usize) -> Self {
        Self {
            mode,
            cache: Arc::new(Mutex::new(ParseCache::new(cache_size.max(1))))
        }
    }

    /// Parse `sql`, returning the façade `Statement`. In strict mode a parse
    /// failure is an error; in lenient mode it becomes
    /// [`Statement::Unknown`].
    pub fn parse(&self, sql: &str) -> AppResult<Statement> {
        if let Ok(mut cache) = self.cache.lock()
            && let Some(statement) = cache.get(sql)
        {
            return Ok(statement);
        }

        let statement = match Parser::parse_sql(&GenericDialect {}, sql) {
            Ok(mut statements) if !statements.is_empty() => {
                ast::from_sqlparser(sql.to_string(), statements.remove(0))
            }
            Ok(_) => Statement::unparsed(sql.to_string()),
            Err(cause) => {
                if self.mode == ParseMode::Lenient {
                    tracing::warn!(
                        error = %cause,
                        "lenient parse fallback: statement demoted to raw-text only"
                    );
                    Statement::unparsed(sql.to_string())
                } else {
                    return Err(parse_error(sql, cause));
                }
            }
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(sql, statement.clone());
        }
        Ok(statement)
    }
}
