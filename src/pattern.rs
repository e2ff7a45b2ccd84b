//! Wildcard-to-regex pattern matching and identifier normalization, shared by
//! the `DeniedTable` and `ReadOnlyTable` checkers.
//!
//! The wildcard semantics are deliberately **not** POSIX-glob-compatible:
//! `*` means "one or more non-underscore characters," not "zero or more of
//! anything." `sys_*` matches `sys_user` but not `system` (no underscore
//! present) and not `sys_user_detail` (an extra underscore beyond the one
//! segment). This is pinned by the test scenarios and must never be "fixed"
//! to ordinary glob behavior, which would silently broaden every configured
//! blacklist.

use std::sync::OnceLock;

use regex::Regex;

/// A single compiled table-name pattern. Compilation is lazy: the regex is
/// built once, on first match, and cached for the lifetime of the pattern.
pub struct TablePattern {
    source:  String,
    compiled: OnceLock<Regex>
}

impl TablePattern {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source:   source.into(),
            compiled: OnceLock::new()
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Match a (already delimiter/schema normalized) identifier against this
    /// pattern, case-insensitively.
    pub fn matches(&self, identifier: &str) -> bool {
        let regex = self
            .compiled
            .get_or_init(|| compile(&self.source.to_lowercase()));
        regex.is_match(&identifier.to_lowercase())
    }
}

impl Clone for TablePattern {
    fn clone(&self) -> Self {
        Self::new(self.source.clone())
    }
}

impl std::fmt::Debug for TablePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePattern").field("source", &self.source).finish()
    }
}

/// Compile a lowercased wildcard pattern into an anchored, case-insensitive
/// regex. `*` becomes "one or more non-underscore characters"; every other
/// regex metacharacter in the pattern is escaped literally first.
fn compile(pattern: &str) -> Regex {
    let mut regex_src = String::with_capacity(pattern.len() * 2 + 8);
    regex_src.push_str("(?i)^");
    let mut first = true;
    for segment in pattern.split('*') {
        if !first {
            regex_src.push_str("[^_]+");
        }
        regex_src.push_str(&regex::escape(segment));
        first = false;
    }
    regex_src.push('$');
    Regex::new(&regex_src).unwrap_or_else(|_| {
        Regex::new(&format!("(?i)^{}$", regex::escape(pattern))).expect("literal regex is valid")
    })
}

/// Strip one matching pair of outer delimiters (backticks, double quotes, or
/// square brackets), then strip any `<schema>.` prefix (everything up to and
/// including the last dot).
pub fn normalize_identifier(identifier: &str) -> String {
    let stripped = strip_delimiters(identifier);
    strip_schema_prefix(stripped)
}

fn strip_delimiters(identifier: &str) -> &str {
    let trimmed = identifier.trim();
    let pairs: [(char, char); 3] = [('`', '`'), ('"', '"'), ('[', ']')];
    for (open, close) in pairs {
        if trimmed.len() >= 2
            && trimmed.starts_with(open)
            && trimmed.ends_with(close)
        {
            return &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
        }
    }
    trimmed
}

fn strip_schema_prefix(identifier: &str) -> String {
    match identifier.rfind('.') {
        Some(idx) => identifier[idx + 1..].to_string(),
        None => identifier.to_string()
    }
}
