//! Literal- and comment-aware scanning over raw SQL text.
//!
//! The AST-shape checkers get their structure from [`crate::ast`]; the
//! raw-text checkers (and the deduplication filter's normalizer) need a
//! character-by-character classification of the SQL string instead, because
//! they must reason about things the parser either cannot see (multiple
//! statements, comments, session commands) or refuses to parse at all.
//!
//! Every function here tracks `'`, `"`, and backtick-quoted regions (with
//! quote-doubling escapes), Oracle optimizer hints (`/*+ ... */`) distinctly
//! from ordinary block comments, and skips over MyBatis-style placeholders
//! (`#{...}`, `${...}`) so a bare `#` inside one is never mistaken for a
//! line-comment marker.

/// Classification of a single character of SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Code,
    Literal,
    LineComment,
    BlockComment,
    HintComment
}

/// Classify every character of `sql`. The returned vector has exactly
/// `sql.chars().count()` entries, aligned with `sql.chars()`.
pub fn classify_chars(sql: &str) -> Vec<CharClass> {
    enum State {
        Code,
        Single,
        Double,
        Backtick,
        Line,
        Block { hint: bool },
        Placeholder
    }

    let chars: Vec<char> = sql.chars().collect();
    let mut classes = vec![CharClass::Code; chars.len()];
    let mut state = State::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match state {
            State::Code => {
                if (c == '#' || c == '$') && chars.get(i + 1) == Some(&'{') {
                    state = State::Placeholder;
                    i += 2;
                    continue;
                }
                match c {
                    '\'' => {
                        classes[i] = CharClass::Literal;
                        state = State::Single;
                    }
                    '"' => {
                        classes[i] = CharClass::Literal;
                        state = State::Double;
                    }
                    '`' => {
                        classes[i] = CharClass::Literal;
                        state = State::Backtick;
                    }
                    '-' if chars.get(i + 1) == Some(&'-') => {
                        classes[i] = CharClass::LineComment;
                        classes[i + 1] = CharClass::LineComment;
                        state = State::Line;
                        i += 2;
                        continue;
                    }
                    '/' if chars.get(i + 1) == Some(&'*') => {
                        let hint = chars.get(i + 2) == Some(&'+');
                        let cls = if hint {
                            CharClass::HintComment
                        } else {
                            CharClass::BlockComment
                        };
                        classes[i] = cls;
                        classes[i + 1] = cls;
                        state = State::Block {
                            hint
                        };
                        i += 2;
                        continue;
                    }
                    '#' => {
                        classes[i] = CharClass::LineComment;
                        state = State::Line;
                    }
                    _ => {}
                }
            }
            State::Single => {
                classes[i] = CharClass::Literal;
                if c == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        classes[i + 1] = CharClass::Literal;
                        i += 2;
                        continue;
                    }
                    state = State::Code;
                }
            }
            State::Double => {
                classes[i] = CharClass::Literal;
                if c == '"' {
                    if chars.get(i + 1) == Some(&'"') {
                        classes[i + 1] = CharClass::Literal;
                        i += 2;
                        continue;
                    }
                    state = State::Code;
                }
            }
            State::Backtick => {
                classes[i] = CharClass::Literal;
                if c == '`' {
                    if chars.get(i + 1) == Some(&'`') {
                        classes[i + 1] = CharClass::Literal;
                        i += 2;
                        continue;
                    }
                    state = State::Code;
                }
            }
            State::Line => {
                if c == '\n' {
                    state = State::Code;
                } else {
                    classes[i] = CharClass::LineComment;
                }
            }
            State::Block {
                hint
            } => {
                let cls = if hint {
                    CharClass::HintComment
                } else {
                    CharClass::BlockComment
                };
                classes[i] = cls;
                if c == '*' && chars.get(i + 1) == Some(&'/') {
                    classes[i + 1] = cls;
                    state = State::Code;
                    i += 2;
                    continue;
                }
            }
            State::Placeholder => {
                if c == '}' {
                    state = State::Code;
                }
            }
        }
        i += 1;
    }
    classes
}

/// True when the raw SQL contains a semicolon that is outside any string
/// literal and is followed by non-whitespace, non-comment content (a purely
/// trailing semicolon does not count).
pub fn has_significant_semicolon(sql: &str) -> bool {
    let chars: Vec<char> = sql.chars().collect();
    let classes = classify_chars(sql);
    for (i, &c) in chars.iter().enumerate() {
        if c == ';' && classes[i] == CharClass::Code && has_trailing_content(&chars, &classes, i + 1)
        {
            return true;
        }
    }
    false
}

fn has_trailing_content(chars: &[char], classes: &[CharClass], mut i: usize) -> bool {
    while i < chars.len() {
        if classes[i] == CharClass::Code && !chars[i].is_whitespace() {
            return true;
        }
        i += 1;
    }
    false
}

/// True when the SQL contains a line comment (`--`, `#`) or a block comment
/// outside any literal. Oracle-style hint comments (`/*+ ... */`) pass
/// unless `allow_hint_comments` is false.
pub fn has_disallowed_comment(sql: &str, allow_hint_comments: bool) -> bool {
    classify_chars(sql).iter().any(|class| match class {
        CharClass::LineComment | CharClass::BlockComment => true,
        CharClass::HintComment => !allow_hint_comments,
        CharClass::Code | CharClass::Literal => false
    })
}

/// Render `sql` with every literal/comment span blanked out and the
/// remaining code upper-cased, so plain substring/regex matching on keyword
/// sequences cannot be fooled by a literal or comment containing the same
/// text.
pub fn code_only_uppercase(sql: &str) -> String {
    let classes = classify_chars(sql);
    sql.chars()
        .zip(classes.iter())
        .map(|(c, class)| {
            if *class == CharClass::Code {
                c.to_ascii_uppercase()
            } else {
                ' '
            }
        })
        .collect()
}

/// The first identifier-shaped token of `sql`, skipping leading whitespace
/// and leading comments, upper-cased. `None` if the statement has no leading
/// keyword (e.g. it is empty, or starts with punctuation).
pub fn leading_keyword(sql: &str) -> Option<String> {
    let chars: Vec<char> = sql.chars().collect();
    let classes = classify_chars(sql);
    let mut i = 0;
    while i < chars.len() && (classes[i] != CharClass::Code || chars[i].is_whitespace()) {
        i += 1;
    }
    let mut word = String::new();
    while i < chars.len() && classes[i] == CharClass::Code {
        let c = chars[i];
        if c.is_alphanumeric() || c == '_' {
            word.push(c);
            i += 1;
        } else {
            break;
        }
    }
    if word.is_empty() {
        None
    } else {
        Some(word.to_uppercase())
    }
}

/// Normalize SQL for the deduplication cache key: lowercase, strip all
/// whitespace, strip comments outside literals. Idempotent:
/// `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(sql: &str) -> String {
    let classes = classify_chars(sql);
    sql.chars()
        .zip(classes.iter())
        .filter_map(|(c, class)| match class {
            CharClass::LineComment | CharClass::BlockComment | CharClass::HintComment => None,
            CharClass::Code | CharClass::Literal => {
                if c.is_whitespace() {
                    None
                } else {
                    Some(c.to_lowercase().next().unwrap_or(c))
                }
            }
        })
        .collect()
}
