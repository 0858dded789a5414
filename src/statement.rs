//! Statement-level SQL text handling shared by all dialect adapters:
//! batch splitting, row-limit detection and rewriting, literal escaping.
//!
//! Everything here works on raw text with a small literal/comment-aware
//! scanner; no statement is ever parsed into an AST.

/// Row-limit clause syntax for one dialect family. Data, not logic: a new
/// dialect plugs in its clause without touching the query executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSyntax {
    /// `FETCH FIRST <n> ROWS ONLY` (Dameng, Oracle, DB2 family)
    FetchFirst,
    /// `LIMIT <n>` (MySQL, PostgreSQL family)
    Limit,
}

impl LimitSyntax {
    pub fn clause(&self, max_rows: u64) -> String {
        match self {
            LimitSyntax::FetchFirst => format!("FETCH FIRST {max_rows} ROWS ONLY"),
            LimitSyntax::Limit => format!("LIMIT {max_rows}"),
        }
    }
}

/// Split a SQL block into individual semicolon-terminated statements.
///
/// Semicolons inside string literals, quoted identifiers, and comments do
/// not terminate a statement. Empty and whitespace-only fragments are
/// dropped; statements keep their embedded comments.
pub fn split_statements(block: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = block.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                current.push(c);
                consume_quoted(&mut chars, &mut current, c);
            }
            '-' if chars.peek() == Some(&'-') => {
                current.push(c);
                current.push(chars.next().unwrap_or('-'));
                for lc in chars.by_ref() {
                    current.push(lc);
                    if lc == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                current.push(c);
                current.push(chars.next().unwrap_or('*'));
                let mut prev = '\0';
                for bc in chars.by_ref() {
                    current.push(bc);
                    if prev == '*' && bc == '/' {
                        break;
                    }
                    prev = bc;
                }
            }
            ';' => {
                push_fragment(&mut statements, &mut current);
            }
            _ => current.push(c),
        }
    }
    push_fragment(&mut statements, &mut current);
    statements
}

/// Copy a quoted run into `out`, honoring doubled-quote escapes.
fn consume_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, out: &mut String, quote: char) {
    while let Some(c) = chars.next() {
        out.push(c);
        if c == quote {
            if chars.peek() == Some(&quote) {
                out.push(chars.next().unwrap_or(quote));
            } else {
                return;
            }
        }
    }
}

fn push_fragment(statements: &mut Vec<String>, current: &mut String) {
    let fragment = current.trim();
    if !fragment.is_empty() {
        statements.push(fragment.to_string());
    }
    current.clear();
}

/// Strip one trailing statement terminator, if present.
pub fn strip_terminator(sql: &str) -> &str {
    let trimmed = sql.trim_end();
    trimmed.strip_suffix(';').map_or(trimmed, str::trim_end)
}

/// Skip leading whitespace and comments, returning the first real token
/// onwards.
pub fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = trimmed.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            return trimmed;
        }
    }
}

/// Escape a value for interpolation into a single-quoted SQL literal by
/// doubling embedded quote characters. Shared by every catalog query that
/// builds SQL by substitution.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Blank out string literals, quoted identifiers, and comments so token
/// scans cannot match inside them.
fn scrub(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push(' ');
                let mut scratch = String::new();
                consume_quoted(&mut chars, &mut scratch, c);
                out.extend(scratch.chars().map(|sc| if sc == '\n' { '\n' } else { ' ' }));
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                out.push_str("  ");
                for lc in chars.by_ref() {
                    if lc == '\n' {
                        out.push('\n');
                        break;
                    }
                    out.push(' ');
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                let mut prev = '\0';
                for bc in chars.by_ref() {
                    out.push(if bc == '\n' { '\n' } else { ' ' });
                    if prev == '*' && bc == '/' {
                        break;
                    }
                    prev = bc;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Uppercased word tokens of the statement, with punctuation separated out
/// and literal/comment content removed.
fn scan_tokens(sql: &str) -> Vec<String> {
    let mut padded = String::with_capacity(sql.len());
    for c in scrub(sql).chars() {
        if "(),;<=>".contains(c) {
            padded.push(' ');
            padded.push(c);
            padded.push(' ');
        } else {
            padded.push(c);
        }
    }
    padded
        .split_whitespace()
        .map(|t| t.to_uppercase())
        .collect()
}

fn is_count(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// True when the statement already carries a row-limiting construct:
/// `LIMIT n`, `TOP n`, `ROWNUM <= n`, or `FETCH FIRST n ROWS ONLY`.
/// Matching is case-insensitive and whole-token.
pub fn has_limit_clause(sql: &str) -> bool {
    let tokens = scan_tokens(sql);
    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).map(String::as_str);
        match token.as_str() {
            "LIMIT" | "TOP" if next.is_some_and(is_count) => return true,
            "ROWNUM" if matches!(next, Some("<") | Some("=")) => return true,
            "FETCH" if matches!(next, Some("FIRST") | Some("NEXT")) => return true,
            _ => {}
        }
    }
    false
}

/// True for statements that produce a row set a preview cap applies to.
pub fn is_select_like(sql: &str) -> bool {
    matches!(
        scan_tokens(sql).first().map(String::as_str),
        Some("SELECT") | Some("WITH")
    )
}

/// Rewrite `sql` so the backend returns at most `max_rows` rows.
///
/// No-op when `max_rows` is 0, when the statement is not SELECT-like, or
/// when it already carries a limiting construct; the policy never stacks a
/// second limit over caller intent. Must run before execution so the
/// backend never fetches more rows than requested.
pub fn apply_limit(sql: &str, max_rows: u64, syntax: LimitSyntax) -> String {
    if max_rows == 0 || !is_select_like(sql) || has_limit_clause(sql) {
        return sql.to_string();
    }
    format!("{} {}", strip_terminator(sql), syntax.clause(max_rows))
}
