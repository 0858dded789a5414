//! Pre-execution review of caller-submitted SQL text.
//!
//! Uses `sqlparser` as the SQL frontend: the tokenizer backs the read-only
//! query gate, and a full parse backs the batch audit so malformed but
//! tokenizable statements are caught before execution.

use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::statement;

/// Outcome of the read-only query gate.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCheck {
    pub bad_query: bool,
    pub filtered_sql: String,
    pub msg: Option<String>,
}

impl QueryCheck {
    fn bad(filtered_sql: String, msg: impl Into<String>) -> Self {
        Self {
            bad_query: true,
            filtered_sql,
            msg: Some(msg.into()),
        }
    }
}

/// Review query text before execution.
///
/// `filtered_sql` is the original text with leading comments and one
/// trailing terminator removed; the statement itself is never rewritten.
/// The text is flagged when it is lexically invalid, when it is not a
/// SELECT-like statement, or when it contains more than one statement.
pub fn query_check(sql: &str) -> QueryCheck {
    let filtered = statement::strip_terminator(statement::strip_leading_comments(sql)).to_string();

    let dialect = GenericDialect {};
    let tokens = match Tokenizer::new(&dialect, &filtered).tokenize() {
        Ok(tokens) => tokens,
        Err(err) => return QueryCheck::bad(filtered, format!("invalid SQL text: {err}")),
    };

    let mut significant = tokens.iter().filter(|t| !matches!(t, Token::Whitespace(_)));
    match significant.next() {
        Some(Token::Word(word)) if matches!(word.keyword, Keyword::SELECT | Keyword::WITH) => {}
        Some(_) => {
            return QueryCheck::bad(filtered, "only SELECT statements are allowed for queries")
        }
        None => return QueryCheck::bad(filtered, "empty query"),
    }

    if significant.any(|t| matches!(t, Token::SemiColon)) {
        return QueryCheck::bad(filtered, "only a single statement may be queried");
    }

    QueryCheck {
        bad_query: false,
        filtered_sql: filtered,
        msg: None,
    }
}

/// Syntax audit for one statement of a reviewed batch.
///
/// A full parse, not a token scan: a misspelled keyword tokenizes cleanly
/// but must still fail the audit.
pub fn audit_error(sql: &str) -> Option<String> {
    let dialect = GenericDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(_) => None,
        Err(err) => Some(err.to_string()),
    }
}
