use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Normalized output of one executed statement.
///
/// When `error` is set, `column_list` and `rows` are always empty: a result
/// is never in a partial-success state for a single statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub column_list: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub affected_rows: u64,
    pub error: Option<String>,
}

impl ResultSet {
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            column_list: vec![],
            rows: vec![],
            affected_rows: 0,
            error: Some(message.into()),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome level of one reviewed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => write!(f, "ok"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One reviewed statement of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub sequence: usize,
    pub sql: String,
    pub severity: Severity,
    pub stage_status: String,
    pub error_message: String,
    pub affected_rows: u64,
}

/// Ordered review of one caller-submitted SQL block.
///
/// `error` is set only when the failure happened before any statement could
/// be attempted (e.g. the connection could not be acquired).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSet {
    pub rows: Vec<ReviewRecord>,
    pub error_count: usize,
    pub error: Option<String>,
    pub full_sql: String,
}

impl ReviewSet {
    pub fn new(full_sql: impl Into<String>) -> Self {
        Self {
            full_sql: full_sql.into(),
            ..Self::default()
        }
    }

    /// Append a record, keeping the aggregate error count in step.
    pub fn push(&mut self, record: ReviewRecord) {
        if record.severity == Severity::Error {
            self.error_count += 1;
        }
        self.rows.push(record);
    }
}

/// Result wrapper for catalog introspection calls.
///
/// Introspection never returns partial metadata alongside an error: `data`
/// is empty whenever `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResult<T> {
    pub error: Option<String>,
    pub data: Vec<T>,
}

impl<T> MetadataResult<T> {
    pub fn ok(data: Vec<T>) -> Self {
        Self { error: None, data }
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            data: vec![],
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

impl<T> Default for MetadataResult<T> {
    fn default() -> Self {
        Self::ok(vec![])
    }
}
