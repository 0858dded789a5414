//! The adapter contract: one polymorphic interface the host platform uses
//! to talk to every backend, regardless of dialect.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::check::QueryCheck;
use crate::driver::Driver;
use crate::error::EngineError;
use crate::instance::InstanceConfig;
use crate::meta::{ColumnMeta, IndexMeta, TableDescription, TableMeta};
use crate::result::{MetadataResult, ResultSet, ReviewSet};
use crate::statement::{self, LimitSyntax};
use crate::value::CellValue;

/// Dialect tag selecting an engine implementation at construction time.
///
/// A closed set: adding a backend means adding a variant and an
/// implementation, never runtime type inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Dameng,
}

impl DialectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::Dameng => "Dameng",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of one dialect: connection default, reachability
/// probe, and row-limit clause syntax.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    pub name: &'static str,
    pub default_port: u16,
    pub test_sql: &'static str,
    pub limit_syntax: LimitSyntax,
}

/// Options for one single-statement execution.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Preview row cap; 0 leaves the statement unlimited.
    pub max_rows: u64,
    /// Close the connection when the call returns.
    pub close_conn: bool,
    /// Values bound to statement placeholders, when any.
    pub parameters: Vec<CellValue>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_rows: 0,
            close_conn: true,
            parameters: vec![],
        }
    }
}

impl QueryOptions {
    /// Options for internal multi-query flows that keep the connection.
    pub(crate) fn keep_open() -> Self {
        Self {
            close_conn: false,
            ..Self::default()
        }
    }
}

/// Result of the connect-and-probe pre-check.
#[derive(Debug, Clone, PartialEq)]
pub struct Precheck {
    pub ok: bool,
    pub message: String,
}

/// The contract every dialect adapter satisfies.
///
/// An engine instance wraps one configured backend target and owns at most
/// one live connection. It is not meant for concurrent use: one logical
/// operation at a time per instance, independent instances for concurrency
/// across targets.
pub trait Engine {
    /// Static dialect description.
    fn dialect(&self) -> &'static Dialect;

    /// Connect-and-open-cursor probe. Success means the backend is
    /// reachable, not that `sql` is valid.
    fn precheck(&mut self, sql: &str) -> Precheck;

    /// Read-only review gate for query text.
    fn query_check(&self, sql: &str) -> QueryCheck {
        crate::check::query_check(sql)
    }

    /// Rewrite `sql` to cap its row output, per this dialect's clause.
    fn apply_limit(&self, sql: &str, max_rows: u64) -> String {
        statement::apply_limit(sql, max_rows, self.dialect().limit_syntax)
    }

    /// Execute a single statement and normalize its outcome. The execution
    /// primitive every higher-level call funnels through.
    fn query(&mut self, db: Option<&str>, sql: &str, opts: &QueryOptions) -> ResultSet;

    /// Audit a SQL block without executing it: one record per statement
    /// that fails the audit, none for a clean block.
    fn execute_check(&mut self, db: Option<&str>, sql_block: &str) -> ReviewSet;

    /// Execute a SQL block statement by statement, in order, isolating
    /// per-statement failure from the batch.
    fn execute_batch(&mut self, db: Option<&str>, sql_block: &str, close_conn: bool) -> ReviewSet;

    fn list_schemas(&mut self) -> MetadataResult<String>;

    fn list_tables(&mut self, schema: &str) -> MetadataResult<String>;

    fn list_columns(&mut self, schema: &str, table: &str) -> MetadataResult<String>;

    /// Full column descriptions for one table, comments included.
    fn describe_table(&mut self, schema: &str, table: &str) -> MetadataResult<ColumnMeta>;

    fn list_indexes(&mut self, schema: &str, table: &str) -> MetadataResult<IndexMeta>;

    /// Table-level metadata for one table, comment included.
    fn table_overview(&mut self, schema: &str, table: &str) -> MetadataResult<TableMeta>;

    /// Whole-schema data dictionary: every table with its described columns.
    fn schema_metadata(&mut self, schema: &str) -> MetadataResult<TableDescription>;

    /// Rollback statements for an executed batch, where the dialect can
    /// derive them. Signals `Unsupported` explicitly otherwise.
    fn rollback_statements(&mut self, review: &ReviewSet) -> Result<Vec<String>, EngineError>;

    /// Close the live connection, if any, clearing the instance's handle.
    fn close(&mut self);
}

/// Build the engine for `dialect` over the given instance and driver.
pub fn build_engine(
    dialect: DialectKind,
    instance: InstanceConfig,
    driver: Box<dyn Driver>,
) -> Box<dyn Engine> {
    match dialect {
        DialectKind::Dameng => Box::new(crate::dameng::DamengEngine::new(instance, driver)),
    }
}
