//! Dameng engine adapter: connection lifecycle, the single-statement
//! execution primitive, and the per-statement batch executor. Catalog
//! introspection lives in `catalog`.

mod catalog;

use tracing::{debug, warn};

use crate::check;
use crate::driver::{ConnectParams, Driver, Session};
use crate::engine::{Dialect, Engine, Precheck, QueryOptions};
use crate::error::EngineError;
use crate::instance::InstanceConfig;
use crate::meta::{ColumnMeta, IndexMeta, TableDescription, TableMeta};
use crate::result::{MetadataResult, ResultSet, ReviewRecord, ReviewSet, Severity};
use crate::statement::{self, LimitSyntax};

/// Dialect description for Dameng.
pub static DAMENG: Dialect = Dialect {
    name: "Dameng",
    default_port: 5236,
    test_sql: "SELECT 1 FROM DUAL",
    limit_syntax: LimitSyntax::FetchFirst,
};

/// Engine adapter for the Dameng database.
///
/// Owns at most one live session, moving `Unconnected -> Connected` on
/// first acquire and back on `close`. Never share one instance across
/// concurrent operations; build one instance per target instead.
pub struct DamengEngine {
    instance: InstanceConfig,
    driver: Box<dyn Driver>,
    conn: Option<Box<dyn Session>>,
}

impl DamengEngine {
    pub fn new(instance: InstanceConfig, driver: Box<dyn Driver>) -> Self {
        Self {
            instance,
            driver,
            conn: None,
        }
    }

    fn connect_params(&self) -> ConnectParams {
        let (host, port) = self.instance.server_address(DAMENG.default_port);
        ConnectParams {
            host,
            port,
            user: self.instance.user.clone(),
            password: self.instance.password.clone(),
        }
    }

    /// Acquire the live session, reusing an open one unchanged.
    ///
    /// On failure the connection field stays unset, so the next acquire
    /// retries from scratch. Schema targeting happens per statement, never
    /// by switching an existing session; `_db` is accepted for contract
    /// parity.
    fn connection(&mut self, _db: Option<&str>) -> Result<&mut dyn Session, EngineError> {
        if self.conn.is_none() {
            let params = self.connect_params();
            debug!(host = %params.host, port = params.port, "connecting to Dameng");
            let session = self.driver.connect(&params).map_err(|err| {
                EngineError::Connection(format!("Dameng connection failed: {err}"))
            })?;
            self.conn = Some(session);
        }
        match self.conn.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(EngineError::Connection(
                "Dameng connection failed: no live session".into(),
            )),
        }
    }

    /// Close the underlying handle, if any, and clear the instance's
    /// connection field so the next acquire opens a fresh session.
    /// Close-time errors become a logged side effect; they never mask a
    /// real execution error.
    fn disconnect(&mut self) {
        if let Some(mut session) = self.conn.take() {
            if let Err(err) = session.close() {
                warn!("error closing Dameng connection: {err}");
            }
        }
    }

    /// Run one statement on the live session and normalize its outcome.
    ///
    /// The cursor is released on drop on every exit path; closing the
    /// connection is the caller's concern.
    fn run_statement(
        &mut self,
        db: Option<&str>,
        sql: &str,
        opts: &QueryOptions,
    ) -> Result<ResultSet, EngineError> {
        let limited = statement::apply_limit(sql, opts.max_rows, DAMENG.limit_syntax);
        let session = self.connection(db)?;
        let mut cursor = session
            .cursor()
            .map_err(|err| EngineError::Statement(format!("Dameng query failed: {err}")))?;
        cursor
            .execute(&limited, &opts.parameters)
            .map_err(|err| EngineError::Statement(format!("Dameng query failed: {err}")))?;

        let mut result = ResultSet::default();
        if let Some(columns) = cursor.description() {
            result.column_list = columns;
            result.rows = cursor
                .fetch_all()
                .map_err(|err| EngineError::Statement(format!("Dameng query failed: {err}")))?;
        }
        let reported = cursor.row_count();
        result.affected_rows = if reported >= 0 {
            reported as u64
        } else {
            result.rows.len() as u64
        };
        Ok(result)
    }
}

impl Engine for DamengEngine {
    fn dialect(&self) -> &'static Dialect {
        &DAMENG
    }

    fn precheck(&mut self, _sql: &str) -> Precheck {
        let probe = self.connection(None).and_then(|session| {
            session
                .cursor()
                .map(|_| ())
                .map_err(|err| EngineError::Connection(format!("Dameng connection failed: {err}")))
        });
        match probe {
            Ok(()) => Precheck {
                ok: true,
                message: "backend reachable".into(),
            },
            Err(err) => Precheck {
                ok: false,
                message: err.to_string(),
            },
        }
    }

    fn query(&mut self, db: Option<&str>, sql: &str, opts: &QueryOptions) -> ResultSet {
        let outcome = self.run_statement(db, sql, opts);
        if opts.close_conn {
            self.disconnect();
        }
        match outcome {
            Ok(result) => result,
            Err(err) => ResultSet::from_error(err.to_string()),
        }
    }

    fn execute_check(&mut self, _db: Option<&str>, sql_block: &str) -> ReviewSet {
        let mut review = ReviewSet::new(sql_block);
        // A clean block yields zero records; only statements that fail the
        // audit are reported.
        for (index, stmt) in statement::split_statements(sql_block).into_iter().enumerate() {
            if let Some(message) = check::audit_error(&stmt) {
                review.push(ReviewRecord {
                    sequence: index + 1,
                    sql: stmt,
                    severity: Severity::Error,
                    stage_status: "audit failed".into(),
                    error_message: message,
                    affected_rows: 0,
                });
            }
        }
        review
    }

    fn execute_batch(&mut self, db: Option<&str>, sql_block: &str, close_conn: bool) -> ReviewSet {
        let mut review = ReviewSet::new(sql_block);
        let statements = statement::split_statements(sql_block);
        if statements.is_empty() {
            return review;
        }

        // Connection failure fails the batch atomically: one record, the
        // block-level error set, no statement attempted.
        if let Err(err) = self.connection(db) {
            let message = err.to_string();
            review.error = Some(message.clone());
            review.push(ReviewRecord {
                sequence: 1,
                sql: sql_block.trim().to_string(),
                severity: Severity::Error,
                stage_status: "failed".into(),
                error_message: message,
                affected_rows: 0,
            });
            return review;
        }

        for (index, stmt) in statements.into_iter().enumerate() {
            let outcome = self.run_statement(db, &stmt, &QueryOptions::keep_open());
            let record = match outcome {
                Ok(result) => ReviewRecord {
                    sequence: index + 1,
                    sql: stmt,
                    severity: Severity::Ok,
                    stage_status: "succeeded".into(),
                    error_message: String::new(),
                    affected_rows: result.affected_rows,
                },
                Err(err) => ReviewRecord {
                    sequence: index + 1,
                    sql: stmt,
                    severity: Severity::Error,
                    stage_status: "failed".into(),
                    error_message: err.to_string(),
                    affected_rows: 0,
                },
            };
            review.push(record);
        }

        if close_conn {
            self.disconnect();
        }
        review
    }

    fn list_schemas(&mut self) -> MetadataResult<String> {
        self.catalog_schemas()
    }

    fn list_tables(&mut self, schema: &str) -> MetadataResult<String> {
        self.catalog_tables(schema)
    }

    fn list_columns(&mut self, schema: &str, table: &str) -> MetadataResult<String> {
        self.catalog_columns(schema, table)
    }

    fn describe_table(&mut self, schema: &str, table: &str) -> MetadataResult<ColumnMeta> {
        self.catalog_describe(schema, table)
    }

    fn list_indexes(&mut self, schema: &str, table: &str) -> MetadataResult<IndexMeta> {
        self.catalog_indexes(schema, table)
    }

    fn table_overview(&mut self, schema: &str, table: &str) -> MetadataResult<TableMeta> {
        self.catalog_table_overview(schema, table)
    }

    fn schema_metadata(&mut self, schema: &str) -> MetadataResult<TableDescription> {
        self.catalog_schema_metadata(schema)
    }

    fn rollback_statements(&mut self, _review: &ReviewSet) -> Result<Vec<String>, EngineError> {
        Err(EngineError::Unsupported {
            dialect: DAMENG.name,
            operation: "rollback generation",
        })
    }

    fn close(&mut self) {
        self.disconnect();
    }
}
