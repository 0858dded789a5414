//! Catalog introspection for Dameng.
//!
//! Read-only queries over the system catalog (`SYSOBJECTS`, `SYSCOLUMNS`,
//! the comment relations, and the `ALL_*` index views), mapped into the
//! dialect-agnostic metadata shapes. Structural metadata and free-text
//! comments live in separate relations, so comments always come from a
//! second query keyed by the owning object.
//!
//! These queries build SQL by substitution rather than bound parameters;
//! every interpolated identifier goes through `statement::escape_literal`.

use crate::engine::QueryOptions;
use crate::error::EngineError;
use crate::meta::{ColumnMeta, IndexMeta, TableDescription, TableMeta};
use crate::result::MetadataResult;
use crate::statement::escape_literal;
use crate::value::CellValue;

use super::DamengEngine;

const SCHEMAS_SQL: &str = "SELECT NAME FROM SYSOBJECTS WHERE TYPE$ = 'SCH' ORDER BY NAME";

fn tables_sql(schema: &str) -> String {
    format!(
        "SELECT O.NAME \
         FROM SYSOBJECTS O \
         JOIN SYSOBJECTS S ON O.SCHID = S.ID \
         WHERE O.TYPE$ = 'SCHOBJ' \
           AND O.SUBTYPE$ IN ('UTAB', 'STAB') \
           AND S.TYPE$ = 'SCH' \
           AND S.NAME = '{}' \
         ORDER BY O.NAME",
        escape_literal(schema)
    )
}

fn columns_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT C.NAME \
         FROM SYSCOLUMNS C \
         JOIN SYSOBJECTS T ON C.ID = T.ID \
         JOIN SYSOBJECTS S ON T.SCHID = S.ID \
         WHERE T.NAME = '{}' \
           AND S.NAME = '{}' \
           AND T.TYPE$ = 'SCHOBJ' \
           AND T.SUBTYPE$ IN ('UTAB', 'STAB') \
           AND S.TYPE$ = 'SCH' \
         ORDER BY C.COLID",
        escape_literal(table),
        escape_literal(schema)
    )
}

fn describe_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT C.NAME, C.TYPE$, C.LENGTH$, C.SCALE, C.NULLABLE$, C.DEFVAL, C.COLID \
         FROM SYSCOLUMNS C \
         JOIN SYSOBJECTS T ON C.ID = T.ID \
         JOIN SYSOBJECTS S ON T.SCHID = S.ID \
         WHERE T.NAME = '{}' \
           AND S.NAME = '{}' \
           AND T.TYPE$ = 'SCHOBJ' \
           AND T.SUBTYPE$ IN ('UTAB', 'STAB') \
           AND S.TYPE$ = 'SCH' \
         ORDER BY C.COLID",
        escape_literal(table),
        escape_literal(schema)
    )
}

fn table_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT O.NAME, S.NAME, O.ID, O.CRTDATE \
         FROM SYSOBJECTS O \
         JOIN SYSOBJECTS S ON O.SCHID = S.ID \
         WHERE O.TYPE$ = 'SCHOBJ' \
           AND O.SUBTYPE$ IN ('UTAB', 'STAB') \
           AND S.TYPE$ = 'SCH' \
           AND S.NAME = '{}' \
           AND O.NAME = '{}'",
        escape_literal(schema),
        escape_literal(table)
    )
}

fn table_comment_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT COMMENT$ FROM SYSTABLECOMMENTS WHERE SCHNAME = '{}' AND TVNAME = '{}'",
        escape_literal(schema),
        escape_literal(table)
    )
}

fn column_comment_sql(schema: &str, table: &str, column: &str) -> String {
    format!(
        "SELECT COMMENT$ FROM SYSCOLUMNCOMMENTS \
         WHERE SCHNAME = '{}' AND TVNAME = '{}' AND COLNAME = '{}'",
        escape_literal(schema),
        escape_literal(table),
        escape_literal(column)
    )
}

fn indexes_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT IC.COLUMN_NAME, I.INDEX_NAME, I.UNIQUENESS, IC.COLUMN_POSITION, I.INDEX_TYPE \
         FROM ALL_INDEXES I \
         JOIN ALL_IND_COLUMNS IC ON IC.INDEX_OWNER = I.OWNER AND IC.INDEX_NAME = I.INDEX_NAME \
         WHERE I.TABLE_OWNER = '{}' \
           AND I.TABLE_NAME = '{}' \
         ORDER BY I.INDEX_NAME, IC.COLUMN_POSITION",
        escape_literal(schema),
        escape_literal(table)
    )
}

impl DamengEngine {
    /// Run one read-only catalog query, keeping the connection for the
    /// next query of the same call.
    fn catalog_rows(&mut self, sql: &str) -> Result<Vec<Vec<CellValue>>, EngineError> {
        match self.run_statement(None, sql, &QueryOptions::keep_open()) {
            Ok(result) => Ok(result.rows),
            Err(EngineError::Statement(message)) => Err(EngineError::Introspection(message)),
            Err(err) => Err(err),
        }
    }

    /// Release the connection and fold the outcome into the metadata shape:
    /// either the assembled records, or the error with no partial data.
    fn finish<T>(&mut self, outcome: Result<Vec<T>, EngineError>) -> MetadataResult<T> {
        self.disconnect();
        match outcome {
            Ok(data) => MetadataResult::ok(data),
            Err(err) => MetadataResult::from_error(err.to_string()),
        }
    }

    pub(crate) fn catalog_schemas(&mut self) -> MetadataResult<String> {
        let outcome = self.catalog_rows(SCHEMAS_SQL).map(first_column);
        self.finish(outcome)
    }

    pub(crate) fn catalog_tables(&mut self, schema: &str) -> MetadataResult<String> {
        let outcome = self.catalog_rows(&tables_sql(schema)).map(first_column);
        self.finish(outcome)
    }

    pub(crate) fn catalog_columns(&mut self, schema: &str, table: &str) -> MetadataResult<String> {
        let outcome = self
            .catalog_rows(&columns_sql(schema, table))
            .map(first_column);
        self.finish(outcome)
    }

    pub(crate) fn catalog_describe(
        &mut self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<ColumnMeta> {
        let outcome = self.describe_inner(schema, table);
        self.finish(outcome)
    }

    fn describe_inner(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnMeta>, EngineError> {
        let rows = self.catalog_rows(&describe_sql(schema, table))?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(mut column) = map_column(row) else {
                continue;
            };
            column.comment = self.column_comment(schema, table, &column.name)?;
            columns.push(column);
        }
        Ok(columns)
    }

    fn column_comment(
        &mut self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>, EngineError> {
        let rows = self.catalog_rows(&column_comment_sql(schema, table, column))?;
        Ok(rows.first().and_then(|row| row.first()).and_then(opt_text))
    }

    fn table_comment(&mut self, schema: &str, table: &str) -> Result<Option<String>, EngineError> {
        let rows = self.catalog_rows(&table_comment_sql(schema, table))?;
        Ok(rows.first().and_then(|row| row.first()).and_then(opt_text))
    }

    pub(crate) fn catalog_indexes(
        &mut self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<IndexMeta> {
        let outcome = self
            .catalog_rows(&indexes_sql(schema, table))
            .map(|rows| rows.iter().filter_map(|row| map_index(row)).collect());
        self.finish(outcome)
    }

    pub(crate) fn catalog_table_overview(
        &mut self,
        schema: &str,
        table: &str,
    ) -> MetadataResult<TableMeta> {
        let outcome = self.table_overview_inner(schema, table).map(|meta| vec![meta]);
        self.finish(outcome)
    }

    fn table_overview_inner(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<TableMeta, EngineError> {
        let rows = self.catalog_rows(&table_sql(schema, table))?;
        let meta = rows.first().and_then(|row| map_table(row));
        let Some(mut meta) = meta else {
            return Err(EngineError::Introspection(format!(
                "table {schema}.{table} not found"
            )));
        };
        meta.comment = self.table_comment(schema, table)?;
        Ok(meta)
    }

    pub(crate) fn catalog_schema_metadata(
        &mut self,
        schema: &str,
    ) -> MetadataResult<TableDescription> {
        let outcome = self.schema_metadata_inner(schema);
        self.finish(outcome)
    }

    fn schema_metadata_inner(
        &mut self,
        schema: &str,
    ) -> Result<Vec<TableDescription>, EngineError> {
        let tables = self.catalog_rows(&tables_sql(schema)).map(first_column)?;
        let mut descriptions = Vec::with_capacity(tables.len());
        for table in &tables {
            let table_meta = self.table_overview_inner(schema, table)?;
            let columns = self.describe_inner(schema, table)?;
            descriptions.push(TableDescription {
                table: table_meta,
                columns,
            });
        }
        Ok(descriptions)
    }
}

fn first_column(rows: Vec<Vec<CellValue>>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| row.into_iter().next())
        .map(|cell| text(&cell))
        .collect()
}

fn text(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(s) => s.clone(),
        CellValue::Null => String::new(),
        other => other.display(),
    }
}

fn opt_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Null => None,
        other => Some(text(other)),
    }
}

fn opt_int(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Int(i) => Some(*i),
        CellValue::Text(s) => s.parse().ok(),
        _ => None,
    }
}

fn map_column(row: &[CellValue]) -> Option<ColumnMeta> {
    let [name, data_type, length, scale, nullable, default, ordinal] = row else {
        return None;
    };
    Some(ColumnMeta {
        name: text(name),
        data_type: text(data_type),
        length: opt_int(length),
        scale: opt_int(scale),
        nullable: text(nullable) == "Y",
        default: opt_text(default),
        ordinal: opt_int(ordinal).unwrap_or(0) as u32,
        comment: None,
    })
}

fn map_index(row: &[CellValue]) -> Option<IndexMeta> {
    let [column_name, index_name, uniqueness, position, index_type] = row else {
        return None;
    };
    Some(IndexMeta {
        column_name: text(column_name),
        index_name: text(index_name),
        unique: text(uniqueness) == "UNIQUE",
        sequence: opt_int(position).unwrap_or(0) as u32,
        index_type: text(index_type),
    })
}

fn map_table(row: &[CellValue]) -> Option<TableMeta> {
    let [name, schema, object_id, created] = row else {
        return None;
    };
    Some(TableMeta {
        name: text(name),
        schema: text(schema),
        object_id: opt_int(object_id)?,
        created: opt_text(created),
        comment: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::driver::mock::{MockDriver, Script};
    use crate::instance::InstanceConfig;

    fn engine_with(driver: MockDriver) -> DamengEngine {
        let instance = InstanceConfig {
            name: "test_dm_instance".into(),
            host: "testhost".into(),
            port: None,
            user: "testuser".into(),
            password: "testpassword".into(),
            database: None,
        };
        DamengEngine::new(instance, Box::new(driver))
    }

    fn cell(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_list_schemas_maps_first_column() {
        let driver = MockDriver::new(vec![Script::rows(
            &["NAME"],
            vec![vec![cell("SYSDBA")], vec![cell("SCHEMA1")]],
        )]);
        let state = driver.state();
        let mut engine = engine_with(driver);

        let result = engine.catalog_schemas();

        assert!(result.error.is_none());
        assert_eq!(result.data, vec!["SYSDBA", "SCHEMA1"]);
        let executed = state.executed.lock().unwrap();
        assert!(executed[0].contains("TYPE$ = 'SCH'"));
        // introspection releases the connection when the call completes
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_list_tables_interpolates_escaped_schema() {
        let driver = MockDriver::new(vec![Script::rows(&["NAME"], vec![vec![cell("T1")]])]);
        let state = driver.state();
        let mut engine = engine_with(driver);

        let result = engine.catalog_tables("O'HARA");

        assert!(result.error.is_none());
        assert_eq!(result.data, vec!["T1"]);
        let executed = state.executed.lock().unwrap();
        assert!(executed[0].contains("S.NAME = 'O''HARA'"));
    }

    #[test]
    fn test_catalog_failure_yields_error_and_no_data() {
        let driver = MockDriver::new(vec![Script::Fail("DB error fetching tables".into())]);
        let mut engine = engine_with(driver);

        let result = engine.catalog_tables("MYSCHEMA");

        assert!(result.data.is_empty());
        assert!(result
            .error
            .as_deref()
            .is_some_and(|e| e.contains("DB error fetching tables")));
    }

    #[test]
    fn test_connection_failure_yields_error_and_no_data() {
        let mut engine = engine_with(MockDriver::failing("refused"));

        let result = engine.catalog_schemas();

        assert!(result.data.is_empty());
        assert_eq!(
            result.error.as_deref(),
            Some("Dameng connection failed: refused")
        );
    }

    #[test]
    fn test_describe_table_attaches_comments() {
        let driver = MockDriver::new(vec![
            Script::rows(
                &["NAME", "TYPE$", "LENGTH$", "SCALE", "NULLABLE$", "DEFVAL", "COLID"],
                vec![
                    vec![
                        cell("id"),
                        cell("INT"),
                        CellValue::Int(10),
                        CellValue::Int(0),
                        cell("N"),
                        CellValue::Null,
                        CellValue::Int(1),
                    ],
                    vec![
                        cell("name"),
                        cell("VARCHAR"),
                        CellValue::Int(255),
                        CellValue::Null,
                        cell("Y"),
                        cell("'anon'"),
                        CellValue::Int(2),
                    ],
                ],
            ),
            Script::rows(&["COMMENT$"], vec![vec![cell("Primary key")]]),
            Script::rows(&["COMMENT$"], vec![vec![cell("User name")]]),
        ]);
        let state = driver.state();
        let mut engine = engine_with(driver);

        let result = engine.catalog_describe("test_db", "test_table");

        assert!(result.error.is_none());
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.data[0].name, "id");
        assert_eq!(result.data[0].data_type, "INT");
        assert!(!result.data[0].nullable);
        assert_eq!(result.data[0].comment.as_deref(), Some("Primary key"));
        assert_eq!(result.data[1].name, "name");
        assert_eq!(result.data[1].length, Some(255));
        assert!(result.data[1].nullable);
        assert_eq!(result.data[1].default.as_deref(), Some("'anon'"));
        assert_eq!(result.data[1].comment.as_deref(), Some("User name"));

        // one structural query, then one comment query per column
        let executed = state.executed.lock().unwrap();
        assert_eq!(executed.len(), 3);
        assert!(executed[1].contains("SYSCOLUMNCOMMENTS"));
        assert!(executed[1].contains("COLNAME = 'id'"));
        assert!(executed[2].contains("COLNAME = 'name'"));
    }

    #[test]
    fn test_describe_and_list_columns_agree_on_names() {
        let structural = Script::rows(
            &["NAME", "TYPE$", "LENGTH$", "SCALE", "NULLABLE$", "DEFVAL", "COLID"],
            vec![
                vec![
                    cell("id"),
                    cell("INT"),
                    CellValue::Int(10),
                    CellValue::Int(0),
                    cell("N"),
                    CellValue::Null,
                    CellValue::Int(1),
                ],
                vec![
                    cell("name"),
                    cell("VARCHAR"),
                    CellValue::Int(255),
                    CellValue::Null,
                    cell("Y"),
                    CellValue::Null,
                    CellValue::Int(2),
                ],
            ],
        );
        let driver = MockDriver::new(vec![
            structural,
            Script::rows(&["COMMENT$"], vec![]),
            Script::rows(&["COMMENT$"], vec![]),
            Script::rows(&["NAME"], vec![vec![cell("id")], vec![cell("name")]]),
        ]);
        let mut engine = engine_with(driver);

        let described = engine.catalog_describe("test_db", "test_tb");
        let listed = engine.catalog_columns("test_db", "test_tb");

        let described_names: Vec<String> =
            described.data.iter().map(|c| c.name.clone()).collect();
        assert_eq!(described_names, listed.data);
    }

    #[test]
    fn test_table_overview_not_found() {
        let driver = MockDriver::new(vec![Script::rows(
            &["NAME", "NAME", "ID", "CRTDATE"],
            vec![],
        )]);
        let mut engine = engine_with(driver);

        let result = engine.catalog_table_overview("test_db", "missing");

        assert!(result.data.is_empty());
        assert_eq!(
            result.error.as_deref(),
            Some("table test_db.missing not found")
        );
    }

    #[test]
    fn test_table_overview_attaches_comment() {
        let driver = MockDriver::new(vec![
            Script::rows(
                &["NAME", "NAME", "ID", "CRTDATE"],
                vec![vec![
                    cell("users"),
                    cell("test_db"),
                    CellValue::Int(101),
                    cell("2023-01-01"),
                ]],
            ),
            Script::rows(&["COMMENT$"], vec![vec![cell("Test table comment")]]),
        ]);
        let state = driver.state();
        let mut engine = engine_with(driver);

        let result = engine.catalog_table_overview("test_db", "users");

        assert!(result.error.is_none());
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].name, "users");
        assert_eq!(result.data[0].object_id, 101);
        assert_eq!(
            result.data[0].comment.as_deref(),
            Some("Test table comment")
        );
        let executed = state.executed.lock().unwrap();
        assert!(executed[1].contains("SYSTABLECOMMENTS"));
    }

    #[test]
    fn test_list_indexes_maps_rows() {
        let driver = MockDriver::new(vec![Script::rows(
            &["COLUMN_NAME", "INDEX_NAME", "UNIQUENESS", "COLUMN_POSITION", "INDEX_TYPE"],
            vec![
                vec![
                    cell("id"),
                    cell("pk_users"),
                    cell("UNIQUE"),
                    CellValue::Int(1),
                    cell("NORMAL"),
                ],
                vec![
                    cell("email"),
                    cell("idx_email"),
                    cell("NONUNIQUE"),
                    CellValue::Int(1),
                    cell("NORMAL"),
                ],
            ],
        )]);
        let mut engine = engine_with(driver);

        let result = engine.catalog_indexes("test_db", "users");

        assert!(result.error.is_none());
        assert_eq!(result.data.len(), 2);
        assert!(result.data[0].unique);
        assert_eq!(result.data[0].index_name, "pk_users");
        assert!(!result.data[1].unique);
        assert_eq!(result.data[1].sequence, 1);
    }

    #[test]
    fn test_schema_metadata_composes_tables_and_columns() {
        let driver = MockDriver::new(vec![
            // tables in schema
            Script::rows(&["NAME"], vec![vec![cell("t1")]]),
            // t1 overview + comment
            Script::rows(
                &["NAME", "NAME", "ID", "CRTDATE"],
                vec![vec![
                    cell("t1"),
                    cell("test_db"),
                    CellValue::Int(101),
                    CellValue::Null,
                ]],
            ),
            Script::rows(&["COMMENT$"], vec![vec![cell("Table 1 comment")]]),
            // t1 columns + comment
            Script::rows(
                &["NAME", "TYPE$", "LENGTH$", "SCALE", "NULLABLE$", "DEFVAL", "COLID"],
                vec![vec![
                    cell("id"),
                    cell("INT"),
                    CellValue::Int(10),
                    CellValue::Int(0),
                    cell("N"),
                    CellValue::Null,
                    CellValue::Int(1),
                ]],
            ),
            Script::rows(&["COMMENT$"], vec![vec![cell("ID column")]]),
        ]);
        let state = driver.state();
        let mut engine = engine_with(driver);

        let result = engine.catalog_schema_metadata("test_db");

        assert!(result.error.is_none());
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].table.name, "t1");
        assert_eq!(
            result.data[0].table.comment.as_deref(),
            Some("Table 1 comment")
        );
        assert_eq!(result.data[0].columns.len(), 1);
        assert_eq!(result.data[0].columns[0].comment.as_deref(), Some("ID column"));
        // the whole dictionary was assembled over one connection
        assert_eq!(state.connects.load(Ordering::SeqCst), 1);
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_schema_metadata_never_partial_on_error() {
        let driver = MockDriver::new(vec![
            Script::rows(&["NAME"], vec![vec![cell("t1")], vec![cell("t2")]]),
            Script::Fail("DB error fetching table info".into()),
        ]);
        let mut engine = engine_with(driver);

        let result = engine.catalog_schema_metadata("test_db");

        assert!(result.data.is_empty());
        assert!(result
            .error
            .as_deref()
            .is_some_and(|e| e.contains("DB error fetching table info")));
    }
}
