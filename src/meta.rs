use serde::{Deserialize, Serialize};

/// Column metadata assembled from catalog queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub data_type: String,
    pub length: Option<i64>,
    pub scale: Option<i64>,
    pub nullable: bool,
    pub default: Option<String>,
    pub ordinal: u32,
    pub comment: Option<String>,
}

/// One index/column pairing, ordered by position within the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub column_name: String,
    pub index_name: String,
    pub unique: bool,
    pub sequence: u32,
    pub index_type: String,
}

/// Table-level metadata, including its documentation comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMeta {
    pub name: String,
    pub schema: String,
    pub object_id: i64,
    pub created: Option<String>,
    pub comment: Option<String>,
}

/// A table together with its described columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescription {
    pub table: TableMeta,
    pub columns: Vec<ColumnMeta>,
}
