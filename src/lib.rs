//! Uniform engine adapters for a SQL review/execution platform: one
//! contract, one result shape, and one error taxonomy over heterogeneous
//! relational backends.

pub mod check;
pub mod dameng;
pub mod driver;
pub mod engine;
pub mod error;
pub mod instance;
pub mod meta;
pub mod result;
pub mod statement;
pub mod value;

pub use check::QueryCheck;
pub use engine::{build_engine, Dialect, DialectKind, Engine, Precheck, QueryOptions};
pub use error::EngineError;
pub use instance::InstanceConfig;
pub use meta::{ColumnMeta, IndexMeta, TableDescription, TableMeta};
pub use result::{MetadataResult, ResultSet, ReviewRecord, ReviewSet, Severity};
pub use value::CellValue;
