//! Backend driver seam.
//!
//! The adapter core never speaks a wire protocol itself: it drives a
//! backend through these traits, the way the original platform reaches each
//! vendor through its native client module. A production binding (ODBC or a
//! vendor client) implements them; tests substitute a scripted driver.

use thiserror::Error;

use crate::value::CellValue;

/// Connection parameters handed to a driver's connect primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// Error raised by a backend driver, wrapping the native message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct DriverError(pub String);

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The backend connect primitive.
pub trait Driver: Send {
    /// Open a new session against the backend.
    fn connect(&self, params: &ConnectParams) -> Result<Box<dyn Session>, DriverError>;
}

/// One live backend session.
///
/// Stateful: at most one operation may be in flight at a time, since the
/// underlying handle carries cursor and transaction state.
pub trait Session: Send {
    /// Open a statement cursor on this session.
    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>, DriverError>;

    /// Close the underlying handle.
    fn close(&mut self) -> Result<(), DriverError>;
}

impl std::fmt::Debug for dyn Session + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn Session").finish_non_exhaustive()
    }
}

/// A cursor scoped to a single statement execution. Dropping the cursor
/// releases it, on every exit path.
pub trait Cursor {
    /// Execute a statement, with bound parameters when the backend supports
    /// binding and `parameters` is non-empty.
    fn execute(&mut self, sql: &str, parameters: &[CellValue]) -> Result<(), DriverError>;

    /// Ordered column names of the active result, if the statement produced
    /// a column description.
    fn description(&self) -> Option<Vec<String>>;

    /// Fetch every row of the active result.
    fn fetch_all(&mut self) -> Result<Vec<Vec<CellValue>>, DriverError>;

    /// The backend's row-count signal; negative when the backend does not
    /// report one for this statement.
    fn row_count(&self) -> i64;
}
