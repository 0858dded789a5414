use thiserror::Error;

/// Error taxonomy shared by every engine adapter.
///
/// Backend-native errors are caught at the connection, execution, and
/// introspection boundaries and translated into one of these variants with
/// the original message preserved; raw driver error types never reach the
/// host platform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Backend unreachable or credentials rejected. Fatal for the current
    /// call, recoverable on the next acquire.
    #[error("{0}")]
    Connection(String),

    /// One statement failed during execution. Isolated per statement in
    /// batch mode, fatal for single-query mode.
    #[error("{0}")]
    Statement(String),

    /// A catalog query failed. Surfaces with empty metadata, never partial.
    #[error("{0}")]
    Introspection(String),

    /// A capability this dialect does not provide.
    #[error("{dialect} does not support {operation}")]
    Unsupported {
        dialect: &'static str,
        operation: &'static str,
    },
}

impl EngineError {
    /// True for errors raised before any statement could be attempted.
    pub fn is_connection(&self) -> bool {
        matches!(self, EngineError::Connection(_))
    }
}
