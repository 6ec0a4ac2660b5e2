//! Error types for strata operations.
//!
//! Errors carry a structured [`ErrorCode`] for programmatic handling. History
//! failures wrap the underlying error with the stage that failed, so callers
//! can tell a failed base mutation from a failed shadow-table write.

use strum::Display;
use thiserror::Error;

/// Result type alias for strata operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Stage of the history bookkeeping that follows a base mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum HistoryStage {
    /// Appending a new open row to the shadow table.
    #[strum(serialize = "historical insert")]
    Insert,
    /// Stamping `deleted_at` on the currently open shadow row.
    #[strum(serialize = "historical delete")]
    Delete,
    /// Deriving the shadow table description during a migration.
    #[strum(serialize = "historical table")]
    Table,
}

/// Main error type for all strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    /// Schema translation rejected the operation.
    #[error("Schema error: {message}")]
    Schema { message: String, code: ErrorCode },

    /// A history statement failed after the base operation succeeded.
    #[error("{stage}: {source}")]
    History {
        stage: HistoryStage,
        #[source]
        source: Box<StrataError>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The active dialect does not provide a required capability.
    #[error("Capability absent: dialect '{dialect}' does not support {capability}")]
    CapabilityAbsent {
        capability: &'static str,
        dialect: String,
    },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation { message: String, code: ErrorCode },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation is not supported by a collaborator.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Schema (SCH_xxx)
    SchHistoricalTarget,
    SchDuplicateColumn,
    SchInvalidTable,

    // History (HIST_xxx)
    HistInsertFailed,
    HistDeleteFailed,
    HistTableFailed,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,

    // Capability (CAP_xxx)
    CapTimeTravelMissing,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,

    // Parse (PARSE_xxx)
    ParseInvalidTimestamp,

    // Configuration (CFG_xxx)
    CfgInvalid,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SchHistoricalTarget => "SCH_001",
            ErrorCode::SchDuplicateColumn => "SCH_002",
            ErrorCode::SchInvalidTable => "SCH_003",
            ErrorCode::HistInsertFailed => "HIST_001",
            ErrorCode::HistDeleteFailed => "HIST_002",
            ErrorCode::HistTableFailed => "HIST_003",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::CapTimeTravelMissing => "CAP_001",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ParseInvalidTimestamp => "PARSE_001",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl StrataError {
    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            code: ErrorCode::SchInvalidTable,
        }
    }

    /// Create the error returned when a migration targets a shadow table directly.
    pub fn historical_target() -> Self {
        Self::Schema {
            message: "operation already applies to historical tables".to_string(),
            code: ErrorCode::SchHistoricalTarget,
        }
    }

    /// Create a duplicate column error.
    pub fn duplicate_column(table: &str, column: &str) -> Self {
        Self::Schema {
            message: format!("column '{}' already exists on table '{}'", column, table),
            code: ErrorCode::SchDuplicateColumn,
        }
    }

    /// Wrap an error with the history stage that produced it.
    pub fn history(stage: HistoryStage, source: StrataError) -> Self {
        Self::History {
            stage,
            source: Box::new(source),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create a database error that keeps the driver error as its source.
    pub fn database_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create the error returned when a database cannot be opened.
    pub fn connection_failed(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbConnectionFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create the error returned when a dialect lacks time-travel support.
    pub fn time_travel_absent(dialect: impl Into<String>) -> Self {
        Self::CapabilityAbsent {
            capability: "time travel",
            dialect: dialect.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
        }
    }

    /// Create an error for a column missing from a row or entity.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::Validation {
            message: format!("missing field '{}'", field.into()),
            code: ErrorCode::ValMissingField,
        }
    }

    /// Create a timestamp parse error.
    pub fn parse_timestamp(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidTimestamp,
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Schema { code, .. } => *code,
            Self::History { stage, .. } => match stage {
                HistoryStage::Insert => ErrorCode::HistInsertFailed,
                HistoryStage::Delete => ErrorCode::HistDeleteFailed,
                HistoryStage::Table => ErrorCode::HistTableFailed,
            },
            Self::Database { code, .. } => *code,
            Self::CapabilityAbsent { .. } => ErrorCode::CapTimeTravelMissing,
            Self::Validation { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            _ => ErrorCode::Internal,
        }
    }

    /// The history stage this error was raised in, if any.
    pub fn history_stage(&self) -> Option<HistoryStage> {
        match self {
            Self::History { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Schema {
                code: ErrorCode::SchHistoricalTarget,
                ..
            } => Some("Run the migration against the base table; the shadow table follows it"),
            Self::History { .. } => Some(
                "The base mutation was persisted; wrap the call in a transaction to keep history consistent",
            ),
            Self::CapabilityAbsent { .. } => {
                Some("Configure the connection with the \"history\" mode")
            }
            Self::Configuration(_) => Some("Please check your connection details"),
            _ => None,
        }
    }
}
