//! Error types for the sync library.

use std::path::PathBuf;
use thiserror::Error;

/// Error text fragments that mark a lost database session.
///
/// Oracle client codes for end-of-file on the communication channel, a
/// disconnected session and a connection lost contact, the ODPI "not
/// connected" error, plus the ODBC communication-link SQLSTATEs.
const CONNECTION_LOST_SIGNATURES: &[&str] =
    &["ORA-03113", "ORA-03114", "ORA-03135", "DPI-1010", "08S01", "08003"];

/// Main error type for sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error (invalid YAML, missing fields, duplicate templates, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database driver error. The message is kept verbatim so it can be classified.
    #[error("Database error: {0}")]
    Database(String),

    /// A second command was issued while one was still in flight.
    #[error("parallel exec not allowed: connection is busy")]
    Busy,

    /// `exec` was called before any connection parameters were supplied.
    #[error("connection was never opened: call open() first")]
    NotOpened,

    /// Catalog enumeration failed.
    #[error("Catalog query failed ({context}): {message}")]
    Catalog { context: String, message: String },

    /// Path template kept placeholders after substitution.
    #[error("bad filename \"{path}\", no value for placeholder(s) {}", .placeholders.join(", "))]
    UnresolvedPlaceholders {
        path: String,
        placeholders: Vec<String>,
    },

    /// No output path is configured for a kind.
    #[error("no output path configured for {0}")]
    MissingTemplate(String),

    /// Existing script could not be read.
    #[error("on read \"{}\": {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Script could not be written.
    #[error("on write \"{}\": {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Log files could not be created.
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a Database error from any displayable driver error.
    pub fn database(message: impl std::fmt::Display) -> Self {
        SyncError::Database(message.to_string())
    }

    /// Create a Catalog error with the name of the failed query.
    pub fn catalog(context: impl Into<String>, err: SyncError) -> Self {
        SyncError::Catalog {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// True when the error text matches a transient-disconnection signature.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            SyncError::Database(msg) => is_connection_lost_message(msg),
            _ => false,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(_) | SyncError::Yaml(_) | SyncError::MissingTemplate(_) => 2,
            SyncError::Database(_)
            | SyncError::Busy
            | SyncError::NotOpened
            | SyncError::Catalog { .. } => 3,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Classify raw driver error text.
pub fn is_connection_lost_message(message: &str) -> bool {
    if message.is_empty() {
        return false;
    }
    let upper = message.to_uppercase();
    CONNECTION_LOST_SIGNATURES
        .iter()
        .any(|sig| upper.contains(sig))
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
