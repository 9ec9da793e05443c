//! Error types for the database layer

use mongodb::error::{Error as DriverError, ErrorKind};
use thiserror::Error;

/// Failure of a store operation.
///
/// Every variant is returned to the caller; nothing in this crate terminates the
/// process on a failed database call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("Database connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Database write failure: {0}")]
    WriteFailure(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database query failure: {0}")]
    QueryFailure(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl DatabaseError {
    /// Classify a driver error raised while reading.
    pub fn from_read(context: &str, error: DriverError) -> Self {
        match classify(&error) {
            Class::Connection => Self::ConnectionFailure(format!("{context}: {error}")),
            Class::Write => Self::WriteFailure(format!("{context}: {error}")),
            Class::Other => Self::QueryFailure(format!("{context}: {error}")),
        }
    }

    /// Classify a driver error raised while inserting.
    pub fn from_write(context: &str, error: DriverError) -> Self {
        match classify(&error) {
            Class::Connection => Self::ConnectionFailure(format!("{context}: {error}")),
            Class::Write | Class::Other => Self::WriteFailure(format!("{context}: {error}")),
        }
    }

    /// Wrap a driver error raised while establishing a connection. Every kind
    /// counts as the database being unavailable.
    pub fn from_connect(context: &str, error: DriverError) -> Self {
        Self::ConnectionFailure(format!("{context}: {error}"))
    }

    /// Re-tag an already classified error as a connection failure.
    pub fn into_connection_failure(self) -> Self {
        match self {
            Self::ConnectionFailure(message)
            | Self::WriteFailure(message)
            | Self::NotFound(message)
            | Self::QueryFailure(message)
            | Self::InvalidIdentifier(message) => Self::ConnectionFailure(message),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True when the database could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ConnectionFailure(_))
    }
}

enum Class {
    Connection,
    Write,
    Other,
}

fn classify(error: &DriverError) -> Class {
    match error.kind.as_ref() {
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::Authentication { .. } => Class::Connection,
        ErrorKind::Write(_) | ErrorKind::InsertMany(_) => Class::Write,
        _ => Class::Other,
    }
}
