//! Database error types.

use std::io::ErrorKind;
use thiserror::Error;

/// SQLSTATE MySQL reports for `ER_CON_COUNT_ERROR`.
const SQLSTATE_TOO_MANY_CONNECTIONS: &str = "08004";

#[derive(Debug, Error)]
pub enum DbError {
    /// A pool could not be built from the given configuration.
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// Connection-level failure, already phrased for operators.
    #[error("{0}")]
    Connection(String),

    #[error(transparent)]
    Driver(sqlx::Error),
}

impl DbError {
    /// Translate a driver error, replacing well-known connection failures
    /// with a short operator-facing message. Used on the query path only;
    /// liveness checks keep the driver's own text.
    pub fn from_driver(err: sqlx::Error) -> Self {
        match connection_message(&err) {
            Some(message) => DbError::Connection(message.to_string()),
            None => DbError::Driver(err),
        }
    }
}

fn connection_message(err: &sqlx::Error) -> Option<&'static str> {
    match err {
        sqlx::Error::Io(io) => match io.kind() {
            ErrorKind::ConnectionRefused => Some("Database connection was refused."),
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => Some("Database connection was closed."),
            _ => None,
        },
        // The lazy pool keeps retrying a refused connect until the acquire
        // deadline, so this is usually an unreachable server.
        sqlx::Error::PoolTimedOut => Some("Timed out waiting for a database connection."),
        sqlx::Error::PoolClosed => Some("Database connection was closed."),
        sqlx::Error::Database(db) => match db.code() {
            Some(code) if code == SQLSTATE_TOO_MANY_CONNECTIONS => {
                Some("Database has too many connections.")
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_refused_connection_message() {
        let err = DbError::from_driver(sqlx::Error::Io(io::Error::from(ErrorKind::ConnectionRefused)));
        assert_eq!(err.to_string(), "Database connection was refused.");
    }

    #[test]
    fn test_lost_connection_message() {
        let err = DbError::from_driver(sqlx::Error::Io(io::Error::from(ErrorKind::ConnectionReset)));
        assert_eq!(err.to_string(), "Database connection was closed.");

        let err = DbError::from_driver(sqlx::Error::PoolClosed);
        assert_eq!(err.to_string(), "Database connection was closed.");
    }

    #[test]
    fn test_acquire_timeout_is_not_reported_as_exhaustion() {
        let err = DbError::from_driver(sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), "Timed out waiting for a database connection.");
    }

    #[test]
    fn test_driver_variant_keeps_raw_text() {
        let err = DbError::Driver(sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), sqlx::Error::PoolTimedOut.to_string());
    }

    #[test]
    fn test_other_errors_keep_driver_text() {
        let err = DbError::from_driver(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Driver(_)));
        assert_eq!(err.to_string(), sqlx::Error::RowNotFound.to_string());
    }
}
