use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by the store and its request boundary.
///
/// Numeric routines in [`crate::analytics`] and [`crate::measurement`] never
/// produce these; they degrade to neutral values instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("stale write for station {station_id} on {date}: expected version {expected}, found {found}")]
    Conflict {
        station_id: i32,
        date: NaiveDate,
        expected: i64,
        found: i64,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn station_not_found(station_id: i32) -> Self {
        Error::NotFound {
            what: "station",
            key: station_id.to_string(),
        }
    }

    pub fn entry_not_found(station_id: i32, date: NaiveDate) -> Self {
        Error::NotFound {
            what: "daily entry",
            key: format!("station {station_id} on {date}"),
        }
    }

    /// Client side errors that retrying the same request cannot fix.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound { .. } | Error::Conflict { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::station_not_found(7);
        assert_eq!(err.to_string(), "station not found: 7");

        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let err = Error::entry_not_found(3, date);
        assert_eq!(err.to_string(), "daily entry not found: station 3 on 2025-01-02");

        let err = Error::Conflict {
            station_id: 1,
            date,
            expected: 2,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "stale write for station 1 on 2025-01-02: expected version 2, found 3"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(Error::Validation("x".into()).is_client_error());
        assert!(Error::station_not_found(1).is_client_error());
        assert!(!Error::Migration("boom".into()).is_client_error());
        assert!(!Error::Database(diesel::result::Error::NotFound).is_client_error());
    }
}
