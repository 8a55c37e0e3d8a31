//! Typed error taxonomy for the MySQL client core.
//!
//! Mirrors the taxonomy in spec §7: protocol violations (`Interface`),
//! transport failures (`Operational`), API misuse (`Programming`), invariant
//! violations (`Internal`), unsupported features (`NotSupported`), and
//! server-reported SQL errors (`Database`, refined into `Data`/`Integrity`
//! by MySQL error code).

use std::io;

use thiserror::Error;

pub type CResult<T> = Result<T, MySqlError>;

#[derive(Debug, Error)]
pub enum MySqlError {
    /// Protocol-level violation: unexpected packet tag, truncated response,
    /// unsupported server version, malformed column count, unreadable LOCAL
    /// INFILE file.
    #[error("interface error: {0}")]
    Interface(String),

    /// Framer unavailable, connection lost, or underlying socket error.
    #[error("operational error: {0}")]
    Operational(String),

    /// API misuse: nested transaction, bad cursor class, invalid flag
    /// argument.
    #[error("programming error: {0}")]
    Programming(String),

    /// Invariant violation: a command was attempted while an unread result
    /// was outstanding.
    #[error("internal error: {0}")]
    Internal(String),

    /// Feature deliberately not supported: old-password auth, DSN
    /// configuration, `PROCESS_INFO` command.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Server reported a generic SQL error via an ERR packet.
    #[error("database error {code} ({state}): {message}")]
    Database {
        code: u16,
        state: String,
        message: String,
    },

    /// `Database` refined: truncation, conversion, out-of-range value.
    #[error("data error {code} ({state}): {message}")]
    Data {
        code: u16,
        state: String,
        message: String,
    },

    /// `Database` refined: constraint violation (unique/foreign key/NOT
    /// NULL).
    #[error("integrity error {code} ({state}): {message}")]
    Integrity {
        code: u16,
        state: String,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MySqlError {
    pub fn interface<S: Into<String>>(msg: S) -> Self {
        MySqlError::Interface(msg.into())
    }

    pub fn operational<S: Into<String>>(msg: S) -> Self {
        MySqlError::Operational(msg.into())
    }

    pub fn programming<S: Into<String>>(msg: S) -> Self {
        MySqlError::Programming(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        MySqlError::Internal(msg.into())
    }

    pub fn not_supported<S: Into<String>>(msg: S) -> Self {
        MySqlError::NotSupported(msg.into())
    }

    /// Builds the appropriate `Database`/`Data`/`Integrity` variant from a
    /// decoded ERR packet, classifying by MySQL error code. Not an
    /// exhaustive mapping of every server error code — just the common
    /// integrity and data-conversion ranges `mysql-connector-python`'s
    /// `errors.py` singles out.
    pub fn from_server_error(code: u16, state: String, message: String) -> Self {
        const INTEGRITY_CODES: &[u16] = &[
            1022, 1048, 1052, 1062, 1169, 1216, 1217, 1364, 1451, 1452, 1557,
        ];
        const DATA_CODES: &[u16] = &[1264, 1265, 1292, 1366, 1406, 1411, 1441];

        if INTEGRITY_CODES.contains(&code) {
            MySqlError::Integrity {
                code,
                state,
                message,
            }
        } else if DATA_CODES.contains(&code) {
            MySqlError::Data {
                code,
                state,
                message,
            }
        } else {
            MySqlError::Database {
                code,
                state,
                message,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classifies_duplicate_entry_as_integrity() {
        let err = MySqlError::from_server_error(1062, "23000".into(), "Duplicate entry".into());
        assert!(matches!(err, MySqlError::Integrity { code: 1062, .. }));
    }

    #[test]
    fn classifies_data_truncated_as_data_error() {
        let err = MySqlError::from_server_error(1265, "01000".into(), "Data truncated".into());
        assert!(matches!(err, MySqlError::Data { code: 1265, .. }));
    }

    #[test]
    fn classifies_unknown_code_as_database_error() {
        let err = MySqlError::from_server_error(1146, "42S02".into(), "no such table".into());
        assert!(matches!(err, MySqlError::Database { code: 1146, .. }));
    }
}
