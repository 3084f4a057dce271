//! Error types surfaced by query execution.

use thiserror::Error;

use crate::codec::CursorError;

/// A database command failed.
///
/// Covers everything that goes wrong on the database side of the round
/// trip: network failures, authentication, malformed filters, projections
/// or sort documents. The query layer never interprets or retries these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("command failed{}: {message}", code_suffix(.code, .code_name))]
#[non_exhaustive]
pub struct CommandError {
    /// Numeric server error code, when the server supplied one.
    pub code: Option<i32>,
    /// Symbolic server error name (e.g. `BadValue`).
    pub code_name: Option<String>,
    /// Human readable message.
    pub message: String,
}

fn code_suffix(code: &Option<i32>, code_name: &Option<String>) -> String {
    match (code, code_name) {
        (Some(code), Some(name)) => format!(" (code {code}, {name})"),
        (Some(code), None) => format!(" (code {code})"),
        (None, Some(name)) => format!(" ({name})"),
        (None, None) => String::new(),
    }
}

impl CommandError {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            code_name: None,
            message: message.into(),
        }
    }

    /// Attach a numeric server error code.
    #[must_use]
    pub const fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a symbolic server error name.
    #[must_use]
    pub fn with_code_name(mut self, code_name: impl Into<String>) -> Self {
        self.code_name = Some(code_name.into());
        self
    }
}

/// Errors returned by [`MinQuery::all`](crate::MinQuery::all).
///
/// On any error the caller's result vector is unreliable: it may be
/// untouched, cleared or partially filled depending on where execution
/// stopped. No rollback is performed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryError {
    /// The cursor passed to [`MinQuery::cursor`](crate::MinQuery::cursor)
    /// could not be decoded. Nothing was sent to the database.
    #[error("invalid cursor: {0}")]
    CursorDecoding(#[source] CursorError),

    /// The codec failed to produce a cursor for the last document.
    /// The page was already decoded into the result vector.
    #[error("failed to create cursor: {0}")]
    CursorEncoding(#[source] CursorError),

    /// The database round trip failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A returned document did not fit the caller's result type.
    #[error("failed to decode result document: {0}")]
    ResultDecoding(#[from] bson::de::Error),
}

impl QueryError {
    /// Returns `true` for cursor decoding and encoding failures.
    #[inline]
    #[must_use]
    pub const fn is_cursor_error(&self) -> bool {
        matches!(self, Self::CursorDecoding(_) | Self::CursorEncoding(_))
    }

    /// Returns `true` if the database command failed.
    #[inline]
    #[must_use]
    pub const fn is_command_error(&self) -> bool {
        matches!(self, Self::Command(_))
    }

    /// Returns `true` if a result document failed to decode.
    #[inline]
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::ResultDecoding(_))
    }
}
