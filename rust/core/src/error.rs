// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for reading and decoding mesh files.

use crate::classifier::MAX_LINE_LEN;

/// Result type alias for mesh format operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a FrontSTR mesh file.
///
/// All of these are fatal: the file is treated as one coherent mesh and a
/// partially converted mesh is never useful.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A data record was found before any `!` section header.
    #[error("line {line}: data line before any section header")]
    DataBeforeHeader { line: usize },

    /// A line exceeds the fixed maximum length.
    #[error("line {line}: line longer than {max} characters", max = MAX_LINE_LEN)]
    LineTooLong { line: usize },

    /// A line is not valid UTF-8.
    #[error("line {line}: invalid UTF-8")]
    InvalidUtf8 { line: usize },

    /// An `!ELEMENT` header carries no `341`/`342` type token.
    #[error("element header has no 341/342 type token: {header:?}")]
    MissingElementType { header: String },

    /// A data record could not be decoded.
    #[error("{kind} record: {message}")]
    Parse { kind: &'static str, message: String },

    /// Wraps another error with the 1-based input line it came from.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a record parse error
    pub fn parse(kind: &'static str, message: impl Into<String>) -> Self {
        Error::Parse {
            kind,
            message: message.into(),
        }
    }

    /// Attach an input line number, keeping errors that already carry one.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::DataBeforeHeader { .. }
            | Error::LineTooLong { .. }
            | Error::InvalidUtf8 { .. }
            | Error::AtLine { .. }
            | Error::Io(_) => self,
            other => Error::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }
}
