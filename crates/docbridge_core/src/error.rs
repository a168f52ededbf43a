//! Error types shared by the bridge, the dispatcher and engines.

use thiserror::Error;

/// Result type for engine and bridge operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by an engine or captured by the completion bridge.
///
/// Engine failures are passed through the bridge unchanged, which is why the
/// type is `Clone + PartialEq`: callers compare the delivered failure with
/// the one the engine raised.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A document with the same `_id` already exists in the collection.
    #[error("duplicate key in {namespace}: _id {key}")]
    DuplicateKey {
        /// Full namespace (`db.collection`).
        namespace: String,
        /// Rendered value of the conflicting key.
        key: String,
    },

    /// The requested write concern could not be satisfied.
    #[error("write concern error ({code}): {message}")]
    WriteConcern {
        /// Numeric error code.
        code: i32,
        /// Description of the failure.
        message: String,
    },

    /// The query or filter document could not be interpreted.
    #[error("malformed query: {message}")]
    MalformedQuery {
        /// Description of the problem.
        message: String,
    },

    /// A command was rejected by the engine.
    #[error("command failed ({code}): {message}")]
    CommandFailed {
        /// Numeric error code.
        code: i32,
        /// Description of the failure.
        message: String,
    },

    /// A get-more referenced a cursor the engine does not know about.
    #[error("cursor {cursor_id} not found")]
    CursorNotFound {
        /// The unknown cursor id.
        cursor_id: u64,
    },

    /// A field name was rejected by a field name validator.
    #[error("invalid field name: {name:?}")]
    InvalidFieldName {
        /// The rejected name.
        name: String,
    },

    /// A namespace string could not be parsed.
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),

    /// A referenced namespace does not exist.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// A result document could not be decoded into the requested type.
    #[error("decoding failed: {message}")]
    Decoding {
        /// Description of the decoding error.
        message: String,
    },

    /// The engine panicked while servicing a call.
    #[error("engine panicked: {message}")]
    EnginePanicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl CoreError {
    /// Creates a malformed query error.
    pub fn malformed_query(message: impl Into<String>) -> Self {
        Self::MalformedQuery {
            message: message.into(),
        }
    }

    /// Creates a command failure.
    pub fn command_failed(code: i32, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            code,
            message: message.into(),
        }
    }

    /// Creates a decoding error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Creates a write concern error.
    pub fn write_concern(code: i32, message: impl Into<String>) -> Self {
        Self::WriteConcern {
            code,
            message: message.into(),
        }
    }
}
