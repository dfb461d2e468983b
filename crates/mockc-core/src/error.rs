//! Error types and error code constants for mockc.
//!
//! This module provides a unified error type (`MockcError`) covering every
//! failure the generator can report, from directive parsing through merging,
//! synthesis, and writing an output unit.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flags, malformed index, bad directive values)
//! - `3`: Resolution errors (unknown reference, non-interface, embedding cycle)
//! - `4`: Generation errors (duplicate or non-exported methods, field clashes)
//! - `5`: Stale output (generated file differs from what would be written)
//! - `10`: Internal errors (I/O, unexpected state)
//!
//! ## Attribution
//!
//! Every generation error names the mock that triggered it, and the method
//! where one is involved. `mock()` and `method()` expose that attribution for
//! the JSON error output.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad flags, malformed index or directive).
    InvalidArguments = 2,
    /// Resolution errors (reference not found, not an interface, cycle).
    ResolutionError = 3,
    /// Generation errors (method set cannot be mocked as requested).
    GenerationError = 4,
    /// Generated output on disk is out of date.
    StaleOutput = 5,
    /// Internal errors (I/O, bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the generator.
#[derive(Debug, Error)]
pub enum MockcError {
    /// An interface reference could not be resolved.
    #[error("invalid reference:\n\tmock {mock:?}: {reference}")]
    InvalidReference { mock: String, reference: String },

    /// A reference resolved to a declaration that is not an interface.
    #[error("non-interface:\n\tmock {mock:?}: {reference} is a {kind}")]
    NonInterfaceType {
        mock: String,
        reference: String,
        kind: String,
    },

    /// Two merged interfaces declare the same method with different signatures.
    #[error("duplicated method:\n\tmock {mock:?}: method {method:?}")]
    DuplicateMethod { mock: String, method: String },

    /// An external interface exposes a method or type the mock cannot name.
    #[error("cannot implement non-exported method:\n\tmock {mock:?}: method {method:?}: {offending}")]
    NonExportedMethod {
        mock: String,
        method: String,
        offending: String,
    },

    /// A marker call named a directive outside the known set.
    #[error("unknown mockc function call:\n\tmock {mock:?}: mockc.{directive}")]
    UnknownDirective { mock: String, directive: String },

    /// A directive or flag carried an unusable value.
    #[error("invalid {setting}:\n\tmock {mock:?}: {reason}")]
    InvalidConfigValue {
        mock: String,
        setting: String,
        reason: String,
    },

    /// Constructor called with the wrong number of arguments, or with an
    /// argument that does not implement every method.
    #[error("cannot construct mock:\n\tmock {mock:?}: {reason}")]
    ConstructionArityError { mock: String, reason: String },

    /// Interface embedding loops back on itself.
    #[error("interface embedding cycle:\n\tmock {mock:?}: {}", .cycle.join(" -> "))]
    MergeCycle { mock: String, cycle: Vec<String> },

    /// The field-name formatter maps a method onto a name already in use.
    #[error("field name collision:\n\tmock {mock:?}: method {method:?} maps to field {field:?} already used by {other:?}")]
    FieldNameCollision {
        mock: String,
        method: String,
        field: String,
        other: String,
    },

    /// A generated file on disk differs from the freshly rendered unit.
    #[error("stale generated file: {}", .path.display())]
    StaleOutput { path: PathBuf },

    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// I/O failure while reading an index or writing a unit.
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

/// Result alias used across the engine.
pub type MockcResult<T> = Result<T, MockcError>;

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&MockcError> for OutputErrorCode {
    fn from(err: &MockcError) -> Self {
        match err {
            MockcError::InvalidReference { .. } => OutputErrorCode::ResolutionError,
            MockcError::NonInterfaceType { .. } => OutputErrorCode::ResolutionError,
            MockcError::MergeCycle { .. } => OutputErrorCode::ResolutionError,
            MockcError::DuplicateMethod { .. } => OutputErrorCode::GenerationError,
            MockcError::NonExportedMethod { .. } => OutputErrorCode::GenerationError,
            MockcError::FieldNameCollision { .. } => OutputErrorCode::GenerationError,
            MockcError::ConstructionArityError { .. } => OutputErrorCode::GenerationError,
            MockcError::UnknownDirective { .. } => OutputErrorCode::InvalidArguments,
            MockcError::InvalidConfigValue { .. } => OutputErrorCode::InvalidArguments,
            MockcError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            MockcError::StaleOutput { .. } => OutputErrorCode::StaleOutput,
            MockcError::Io { .. } => OutputErrorCode::InternalError,
            MockcError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<MockcError> for OutputErrorCode {
    fn from(err: MockcError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridge: serde_json::Error -> MockcError
// ============================================================================

impl From<serde_json::Error> for MockcError {
    fn from(err: serde_json::Error) -> Self {
        MockcError::InvalidArguments {
            message: format!("malformed index: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors and Accessors
// ============================================================================

impl MockcError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        MockcError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an invalid configuration value error.
    pub fn invalid_config(
        mock: impl Into<String>,
        setting: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MockcError::InvalidConfigValue {
            mock: mock.into(),
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MockcError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        MockcError::InternalError {
            message: message.into(),
        }
    }

    /// The mock this error is attributed to, if any.
    pub fn mock(&self) -> Option<&str> {
        match self {
            MockcError::InvalidReference { mock, .. }
            | MockcError::NonInterfaceType { mock, .. }
            | MockcError::DuplicateMethod { mock, .. }
            | MockcError::NonExportedMethod { mock, .. }
            | MockcError::UnknownDirective { mock, .. }
            | MockcError::InvalidConfigValue { mock, .. }
            | MockcError::ConstructionArityError { mock, .. }
            | MockcError::MergeCycle { mock, .. }
            | MockcError::FieldNameCollision { mock, .. } => Some(mock),
            MockcError::StaleOutput { .. }
            | MockcError::InvalidArguments { .. }
            | MockcError::Io { .. }
            | MockcError::InternalError { .. } => None,
        }
    }

    /// The method this error is attributed to, if any.
    pub fn method(&self) -> Option<&str> {
        match self {
            MockcError::DuplicateMethod { method, .. }
            | MockcError::NonExportedMethod { method, .. }
            | MockcError::FieldNameCollision { method, .. } => Some(method),
            _ => None,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
