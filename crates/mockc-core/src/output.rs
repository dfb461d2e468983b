//! JSON output types for the `mockc` binary.
//!
//! Every run prints exactly one JSON document on stdout. A run that got as
//! far as generating prints a [`GenerateResponse`] with one [`UnitReport`] per
//! output unit; a run that failed before that prints an [`ErrorResponse`].
//! Output is deterministic: the same input produces identical bytes.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MockcError, OutputErrorCode};

/// Schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Content Hash
// ============================================================================

/// SHA-256 of generated file content, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error information for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code (see [`OutputErrorCode`]).
    pub code: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &MockcError) -> Self {
        let details = match err {
            MockcError::MergeCycle { cycle, .. } => Some(serde_json::json!({ "cycle": cycle })),
            MockcError::NonExportedMethod { offending, .. } => {
                Some(serde_json::json!({ "offending": offending }))
            }
            MockcError::FieldNameCollision { field, other, .. } => {
                Some(serde_json::json!({ "field": field, "other": other }))
            }
            MockcError::UnknownDirective { directive, .. } => {
                Some(serde_json::json!({ "directive": directive }))
            }
            MockcError::InvalidConfigValue { setting, .. } => {
                Some(serde_json::json!({ "setting": setting }))
            }
            MockcError::StaleOutput { path } | MockcError::Io { path, .. } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            _ => None,
        };

        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            mock: err.mock().map(str::to_string),
            method: err.method().map(str::to_string),
            details,
        }
    }
}

/// Response for a run that failed before any unit was generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn new(error: ErrorInfo) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error,
        }
    }
}

// ============================================================================
// Generation Reports
// ============================================================================

/// What happened to one output unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// The file was (re)written.
    Written,
    /// The file already had the generated content; nothing was written.
    Unchanged,
    /// Rendered only (`--dry-run`).
    Rendered,
    /// `--check`: the file on disk matches.
    UpToDate,
    /// `--check`: the file on disk is missing or differs.
    Stale,
    /// Generation failed; nothing was written.
    Failed,
}

impl UnitStatus {
    pub fn is_failure(self) -> bool {
        matches!(self, UnitStatus::Stale | UnitStatus::Failed)
    }
}

/// Report for one output unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    /// Path of the generated file.
    pub destination: String,
    pub status: UnitStatus,
    /// Mock names in the unit, in generator order.
    pub mocks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
    /// Rendered source, only for `--dry-run`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl UnitReport {
    pub fn success(
        destination: impl Into<String>,
        status: UnitStatus,
        mocks: Vec<String>,
        content_hash: ContentHash,
    ) -> Self {
        UnitReport {
            destination: destination.into(),
            status,
            mocks,
            content_hash: Some(content_hash),
            content: None,
            error: None,
        }
    }

    pub fn failure(destination: impl Into<String>, mocks: Vec<String>, err: &MockcError) -> Self {
        let status = if matches!(err, MockcError::StaleOutput { .. }) {
            UnitStatus::Stale
        } else {
            UnitStatus::Failed
        };
        UnitReport {
            destination: destination.into(),
            status,
            mocks,
            content_hash: None,
            content: None,
            error: Some(ErrorInfo::from_error(err)),
        }
    }
}

/// Response for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// "ok" when every unit succeeded, "error" otherwise.
    pub status: String,
    pub schema_version: String,
    pub units: Vec<UnitReport>,
}

impl GenerateResponse {
    pub fn new(units: Vec<UnitReport>) -> Self {
        let failed = units.iter().any(|u| u.status.is_failure());
        GenerateResponse {
            status: if failed { "error" } else { "ok" }.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            units,
        }
    }

    /// Code of the first failed unit, if any.
    pub fn first_error_code(&self) -> Option<u8> {
        self.units
            .iter()
            .find_map(|u| u.error.as_ref().map(|e| e.code))
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
