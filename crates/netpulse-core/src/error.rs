//! Error taxonomy for telemetry acquisition and ingestion.
//!
//! Each variant maps to one recovery policy: validation errors stay local
//! (the offending field keeps its previous value, nothing is sent), remote
//! errors are surfaced without retry, and CSV/shape errors never partially
//! apply a replacement window.

use thiserror::Error;

/// Errors from the CSV ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvError {
    /// The payload had no header row.
    #[error("CSV payload is empty")]
    Empty,

    /// One or more required columns are absent from the header.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A data row could not be parsed. Rows are rejected rather than
    /// coerced, so a bad row fails the whole upload.
    #[error("row {line}: {reason}")]
    Row { line: usize, reason: String },
}

/// Parallel series of unequal length offered as a replacement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "series length mismatch: timestamps={timestamps} latency={latency} \
     bandwidth={bandwidth} packet_loss={packet_loss} jitter={jitter}"
)]
pub struct ShapeError {
    pub timestamps: usize,
    pub latency: usize,
    pub bandwidth: usize,
    pub packet_loss: usize,
    pub jitter: usize,
}

/// Errors from the consumed REST APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the bearer token.
    #[error("credential rejected by server")]
    CredentialRejected,

    /// Non-success response with a detail message.
    #[error("remote error ({status}): {detail}")]
    Remote { status: u16, detail: String },

    /// The response body did not match the documented shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Top-level error type for acquisition-controller operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Malformed or out-of-range input. Recovered locally; no remote call
    /// is made and the previous field value is retained.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// No credential available; the caller should redirect to login.
    #[error("not signed in")]
    AuthRequired,

    /// The server rejected the credential mid-session. Terminal for the
    /// operation and for any active continuous monitoring.
    #[error("session expired")]
    SessionExpired,

    /// Batch and continuous acquisition are mutually exclusive.
    #[error("batch and continuous modes are mutually exclusive")]
    ModeConflict,

    /// Batch commit stopped at the first failing entry. Entries committed
    /// before the failure stay committed.
    #[error("batch commit failed at entry {failed_index} ({committed} committed)")]
    Submission {
        failed_index: usize,
        committed: usize,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl TelemetryError {
    /// Whether the caller should drop the session and redirect to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::SessionExpired)
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_each_name() {
        let err = CsvError::MissingColumns(vec!["jitter".into(), "latency".into()]);
        assert_eq!(err.to_string(), "missing required columns: jitter, latency");
    }

    #[test]
    fn submission_error_names_failure_point() {
        let err = TelemetryError::Submission {
            failed_index: 1,
            committed: 1,
            source: ApiError::Network("timeout".into()),
        };
        assert!(err.to_string().contains("entry 1"));
        assert!(err.to_string().contains("1 committed"));
    }

    #[test]
    fn auth_errors_redirect_to_login() {
        assert!(TelemetryError::AuthRequired.requires_login());
        assert!(TelemetryError::SessionExpired.requires_login());
        assert!(!TelemetryError::ModeConflict.requires_login());
    }
}
