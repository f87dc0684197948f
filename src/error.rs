//! Error types with HTTP status code mapping.
//!
//! [`PitrError`] is the central error type. Its variants follow the
//! failure taxonomy of the system: format, I/O, persistence, external
//! process and precondition errors, plus a wrapper that pins a restore
//! failure to the step that produced it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::RestoreStep;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "external command failed: pg_basebackup (exit 1)",
///     "details": "pg_basebackup: error: connection to server ... failed"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Captured output of the failing external command, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Service error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                 |
/// |-----------|----------------------|-----------------------------|
/// | 1000–1999 | Validation / format  | 400 Bad Request             |
/// | 2000–2999 | Precondition / state | 409 Conflict                |
/// | 3000–3999 | Server / storage     | 500 Internal Server Error   |
/// | 4000–4999 | External process     | 502 Bad Gateway             |
#[derive(Debug, thiserror::Error)]
pub enum PitrError {
    /// A name that is not a WAL segment filename.
    #[error("invalid WAL filename: {0}")]
    InvalidWalFilename(String),

    /// Text that is not a `HEX/HEX` log sequence number.
    #[error("invalid LSN: {0:?} (expected HEX/HEX)")]
    InvalidLsn(String),

    /// Directory or file access failure.
    #[error("{context}: {source}")]
    Io {
        /// What was being accessed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Catalog read or write failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// An external command exited unsuccessfully.
    #[error("external command failed: {command} ({})", exit_label(*.status))]
    ExternalProcess {
        /// The command line that was run.
        command: String,
        /// Exit code, or `None` if terminated by a signal.
        status: Option<i32>,
        /// Combined stdout and stderr.
        output: String,
    },

    /// An operation was attempted before its precondition held.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Another maintenance operation is already running.
    #[error("busy: {0}")]
    Busy(String),

    /// A fatal restore step failure.
    #[error("restore failed at {step}: {source}")]
    RestoreStep {
        /// The step that failed.
        step: RestoreStep,
        /// Cause of the failure.
        #[source]
        source: Box<PitrError>,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A maintenance task ended without reporting an outcome.
    #[error("internal error: {0}")]
    Internal(String),
}

fn exit_label(status: Option<i32>) -> String {
    status.map_or_else(|| "terminated by signal".to_string(), |code| format!("exit {code}"))
}

impl PitrError {
    /// Builds a [`PitrError::Io`] with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Pins an error to the restore step that produced it.
    #[must_use]
    pub fn at_step(self, step: RestoreStep) -> Self {
        Self::RestoreStep {
            step,
            source: Box::new(self),
        }
    }

    /// Returns the failing restore step, if this is a step failure.
    #[must_use]
    pub const fn step(&self) -> Option<RestoreStep> {
        match self {
            Self::RestoreStep { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Returns the captured output of the failing external command,
    /// looking through step wrappers.
    #[must_use]
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::ExternalProcess { output, .. } => Some(output.as_str()),
            Self::RestoreStep { source, .. } => source.captured_output(),
            _ => None,
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub fn error_code(&self) -> u32 {
        match self {
            Self::InvalidWalFilename(_) => 1001,
            Self::InvalidLsn(_) => 1002,
            Self::Config(_) => 1003,
            Self::Precondition(_) => 2001,
            Self::Busy(_) => 2002,
            Self::Io { .. } => 3001,
            Self::Persistence(_) => 3002,
            Self::Internal(_) => 3003,
            Self::ExternalProcess { .. } => 4001,
            Self::RestoreStep { source, .. } => source.error_code(),
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidWalFilename(_) | Self::InvalidLsn(_) | Self::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Precondition(_) | Self::Busy(_) => StatusCode::CONFLICT,
            Self::Io { .. } | Self::Persistence(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ExternalProcess { .. } => StatusCode::BAD_GATEWAY,
            Self::RestoreStep { source, .. } => source.status_code(),
        }
    }
}

impl From<sqlx::Error> for PitrError {
    fn from(e: sqlx::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl IntoResponse for PitrError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.captured_output().map(str::to_string),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
