//! Error types for the A/B test simulator
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Variant;

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,
    UnknownPersona = 103,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Image reference errors (3xx)
    InvalidImageReference = 300,

    // Description errors (4xx)
    DescriptionUnavailable = 400,
    PipelineAborted = 401,

    // Evaluation errors (5xx)
    EvaluationFailed = 500,
    InsufficientData = 501,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Image reference errors
            400..=499 => 40, // Description / pipeline errors
            500..=599 => 50, // Evaluation errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the simulator
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persona name not recognised
    #[error("Unknown persona '{name}'. Valid: sarah, jake, robert")]
    UnknownPersona { name: String },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Image Reference Errors
    // ─────────────────────────────────────────────────────────────

    /// Malformed image URL/path or unsupported format. Never retried.
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidImageReference { reference: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Description / Pipeline Errors
    // ─────────────────────────────────────────────────────────────

    /// The vision capability could not produce a description (transient)
    #[error("Image description unavailable for variant {variant}: {message}")]
    DescriptionUnavailable { variant: Variant, message: String },

    /// The whole test run was aborted; no partial result exists
    #[error("Pipeline aborted: {message}")]
    PipelineAborted { message: String },

    // ─────────────────────────────────────────────────────────────
    // Evaluation Errors
    // ─────────────────────────────────────────────────────────────

    /// One (persona, variant) evaluation task failed
    #[error("Evaluation failed for persona '{persona}' on variant {variant}: {message}")]
    EvaluationError {
        persona: String,
        variant: Variant,
        message: String,
    },

    /// A variant ended with zero successful evaluations
    #[error("Insufficient data: no successful evaluations for variant {variant}")]
    InsufficientData { variant: Variant },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::Config(_) => ErrorCode::ConfigValidation,
            Error::UnknownPersona { .. } => ErrorCode::UnknownPersona,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::InvalidImageReference { .. } => ErrorCode::InvalidImageReference,

            Error::DescriptionUnavailable { .. } => ErrorCode::DescriptionUnavailable,
            Error::PipelineAborted { .. } => ErrorCode::PipelineAborted,

            Error::EvaluationError { .. } => ErrorCode::EvaluationFailed,
            Error::InsufficientData { .. } => ErrorCode::InsufficientData,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is transient and worth retrying
    ///
    /// Only the description boundary retries; evaluation failures are
    /// recorded per-item instead.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::DescriptionUnavailable { .. } | Error::Io(_) | Error::IoRead { .. }
        )
    }

    /// Check if the error aborts the whole run (no partial result)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::Config(_)
                | Error::UnknownPersona { .. }
                | Error::InvalidImageReference { .. }
                | Error::PipelineAborted { .. }
                | Error::InsufficientData { .. }
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'absim config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'absim config validate' to see details."
            ),
            Error::Config(_) => Some(
                "Review the configuration file and fix the invalid values. See documentation for valid options."
            ),
            Error::UnknownPersona { .. } => Some(
                "Run 'absim persona list' to see the available persona profiles."
            ),

            Error::InvalidImageReference { .. } => Some(
                "Image references must be http(s) URLs or paths to existing image files (jpg, png, gif, webp)."
            ),
            Error::DescriptionUnavailable { .. } => Some(
                "The vision API may be down or rate-limiting. Check your network, API key, and base_url in [vision]."
            ),
            Error::PipelineAborted { .. } => Some(
                "The run produced no result. Check the log output above for the underlying cause."
            ),
            Error::InsufficientData { .. } => Some(
                "Every persona evaluation failed for one variant. Re-run, or check the scoring backend."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", code.as_str(), self);

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create an invalid image reference error
    pub fn invalid_image(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidImageReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create a description-unavailable error for a variant
    pub fn description_unavailable(variant: Variant, message: impl Into<String>) -> Self {
        Error::DescriptionUnavailable {
            variant,
            message: message.into(),
        }
    }

    /// Create a pipeline-aborted error
    pub fn pipeline_aborted(message: impl Into<String>) -> Self {
        Error::PipelineAborted {
            message: message.into(),
        }
    }

    /// Create an evaluation error for one (persona, variant) task
    pub fn evaluation(
        persona: impl Into<String>,
        variant: Variant,
        message: impl Into<String>,
    ) -> Self {
        Error::EvaluationError {
            persona: persona.into(),
            variant,
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::InvalidImageReference.as_str(), "E300");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::InvalidImageReference.exit_code(), 30);
        assert_eq!(ErrorCode::PipelineAborted.exit_code(), 40);
        assert_eq!(ErrorCode::EvaluationFailed.exit_code(), 50);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_codes() {
        let err = Error::invalid_image("ftp://x", "unsupported scheme");
        assert_eq!(err.code(), ErrorCode::InvalidImageReference);

        let err = Error::description_unavailable(Variant::A, "timeout");
        assert_eq!(err.code(), ErrorCode::DescriptionUnavailable);

        let err = Error::evaluation("sarah", Variant::B, "scorer down");
        assert_eq!(err.code(), ErrorCode::EvaluationFailed);
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::description_unavailable(Variant::A, "503").is_retryable());
        assert!(!Error::invalid_image("x", "bad").is_retryable());
        assert!(!Error::evaluation("jake", Variant::A, "boom").is_retryable());
    }

    #[test]
    fn test_error_fatal() {
        assert!(Error::invalid_image("x", "bad").is_fatal());
        assert!(Error::pipeline_aborted("both descriptions failed").is_fatal());
        assert!(Error::InsufficientData { variant: Variant::B }.is_fatal());
        assert!(!Error::evaluation("jake", Variant::A, "boom").is_fatal());
        assert!(!Error::description_unavailable(Variant::A, "503").is_fatal());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/test"),
        };
        assert!(err.suggestion().is_some());
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::invalid_image("x", "bad");
        assert!(err.suggestion().unwrap().contains("http(s)"));
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::invalid_image("not-an-image.txt", "unsupported format");
        let formatted = err.format_for_terminal();

        assert!(formatted.contains("E300"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::pipeline_aborted("timed out");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E401]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
