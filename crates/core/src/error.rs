//! Error types for the thumbmaster-core library.
//!
//! Variants are grouped by how the caller has to react: credential problems
//! block the wizard until a key is selected again, quota and remote failures
//! are dismissible notices, and controller misuse means the caller asked for
//! something the current step does not allow.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur within the thumbmaster-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values, unparsable numbers).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// The credential gate has not been passed yet.
    #[error("An API key must be selected before using the studio")]
    CredentialRequired,

    /// The remote service rejected the key (expired, revoked or unknown).
    #[error("API key is invalid or expired: {0}")]
    InvalidCredential(String),

    /// The remote project ran out of quota.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// General Gemini API error (network, malformed response, empty candidate).
    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    /// An image could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// Building a PNG or archive for download failed. Nothing was produced.
    #[error("Export failed: {0}")]
    Export(String),

    /// An outstanding operation exceeded its time limit.
    #[error("{operation} timed out after {}s", .limit.as_secs())]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },

    /// An outstanding operation was cancelled by the caller.
    #[error("{0} was cancelled")]
    Cancelled(&'static str),

    /// The requested wizard transition is not valid from the current step.
    #[error("Cannot {action} from step {step}")]
    InvalidTransition { action: &'static str, step: usize },

    /// The draft is missing something the next step needs.
    #[error("Incomplete request: {0}")]
    IncompleteDraft(&'static str),

    /// No result slot at the given index.
    #[error("Result slot not found: index {0}")]
    SlotNotFound(usize),

    /// A refinement finished for a slot that is no longer part of the batch.
    #[error("Result slot {0} is no longer available")]
    StaleSlot(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a Gemini API error with the given message.
    pub fn gemini(msg: impl Into<String>) -> Self {
        Self::GeminiApi(msg.into())
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Returns true for errors that mean the user has to pick a key again.
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            Self::CredentialRequired | Self::InvalidCredential(_) | Self::MissingEnvVar(_)
        )
    }

    /// User-facing remediation text for the error class.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::QuotaExceeded(_) => {
                "Usage quota exceeded. Use an API key from a project with billing enabled."
            }
            Self::InvalidCredential(_) | Self::CredentialRequired | Self::MissingEnvVar(_) => {
                "Your API key expired or is invalid. Please select it again."
            }
            Self::Export(_) | Self::Timeout { operation: "render", .. } => {
                "Could not build the download. Nothing was saved."
            }
            Self::GeminiApi(_) | Self::Timeout { .. } => {
                "Generation failed. Check your connection or API quota."
            }
            Self::Cancelled(_) => "Operation cancelled.",
            _ => "Something went wrong. Please try again.",
        }
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
