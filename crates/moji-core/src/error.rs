//! Error types for the Moji funnel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Stage;

/// A shared error type for the whole funnel core.
///
/// Every variant is recoverable: an error either leaves the session in the
/// stage it was in, or reverts it to the previous stable stage. Nothing in
/// this type is treated as process-fatal.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MojiError {
    /// The uploaded file declared a media type the funnel does not accept.
    #[error("Unsupported media type '{media_type}' (accepted: image/jpeg, image/png)")]
    UnsupportedFormat { media_type: String },

    /// An operation was invoked while the session was in the wrong stage.
    #[error("Operation '{operation}' requires stage {expected:?}, session is in {actual:?}")]
    InvalidStage {
        operation: String,
        expected: Stage,
        actual: Stage,
    },

    /// A required choice has not been made yet.
    #[error("No {what} selected")]
    MissingSelection { what: String },

    /// An index referred to an item outside the current set.
    #[error("{what} index {index} is out of range")]
    OutOfRange { what: String, index: usize },

    /// The sticker subset does not hold the required number of items.
    #[error("Selection incomplete: {selected} of {required} stickers chosen")]
    SelectionIncomplete { selected: usize, required: usize },

    /// A synthesis collaborator call failed. Retriable by the user.
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// The payment collaborator declined the charge. The session stays in
    /// the payment stage with all funnel state intact.
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// The download grant has passed its expiry; a new one must be issued.
    #[error("Download grant expired")]
    ExpiredGrant,

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MojiError {
    /// Creates an UnsupportedFormat error
    pub fn unsupported_format(media_type: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            media_type: media_type.into(),
        }
    }

    /// Creates an InvalidStage error
    pub fn invalid_stage(operation: impl Into<String>, expected: Stage, actual: Stage) -> Self {
        Self::InvalidStage {
            operation: operation.into(),
            expected,
            actual,
        }
    }

    /// Creates a MissingSelection error
    pub fn missing_selection(what: impl Into<String>) -> Self {
        Self::MissingSelection { what: what.into() }
    }

    /// Creates an OutOfRange error
    pub fn out_of_range(what: impl Into<String>, index: usize) -> Self {
        Self::OutOfRange {
            what: what.into(),
            index,
        }
    }

    /// Creates a Synthesis error
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis(message.into())
    }

    /// Creates a PaymentDeclined error
    pub fn payment_declined(reason: impl Into<String>) -> Self {
        Self::PaymentDeclined {
            reason: reason.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a stage-guard rejection
    pub fn is_invalid_stage(&self) -> bool {
        matches!(self, Self::InvalidStage { .. })
    }

    /// Check if this error is worth retrying the same operation for.
    ///
    /// Synthesis failures revert the session to the previous stable stage,
    /// so the user can simply repeat the action.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Synthesis(_) | Self::PaymentDeclined { .. })
    }

    /// Check if this is an expired-grant condition
    pub fn is_expired_grant(&self) -> bool {
        matches!(self, Self::ExpiredGrant)
    }
}

impl From<std::io::Error> for MojiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MojiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MojiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MojiError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, MojiError>`.
pub type Result<T> = std::result::Result<T, MojiError>;
