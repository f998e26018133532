//! Error types for the FormChat application.

use thiserror::Error;

/// A shared error type for the entire FormChat application.
///
/// Line-level parse problems (field schema lines, protocol lines) never become
/// errors; they are dropped by the lenient decoders. Everything here is
/// surfaced to the caller of a turn or to startup code.
#[derive(Error, Debug, Clone)]
pub enum FormChatError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The LLM backend failed (transport, non-2xx, timeout, malformed payload)
    #[error("Completion service error: {message}")]
    Collaborator {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
    },

    /// Form record storage failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A save was requested before every primary-key field had a value
    #[error("Cannot save form '{form}': missing primary key field(s) {}", .fields.join(", "))]
    MissingPrimaryKey { form: String, fields: Vec<String> },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FormChatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Collaborator error that should not be retried as-is
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            status_code: None,
            message: message.into(),
            is_retryable: false,
        }
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an LLM backend failure
    pub fn is_collaborator(&self) -> bool {
        matches!(self, Self::Collaborator { .. })
    }

    /// Check if this is a storage failure
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Check if this is a missing primary key error
    pub fn is_missing_primary_key(&self) -> bool {
        matches!(self, Self::MissingPrimaryKey { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Collaborator { is_retryable, .. } => *is_retryable,
            _ => false,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for FormChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for FormChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FormChatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for FormChatError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, FormChatError>`.
pub type Result<T> = std::result::Result<T, FormChatError>;
