//! Error types for sqlforge.

use thiserror::Error;

/// The main error type for statement building and execution.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// The expression node kind is not valid where it was used.
    #[error("Unsupported expression shape: {kind} is not valid as {context}")]
    UnsupportedExpression {
        kind: &'static str,
        context: &'static str,
    },

    /// A required selector or expression was not supplied.
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// The type carries no usable entity mapping.
    #[error("No entity mapping for '{entity}': {reason}")]
    MetadataNotFound { entity: String, reason: String },

    /// A member name that is not mapped on its entity.
    #[error("Unknown member '{member}' on entity '{entity}'")]
    UnknownMember { entity: String, member: String },

    /// A statement needs a primary key the entity does not declare.
    #[error("Entity '{0}' declares no primary key")]
    MissingPrimaryKey(String),

    /// Page index and size are 1-based.
    #[error("Invalid paging: page index {page_index}, page size {page_size}")]
    InvalidPaging { page_index: u32, page_size: u32 },

    /// Entity (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Statement execution error.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForgeError {
    /// Create an unsupported-shape error.
    pub fn unsupported(kind: &'static str, context: &'static str) -> Self {
        Self::UnsupportedExpression { kind, context }
    }

    /// Create an unknown-member error.
    pub fn unknown_member(entity: impl Into<String>, member: impl Into<String>) -> Self {
        Self::UnknownMember {
            entity: entity.into(),
            member: member.into(),
        }
    }

    /// Create a metadata error.
    pub fn metadata(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MetadataNotFound {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

impl From<sqlx::Error> for ForgeError {
    fn from(e: sqlx::Error) -> Self {
        ForgeError::Database(e.to_string())
    }
}

impl From<toml::de::Error> for ForgeError {
    fn from(e: toml::de::Error) -> Self {
        ForgeError::Config(e.to_string())
    }
}

/// Result type alias for sqlforge operations.
pub type ForgeResult<T> = Result<T, ForgeError>;
