//! Store-specific error types for pure data operations.
//!
//! These errors represent failures in the persistence layer only; they
//! carry no knowledge of mapping rules or sync semantics.

use std::fmt;

/// Errors that can occur during object store operations.
#[derive(Debug)]
pub enum StoreError {
    /// The requested document was not found.
    NotFound { entity_type: String, id: String },

    /// Invalid data format or structure that cannot be stored.
    InvalidData {
        message: String,
        cause: Option<String>,
    },

    /// Invalid query parameters or search criteria.
    InvalidQuery {
        message: String,
        attribute: Option<String>,
    },

    /// Concurrent modification detected on the same key.
    ConcurrentModification { entity_type: String, id: String },

    /// The commit could not be made durable.
    CommitFailed { message: String },

    /// Storage backend is temporarily unavailable.
    Unavailable { message: String },

    /// Generic internal storage error.
    Internal {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { entity_type, id } => {
                write!(f, "Document not found: {}/{}", entity_type, id)
            }
            StoreError::InvalidData { message, cause } => {
                if let Some(cause) = cause {
                    write!(f, "Invalid data: {} (cause: {})", message, cause)
                } else {
                    write!(f, "Invalid data: {}", message)
                }
            }
            StoreError::InvalidQuery { message, attribute } => {
                if let Some(attr) = attribute {
                    write!(f, "Invalid query: {} (attribute: {})", message, attr)
                } else {
                    write!(f, "Invalid query: {}", message)
                }
            }
            StoreError::ConcurrentModification { entity_type, id } => {
                write!(
                    f,
                    "Concurrent modification detected for {}/{}",
                    entity_type, id
                )
            }
            StoreError::CommitFailed { message } => {
                write!(f, "Commit failed: {}", message)
            }
            StoreError::Unavailable { message } => {
                write!(f, "Store unavailable: {}", message)
            }
            StoreError::Internal { message, .. } => {
                write!(f, "Internal store error: {}", message)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Internal { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl StoreError {
    /// Create a new NotFound error.
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create a new InvalidData error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
            cause: None,
        }
    }

    /// Create a new InvalidQuery error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
            attribute: None,
        }
    }

    /// Create a new CommitFailed error.
    pub fn commit_failed(message: impl Into<String>) -> Self {
        Self::CommitFailed {
            message: message.into(),
        }
    }

    /// Create a new Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Check if this error indicates a document was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this error indicates a temporary failure.
    pub fn is_temporary(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let error = StoreError::not_found("Zaak", "123");
        assert_eq!(error.to_string(), "Document not found: Zaak/123");

        let error = StoreError::commit_failed("disk full");
        assert_eq!(error.to_string(), "Commit failed: disk full");
    }

    #[test]
    fn test_store_error_type_checks() {
        assert!(StoreError::not_found("Zaak", "1").is_not_found());
        assert!(!StoreError::invalid_data("bad").is_not_found());
        assert!(
            StoreError::Unavailable {
                message: "down".into()
            }
            .is_temporary()
        );
    }
}
