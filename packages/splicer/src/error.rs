//! Error types for the splicer.

use thiserror::Error;

/// Main error type for extraction and reinsertion.
#[derive(Debug, Error)]
pub enum SplicerError {
    /// Leaf content already contains text shaped like a placeholder of this session.
    #[error("placeholder collision: content already contains session key {session_key}")]
    PlaceholderCollision { session_key: String },

    /// A placeholder recorded during extraction is absent from its skeleton.
    #[error("placeholder {placeholder} not found in skeleton")]
    MissingPlaceholder { placeholder: String },

    /// Annotated fragment count differs from the extracted fragment count.
    #[error("expected {expected} annotated fragments, got {actual}")]
    AnnotationCountMismatch { expected: usize, actual: usize },

    /// The reinsert pass reached more eligible leaves than the extract pass recorded.
    #[error("reinsert pass visited more eligible leaves than were extracted ({extracted})")]
    SessionExhausted { extracted: usize },

    /// The reinsert pass finished with leaves left unresolved.
    #[error("reinsert pass resolved {resolved} of {extracted} extracted leaves")]
    UnusedFragments { resolved: usize, extracted: usize },
}

/// Result type alias for splicer operations.
pub type Result<T> = std::result::Result<T, SplicerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SplicerError::AnnotationCountMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "expected 3 annotated fragments, got 2");
    }

    #[test]
    fn test_missing_placeholder_display() {
        let err = SplicerError::MissingPlaceholder {
            placeholder: "[abc-0]".to_string(),
        };
        assert!(err.to_string().contains("[abc-0]"));
    }
}
