use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Splicer(#[from] annotext_splicer::SplicerError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NER API error (status {status}): {message}")]
    NerApiError { status: u16, message: String },

    #[error("failed to parse NER response: {0}")]
    NerResponseParse(String),

    #[error("annotation returned {actual} fragments for {expected} inputs")]
    AnnotationLengthMismatch { expected: usize, actual: usize },

    #[error("store API error (status {status}): {message}")]
    StoreApiError { status: u16, message: String },

    #[error("store {operation} failed: {message}")]
    Store { operation: String, message: String },

    #[error("document {id} could not be loaded: {message}")]
    InvalidDocument { id: String, message: String },

    #[error("document has no usable id: {0}")]
    MissingDocumentId(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker error: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splicer_error_is_transparent() {
        let err: PipelineError = annotext_splicer::SplicerError::AnnotationCountMismatch {
            expected: 2,
            actual: 1,
        }
        .into();
        assert_eq!(err.to_string(), "expected 2 annotated fragments, got 1");
    }

    #[test]
    fn test_length_mismatch_display() {
        let err = PipelineError::AnnotationLengthMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "annotation returned 3 fragments for 4 inputs");
    }
}
