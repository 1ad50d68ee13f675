//! Error types for the RFP orchestration engine.
//!
//! A flat `thiserror` hierarchy: one top-level enum with a sub-enum per
//! concern, converted via `#[from]` at the boundary where that concern's
//! errors are first produced (retrieval I/O, the LLM transport, JSON
//! extraction from model output, agent execution, configuration loading).

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for all engine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Document ingestion, storage, or search errors.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// LLM transport or invocation errors.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Failed to extract structured JSON from model output.
    #[error("failed to parse JSON from model output: {reason}")]
    JsonParse {
        /// Why the parse failed.
        reason: String,
    },

    /// A specialist agent failed to produce an answer.
    #[error("agent processing failed in domain '{domain}': {message}")]
    AgentProcessing {
        /// Domain the failing agent was handling.
        domain: String,
        /// Description of the failure.
        message: String,
    },

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Request failed input validation.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Catch-all for conditions that should not occur.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

/// Errors raised by the retrieval and ingestion pipeline.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// The retrieval index has not been initialized.
    #[error("retrieval index not initialized")]
    NotInitialized,

    /// Requested document was not found.
    #[error("document not found: {id}")]
    DocumentNotFound {
        /// Document identifier that was not found.
        id: String,
    },

    /// PDF text extraction failed.
    #[error("failed to extract text from PDF '{source}': {reason}")]
    PdfExtraction {
        /// Original filename of the PDF.
        source: String,
        /// Reason extraction failed.
        reason: String,
    },

    /// Uploaded file was rejected (wrong extension, empty, etc).
    #[error("invalid upload: {reason}")]
    InvalidUpload {
        /// Reason the upload was rejected.
        reason: String,
    },

    /// Chunking of document text failed.
    #[error("chunking failed: {0}")]
    Chunking(#[from] ChunkingError),

    /// Embedding generation failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Underlying I/O error while reading or writing documents.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

/// Errors raised when talking to the LLM backend.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The HTTP request to the LLM backend failed outright.
    #[error("request to LLM backend failed: {reason}")]
    RequestFailed {
        /// Underlying transport error description.
        reason: String,
    },

    /// The LLM backend responded with a non-success status.
    #[error("LLM backend returned an error response: {status} {body}")]
    ErrorResponse {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("invalid LLM response: {reason}")]
    InvalidResponse {
        /// Description of the decoding failure.
        reason: String,
    },

    /// The request exceeded its time budget.
    #[error("LLM request timed out after {seconds}s")]
    Timeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },
}

/// Chunking-specific errors for text processing.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid UTF-8 encountered at specific byte offset.
    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where invalid UTF-8 was found.
        offset: usize,
    },

    /// Chunk size exceeds maximum allowed.
    #[error("chunk size {size} exceeds maximum {max}")]
    ChunkTooLarge {
        /// Actual chunk size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap exceeds chunk size.
    #[error("overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge {
        /// Overlap size.
        overlap: usize,
        /// Chunk size.
        size: usize,
    },
}

/// Errors raised while loading and validating typed settings.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A key held a value that could not be parsed into its expected type.
    #[error("invalid value for '{key}': {value}")]
    InvalidValue {
        /// The offending environment variable name.
        key: String,
        /// The raw value that failed to parse.
        value: String,
    },

    /// A key held a value outside its documented range.
    #[error("'{key}' value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// The offending environment variable name.
        key: String,
        /// The value that was out of range.
        value: String,
        /// Minimum allowed value.
        min: String,
        /// Maximum allowed value.
        max: String,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Retrieval(RetrievalError::Io(IoError::Generic(err.to_string())))
    }
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        Self::Generic(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Retrieval(RetrievalError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for RetrievalError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ChunkingError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: err.utf8_error().valid_up_to(),
        }
    }
}

impl From<std::str::Utf8Error> for ChunkingError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: err.valid_up_to(),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { seconds: 0 }
        } else {
            Self::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation {
            message: "question must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "validation error: question must not be empty"
        );
    }

    #[test]
    fn test_error_display_agent_processing() {
        let err = Error::AgentProcessing {
            domain: "legal".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "agent processing failed in domain 'legal': timeout"
        );
    }

    #[test]
    fn test_retrieval_error_not_initialized() {
        let err = RetrievalError::NotInitialized;
        assert_eq!(err.to_string(), "retrieval index not initialized");
    }

    #[test]
    fn test_retrieval_error_document_not_found() {
        let err = RetrievalError::DocumentNotFound {
            id: "doc-1".to_string(),
        };
        assert_eq!(err.to_string(), "document not found: doc-1");
    }

    #[test]
    fn test_llm_error_timeout() {
        let err = LlmError::Timeout { seconds: 30 };
        assert_eq!(err.to_string(), "LLM request timed out after 30s");
    }

    #[test]
    fn test_llm_error_response() {
        let err = LlmError::ErrorResponse {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_chunking_error_variants() {
        let err = ChunkingError::OverlapTooLarge {
            overlap: 100,
            size: 50,
        };
        assert_eq!(
            err.to_string(),
            "overlap 100 must be less than chunk size 50"
        );

        let err = ChunkingError::InvalidConfig {
            reason: "chunk_size must be > 0".to_string(),
        };
        assert!(err.to_string().contains("chunk_size must be > 0"));
    }

    #[test]
    fn test_io_error_variants() {
        let err = IoError::ReadFailed {
            path: "/tmp/test".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("permission denied"));

        let err = IoError::Generic("unknown error".to_string());
        assert!(err.to_string().contains("unknown error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Retrieval(RetrievalError::Io(_))));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: Error = rusqlite_err.into();
        assert!(matches!(
            err,
            Error::Retrieval(RetrievalError::Database(_))
        ));
    }

    #[test]
    fn test_retrieval_error_from_chunking() {
        let chunk_err = ChunkingError::InvalidUtf8 { offset: 0 };
        let err: RetrievalError = chunk_err.into();
        assert!(matches!(err, RetrievalError::Chunking(_)));
    }

    #[test]
    fn test_configuration_error_out_of_range() {
        let err = ConfigurationError::OutOfRange {
            key: "retrieval_k".to_string(),
            value: "500".to_string(),
            min: "1".to_string(),
            max: "50".to_string(),
        };
        assert!(err.to_string().contains("retrieval_k"));
        let wrapped: Error = err.into();
        assert!(matches!(wrapped, Error::Configuration(_)));
    }

    #[test]
    fn test_chunking_error_from_utf8() {
        let invalid_bytes: Vec<u8> = vec![0xff, 0xfe];
        let utf8_err = std::str::from_utf8(&invalid_bytes).unwrap_err();
        let err: ChunkingError = utf8_err.into();
        assert!(matches!(err, ChunkingError::InvalidUtf8 { .. }));
    }
}
