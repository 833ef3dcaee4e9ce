//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the memory service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Resource not found
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Invalid argument provided to a function
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// Hook input failed validation (§4.1 validation gates)
    #[error("Validation failed: {message}")]
    Validation {
        /// Description of what failed validation
        message: String,
    },

    /// Type/collection mismatch (§3 invariants)
    #[error("Type '{item_type}' does not belong to collection '{collection}'")]
    TypeCollectionMismatch {
        /// The offending type
        item_type: String,
        /// The collection it was assigned to
        collection: String,
    },

    /// Vector store operation error
    #[error("Vector store error: {message}")]
    VectorStore {
        /// Description of the vector store error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Vector dimension mismatch at startup (fatal, per §7 taxonomy)
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension advertised by config/embedder at startup
        expected: usize,
        /// Dimension actually produced
        actual: usize,
    },

    /// Embedding provider operation error
    #[error("Embedding error: {message}")]
    Embedding {
        /// Description of the embedding provider error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Security scanner blocked the content (secret finding)
    #[error("Content blocked by security scan: {finding_count} finding(s)")]
    SecurityBlocked {
        /// Number of blocking findings
        finding_count: usize,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Upstream API error (sync engine, §4.4)
    #[error("Upstream API error: {message}")]
    Upstream {
        /// Description of the upstream error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Sync circuit breaker opened for the current cycle
    #[error("Circuit breaker open after {consecutive_failures} consecutive failures")]
    CircuitBreakerOpen {
        /// Consecutive per-item failures observed before tripping
        consecutive_failures: u32,
    },

    /// An outbound call exceeded its budget
    #[error("Operation '{operation}' timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    Timeout {
        /// Name of the operation that timed out
        operation: String,
        /// Milliseconds actually elapsed
        elapsed_ms: u64,
        /// Milliseconds budgeted
        budget_ms: u64,
    },

    /// Pending-queue resource error (lock timeout, oversized file, ...)
    #[error("Queue error: {message}")]
    Queue {
        /// Description of the queue error
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl Error {
    /// Create an I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a vector store error
    pub fn vector_store<S: Into<String>>(message: S) -> Self {
        Self::VectorStore {
            message: message.into(),
            source: None,
        }
    }

    /// Create a vector store error with source
    pub fn vector_store_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::VectorStore {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an embedding error
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
            source: None,
        }
    }

    /// Create an embedding error with source
    pub fn embedding_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Embedding {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an upstream API error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }

    /// Create an upstream API error with source
    pub fn upstream_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Upstream {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a queue error
    pub fn queue<S: Into<String>>(message: S) -> Self {
        Self::Queue {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
