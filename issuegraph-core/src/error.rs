/// Top-level issuegraph error type.
///
/// All fallible operations in `issuegraph-core` return
/// [`Result<T, IssueGraphError>`](Result). Each variant wraps a
/// domain-specific error enum, allowing callers to match on the error
/// source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum IssueGraphError {
    /// Error fetching issues from the tracker API.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error communicating with the completion service.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Required input was missing or empty — caught before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error loading or saving the settings file.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Errors from the paginated issue fetch.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The HTTP response had a non-2xx status.
    #[error("GitHub API error: {status} {reason}")]
    Transport {
        /// Numeric HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
    },

    /// The API response body carried an error list; this is the first
    /// error's message.
    #[error("{0}")]
    Query(String),

    /// Network-level failure before any HTTP status was received.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be deserialized.
    #[error("Response parse error: {0}")]
    Parse(String),
}

/// Errors from completion-service interactions.
#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    /// Network-level failure connecting to the completion service.
    #[error("Network error: {0}")]
    Network(String),

    /// Completion service returned a non-success HTTP status.
    #[error("API error (HTTP {status}): {body}")]
    ApiError {
        /// HTTP status code from the provider.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// A stream frame could not be parsed into the expected shape.
    #[error("Stream parse error: {0}")]
    Parse(String),

    /// Completion-service configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors loading or saving persisted settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// Settings file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Filesystem I/O error reading or writing the settings file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, IssueGraphError>`.
pub type Result<T> = std::result::Result<T, IssueGraphError>;
