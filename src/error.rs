use thiserror::Error;

/// Errors produced by the pipeline and its collaborators.
///
/// Stages never return these to the orchestrator; they are converted into
/// degraded outcomes at the stage boundary. They surface from collaborator
/// calls, configuration, and the batch driver.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure while persisting artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write failure in the batch driver.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A pipeline stage failed with a descriptive message.
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    /// Invalid configuration detected at build time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP error with status code and response body.
    ///
    /// Returned by LLM backends, the search client and the embedding client
    /// when the remote service answers with a non-success status.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 401, 429, 500).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
