//! Error types for the collaborators the profile pipeline talks to.
//!
//! Only [`ExportError`] is ever surfaced to an HTTP caller. The others are
//! logged by the pipeline and degrade to an empty value.

/// Errors from the hosted search API.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("search API returned status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Terminal outcome of fetching one candidate page.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// 4xx other than 429. Never retried.
    #[error("permanent HTTP status {0}")]
    Permanent(u16),

    /// 5xx or 429 that survived every retry.
    #[error("HTTP status {status} after {attempts} attempt(s)")]
    Transient { status: u16, attempts: u32 },

    #[error("network error after {attempts} attempt(s): {message}")]
    Network { message: String, attempts: u32 },

    #[error("failed to read body: {0}")]
    Body(String),
}

/// Errors from the generative-language API.
#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("summarizer API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("summarizer API returned status {0}")]
    Status(u16),

    #[error("no text in summarizer response")]
    EmptyResponse,
}

/// Export failures are fatal for the request that asked for them.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),
}
