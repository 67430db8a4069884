use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("API-Football unavailable after {attempts} attempts: {reason}")]
    ServiceUnavailable { attempts: u32, reason: String },
    #[error("malformed API-Football response: {0}")]
    BadResponse(String),
    #[error("API-Football reported errors: {0}")]
    Provider(String),
    #[error("API-Football rejected the request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("could not build the HTTP client: {0}")]
    Build(String),
}

/// Outcome of a single HTTP exchange, before the retry policy decides.
#[derive(Debug)]
pub(crate) enum AttemptError {
    RateLimitExceeded,
    Transient(String),
    Fatal(ClientError),
}
