use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timeout after {0}ms")]
    Timeout(u64),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("all {0} relays failed")]
    CascadeExhausted(usize),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GuardError>;
