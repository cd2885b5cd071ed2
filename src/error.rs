use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Stored record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported history store type: {0}")]
    UnsupportedType(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Invalid LLM type: '{0}'")]
    InvalidType(String),
    #[error("{0} API key is required")]
    MissingApiKey(&'static str),
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API key is not configured")]
    MissingApiKey,
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password required")]
    MissingFields,
    #[error("User already exists")]
    UserExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Token expiry out of range")]
    TokenExpiry,
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Password hashing task failed: {0}")]
    HashTask(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Message and userId required.")]
    Validation,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}
