use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment value: {0}")]
    MissingEnv(String),

    #[error("invalid value for {name}: {details}")]
    InvalidValue { name: String, details: String },

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{backend} returned {status}: {details}")]
    BackendStatus {
        backend: String,
        status: String,
        details: String,
    },

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T, E = UpstreamError> = std::result::Result<T, E>;
