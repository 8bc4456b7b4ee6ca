use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Payload encoding error: {0}")]
    PayloadError(#[from] serde_json::Error),

    #[error("Engine exited")]
    EngineExited,

    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Other(String),
}
