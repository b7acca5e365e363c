use thiserror::Error;

/// Custom error types for the volsurface-rs library
#[derive(Error, Debug)]
pub enum SurfaceError {

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Data fetch error: {0}")]
    FetchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Refresh superseded by a newer request")]
    Superseded,

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SurfaceError>;
