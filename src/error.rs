use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrugError {
    #[error("failed to download NDC file: {0}")]
    Download(String),

    #[error("failed to parse NDC file: {0}")]
    Parse(String),

    #[error("RxNav request failed: {0}")]
    Upstream(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DrugError {
    /// Errors that must stop the process before any tool is served
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, DrugError::Download(_) | DrugError::Parse(_) | DrugError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, DrugError>;
