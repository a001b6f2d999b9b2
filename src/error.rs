use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Libloading error: {0}")]
    Libloading(#[from] libloading::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Script error: {0}")]
    Script(String),
    #[error("Document error: {0}")]
    Document(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl EngineError {
    pub fn http(msg: impl Into<String>) -> Self {
        EngineError::Http(msg.into())
    }

    pub fn script(msg: impl Into<String>) -> Self {
        EngineError::Script(msg.into())
    }

    pub fn document(msg: impl Into<String>) -> Self {
        EngineError::Document(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        EngineError::InvalidArgument(msg.into())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Http(err.to_string())
    }
}
