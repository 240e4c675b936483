use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaneError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    #[error("Agent execution failed: {0}")]
    Agent(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workspace not initialized. Run 'worklane init' first.")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LaneError>;

impl From<rusqlite::Error> for LaneError {
    fn from(err: rusqlite::Error) -> Self {
        LaneError::Store(err.to_string())
    }
}
