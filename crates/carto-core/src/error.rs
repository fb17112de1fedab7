/// Unified error type for carto.
#[derive(Debug, thiserror::Error)]
pub enum CartoError {
    #[error("Invalid path {path:?}: not inside the project root")]
    InvalidPath { path: String },

    #[error("Failed to parse file: {path}")]
    Parse { path: String },

    #[error("Server is not initialized")]
    NotInitialized,

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
