use std::path::PathBuf;

/// Everything the core can fail with. Missing checkpoints are not errors,
/// see `db::LoadOutcome::NotFound`.
#[derive(thiserror::Error, Debug)]
pub enum SnakeError {
    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checkpoint {path:?} is unreadable: {reason}")]
    CorruptCheckpoint { path: PathBuf, reason: String },
    #[error("network shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },
    #[error("no free cell left for food on a grid of {cells} cells")]
    GridFull { cells: usize },
    #[error("food at ({x}, {y}) overlaps the snake body")]
    FoodOnSnake { x: i32, y: i32 },
    #[error("non-finite value in {what}")]
    NonFinite { what: String },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl SnakeError {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        SnakeError::Io { operation: operation.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, SnakeError>;
