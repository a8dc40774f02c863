use thiserror::Error;

pub type Result<T> = std::result::Result<T, NexusError>;

#[derive(Debug, Error)]
pub enum NexusError {
    #[error("Deal {deal} is not in stage {stage}")]
    DealNotInStage { deal: String, stage: String },

    #[error("Deal {deal} is already in stage {stage}; use reorder for same-stage moves")]
    SameStageMove { deal: String, stage: String },

    #[error("Index {index} out of bounds for stage {stage} with {len} deals")]
    IndexOutOfBounds {
        stage: String,
        index: usize,
        len: usize,
    },

    #[error("Stage order is inconsistent: {0}")]
    OrderInconsistent(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Checklist item {item} not found on task {task}")]
    ChecklistItemNotFound { task: String, item: String },

    #[error("Invalid record ID: {0}")]
    InvalidRecordId(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No async runtime available to run background sync")]
    RuntimeUnavailable,

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}
