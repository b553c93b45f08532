use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::views::ViewError;

/// Failures a pipeline run can end with
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store failure: {0}")]
    Store(#[from] DatabaseError),

    #[error("Render failure: {0}")]
    Render(#[from] ViewError),
}

impl PipelineError {
    pub fn not_found(message: impl Into<String>) -> Self {
        PipelineError::NotFound(message.into())
    }
}
