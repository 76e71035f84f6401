use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::StageFatal;

/// Task tree execution failure.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("unknown task `{0}`")]
    Unknown(String),

    #[error("task `{0}` is already declared")]
    Duplicate(String),

    #[error(transparent)]
    Stage(#[from] StageFatal),

    #[error("cannot clean {}: {source}", path.display())]
    Clean {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("step {step} failed: {source}")]
    SequenceAbort {
        step: usize,
        source: Box<TaskError>,
    },

    #[error("{} parallel task(s) failed: {}", .0.len(), summarize(.0))]
    ParallelFailure(Vec<TaskError>),
}

impl TaskError {
    /// Whether this failure means the filesystem itself is unusable.
    /// Fatal errors end a watch session; everything else is reported
    /// and the session keeps running.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Stage(_) | Self::Clean { .. } => true,
            Self::SequenceAbort { source, .. } => source.is_fatal(),
            Self::ParallelFailure(errors) => errors.iter().any(TaskError::is_fatal),
            Self::Unknown(_) | Self::Duplicate(_) => false,
        }
    }
}

fn summarize(errors: &[TaskError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
