/// Failures that abort one pipeline run
///
/// Provider failures are not here: they downgrade to an empty suggestion list
/// and a status change instead of aborting.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no capture region selected")]
    NoRegion,

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("recognizer returned no letters")]
    EmptyRecognition,

    #[error("typing failed: {0}")]
    Emission(String),

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Recognition problems end the cycle without touching suggestions
    pub fn is_recognition_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::Capture(_)
                | PipelineError::Recognition(_)
                | PipelineError::EmptyRecognition
        )
    }
}
