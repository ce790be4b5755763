use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] crate::error::ExtractError),

    #[error("Failed to write output files: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Parsing completed but no output files were generated.")]
    NoOutput,
}
