use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StepError {
    #[error("Failed to read model file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not an ISO-10303-21 file (missing signature)")]
    MissingSignature,

    #[error("Missing {0} section")]
    MissingSection(&'static str),

    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Duplicate instance id #{0}")]
    DuplicateInstance(u64),
}

impl StepError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        StepError::Syntax {
            line,
            message: message.into(),
        }
    }
}
