use std::path::PathBuf;
use thiserror::Error;

use crate::step::StepError;
use crate::tasks::TaskState;

#[derive(Error, Debug)]
pub enum IfcPipeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to open model '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: StepError,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Parse queue is full")]
    QueueFull,
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File '{id}' is not ready (state: {state})")]
    NotCompleted { id: String, state: TaskState },

    #[error("Invalid transition for '{id}': {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: TaskState,
        to: TaskState,
    },

    #[error("Timed out waiting for '{0}'")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, IfcPipeError>;
