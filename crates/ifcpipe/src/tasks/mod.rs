//! File records and the per-file parse state machine.

pub mod registry;
pub mod state;

pub use registry::{FileRecord, FileRegistry, TaskStatus};
pub use state::{ParsingTask, TaskState};
