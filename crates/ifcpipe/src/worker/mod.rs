pub mod job;
pub mod pool;

pub use job::{JobResult, ParseJob};
pub use pool::ParseWorkerPool;
