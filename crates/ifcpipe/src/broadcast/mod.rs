//! Broadcasting of task state changes to any number of listeners.

pub mod task_events;

pub use task_events::{TaskEvent, TaskEventBroadcaster};
