pub mod batch;
pub mod broadcast;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod sanitize;
pub mod service;
pub mod step;
pub mod storage;
pub mod tasks;
pub mod worker;

pub use batch::{BatchCoordinator, CombinedTable, EntityCounts, DEFAULT_CONCURRENCY};
pub use broadcast::{TaskEvent, TaskEventBroadcaster};
pub use cache::CacheManager;
pub use config::{load_config, Config};
pub use error::{
    ConfigError, ExtractError, IfcPipeError, Result, StorageError, TaskError, WorkerError,
};
pub use extract::{extract_properties, Extractor, IfcExtractor, PropertyRecord, PropertyTable};
pub use graph::{GraphBuild, GraphModel, RelationKind};
pub use model::{extract_metadata, IfcModel, ModelMetadata};
pub use report::write_csv_report;
pub use service::IfcPipe;
pub use tasks::{FileRecord, TaskState, TaskStatus};
