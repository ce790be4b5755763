pub mod artifacts;
pub mod csv;
pub mod filesystem;

pub use artifacts::{ArtifactPaths, ArtifactWriter};
pub use filesystem::FileStorage;
