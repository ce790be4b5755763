//! Shared utilities for ifcpipe integration tests.
//!
//! - `TestHarness`: isolated storage directories and a running service
//! - `IfcBuilder`: programmatic construction of small IFC models

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::TestHarness;
