use std::path::Path;

use serde::{Deserialize, Serialize};

use super::schema::{self, attr};
use super::IfcModel;
use crate::step::{self, Header, StepError};

pub const UNKNOWN: &str = "Unknown";

/// Declared schema and authoring information of a model file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    /// Name recorded in the header `FILE_NAME`, which may differ from the
    /// name the file was uploaded under.
    pub file_name: Option<String>,
    pub schema: String,
    pub authoring_software: String,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            file_name: None,
            schema: UNKNOWN.to_string(),
            authoring_software: UNKNOWN.to_string(),
        }
    }
}

impl ModelMetadata {
    pub fn from_header(header: &Header) -> Self {
        Self {
            file_name: header.file_name.clone().filter(|s| !s.is_empty()),
            schema: header
                .schemas
                .first()
                .cloned()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            authoring_software: header
                .originating_system
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    /// Like [`ModelMetadata::from_header`], falling back to the first
    /// `IfcApplication` when the header names no originating system.
    pub fn from_model(model: &IfcModel) -> Self {
        let mut metadata = Self::from_header(model.header());
        if metadata.authoring_software == UNKNOWN {
            if let Some(app) = model
                .by_type(schema::IFC_APPLICATION)
                .find_map(|inst| inst.str_arg(attr::APPLICATION_FULL_NAME))
            {
                metadata.authoring_software = app.to_string();
            }
        }
        metadata
    }
}

/// Reads metadata from the header section only, without loading instances.
pub fn extract_metadata(path: &Path) -> Result<ModelMetadata, StepError> {
    step::read_header(path).map(|h| ModelMetadata::from_header(&h))
}
