//! Property extraction: one row per (element, property set, property).

pub mod table;

use std::path::Path;

use tracing::{debug, info_span, warn};

use crate::error::ExtractError;
use crate::model::schema::{self, attr};
use crate::model::IfcModel;
use crate::sanitize;
use crate::step::EntityInstance;

pub use table::{PropertyRecord, PropertyTable, PropertyValue, COLUMNS};

const UNKNOWN: &str = "Unknown";

/// Source of property tables. The cache's fresh tier goes through this seam.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<PropertyTable, ExtractError>;
}

/// Extractor reading `.ifc` files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct IfcExtractor;

impl Extractor for IfcExtractor {
    fn extract(&self, path: &Path) -> Result<PropertyTable, ExtractError> {
        extract_properties(path)
    }
}

/// Opens the model at `path` and extracts its property table.
pub fn extract_properties(path: &Path) -> Result<PropertyTable, ExtractError> {
    let span = info_span!("extract", file = %sanitize::redact_path(path));
    let _enter = span.enter();

    let model = IfcModel::open(path).map_err(|source| ExtractError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let table = properties_from_model(&model);
    debug!(
        rows = table.len(),
        elements = table.element_count(),
        "Extracted properties"
    );
    Ok(table)
}

pub fn properties_from_model(model: &IfcModel) -> PropertyTable {
    let file_name = model
        .header()
        .file_name
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let mut table = PropertyTable::new();

    for element in model.by_type(schema::IFC_ELEMENT) {
        let entity = model.type_of(element).to_string();
        let name = element.str_arg(attr::NAME).map(str::to_string);
        let global_id = element.str_arg(attr::GLOBAL_ID).map(str::to_string);

        for rel in model.is_defined_by(element.id) {
            let Some(pset) = rel
                .ref_arg(attr::DEFINES_RELATING_PROPERTY_DEFINITION)
                .and_then(|id| model.get(id))
                .filter(|def| schema::is_subtype_of(&def.type_name, schema::IFC_PROPERTY_SET))
            else {
                continue;
            };
            let pset_name = pset.str_arg(attr::NAME).unwrap_or(UNKNOWN).to_string();

            for prop_id in pset.ref_list_arg(attr::PSET_HAS_PROPERTIES) {
                let Some(prop) = model.get(prop_id) else {
                    warn!(property = prop_id, pset = pset.id, "Property set references a missing property");
                    continue;
                };

                table.push(PropertyRecord {
                    file_name: file_name.clone(),
                    entity: entity.clone(),
                    name: name.clone(),
                    global_id: global_id.clone(),
                    property_set: pset_name.clone(),
                    property_name: prop.str_arg(attr::PROPERTY_NAME).unwrap_or(UNKNOWN).to_string(),
                    value: nominal_value(prop),
                });
            }
        }
    }

    table
}

fn nominal_value(prop: &EntityInstance) -> PropertyValue {
    if !schema::is_subtype_of(&prop.type_name, schema::IFC_PROPERTY_SINGLE_VALUE) {
        return PropertyValue::Null;
    }
    prop.arg(attr::PROPERTY_NOMINAL_VALUE)
        .map(PropertyValue::from_nominal)
        .unwrap_or(PropertyValue::Null)
}
