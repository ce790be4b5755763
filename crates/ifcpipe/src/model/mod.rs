//! Typed view over a parsed IFC exchange file.

pub mod metadata;
pub mod schema;

use std::collections::HashMap;
use std::path::Path;

use crate::step::{self, EntityInstance, Header, StepError, StepFile};

pub use metadata::{extract_metadata, ModelMetadata};
use schema::attr;

/// An opened IFC model with its instances and the inverse indexes used by
/// the extractor.
#[derive(Debug)]
pub struct IfcModel {
    file: StepFile,
    /// Object id -> ids of the `IfcRelDefinesByProperties` naming it.
    defined_by: HashMap<u64, Vec<u64>>,
}

impl IfcModel {
    pub fn open(path: &Path) -> Result<Self, StepError> {
        step::parse_file(path).map(Self::from_step)
    }

    pub fn from_step(file: StepFile) -> Self {
        let mut defined_by: HashMap<u64, Vec<u64>> = HashMap::new();
        for inst in file.instances.values() {
            if !schema::is_subtype_of(&inst.type_name, schema::IFC_REL_DEFINES_BY_PROPERTIES) {
                continue;
            }
            for object in inst.ref_list_arg(attr::DEFINES_RELATED_OBJECTS) {
                defined_by.entry(object).or_default().push(inst.id);
            }
        }

        Self { file, defined_by }
    }

    pub fn header(&self) -> &Header {
        &self.file.header
    }

    /// Schema identifier from the header, e.g. `IFC4`.
    pub fn schema(&self) -> Option<&str> {
        self.file.header.schemas.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.file.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.instances.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&EntityInstance> {
        self.file.instances.get(&id)
    }

    /// All instances of `entity` or its subtypes, in id order.
    pub fn by_type<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a EntityInstance> + 'a {
        self.file
            .instances
            .values()
            .filter(move |inst| schema::is_subtype_of(&inst.type_name, entity))
    }

    /// True when instance `id` exists and is of type `entity` or a subtype.
    pub fn is_a(&self, id: u64, entity: &str) -> bool {
        self.get(id)
            .map(|inst| schema::is_subtype_of(&inst.type_name, entity))
            .unwrap_or(false)
    }

    /// Canonical entity name of an instance (`IfcWallStandardCase`).
    pub fn type_of<'a>(&self, inst: &'a EntityInstance) -> &'a str {
        schema::canonical_name(&inst.type_name)
    }

    /// Relationships that attach property definitions to object `id`.
    pub fn is_defined_by(&self, id: u64) -> impl Iterator<Item = &EntityInstance> + '_ {
        self.defined_by
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |rel| self.get(*rel))
    }
}
