use std::fmt;

use serde::{Deserialize, Serialize};

use crate::step::Value;

/// Column headers of the flat export, in order.
pub const COLUMNS: [&str; 7] = [
    "FileName",
    "IFC_Entity",
    "IFC_Name",
    "IFC_GlobalId",
    "PropertySet",
    "PropertyName",
    "PropertyValue",
];

/// Scalar value of a property. Serialized as the bare JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl PropertyValue {
    /// Converts a `NominalValue` attribute. Typed wrappers such as
    /// `IFCLABEL('x')` are unwrapped, nested wrappers one level further.
    pub fn from_nominal(value: &Value) -> Self {
        match value {
            Value::Typed { value, .. } => match value.as_ref() {
                Value::Typed { value: inner, .. } => Self::from_primitive(inner),
                other => Self::from_primitive(other),
            },
            other => Self::from_primitive(other),
        }
    }

    fn from_primitive(value: &Value) -> Self {
        match value {
            Value::String(s) => PropertyValue::Text(s.clone()),
            Value::Integer(i) => PropertyValue::Int(*i),
            Value::Real(r) if r.is_finite() => PropertyValue::Real(*r),
            // JSON has no encoding for these; keep them readable and stable
            Value::Real(r) => PropertyValue::Text(r.to_string()),
            Value::Enum(e) => match value.as_bool() {
                Some(b) => PropertyValue::Bool(b),
                None if e == "U" => PropertyValue::Text("UNKNOWN".to_string()),
                None => PropertyValue::Text(e.clone()),
            },
            Value::Binary(hex) => PropertyValue::Text(hex.clone()),
            _ => PropertyValue::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => Ok(()),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Real(r) => write!(f, "{}", r),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

/// One (element, property set, property) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "IFC_Entity")]
    pub entity: String,
    #[serde(rename = "IFC_Name")]
    pub name: Option<String>,
    #[serde(rename = "IFC_GlobalId")]
    pub global_id: Option<String>,
    #[serde(rename = "PropertySet")]
    pub property_set: String,
    #[serde(rename = "PropertyName")]
    pub property_name: String,
    #[serde(rename = "PropertyValue")]
    pub value: PropertyValue,
}

impl PropertyRecord {
    /// Cells in [`COLUMNS`] order, for flat writers.
    pub fn cells(&self) -> [String; 7] {
        [
            self.file_name.clone(),
            self.entity.clone(),
            self.name.clone().unwrap_or_default(),
            self.global_id.clone().unwrap_or_default(),
            self.property_set.clone(),
            self.property_name.clone(),
            self.value.to_string(),
        ]
    }
}

/// Rows extracted from one model, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyTable {
    rows: Vec<PropertyRecord>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PropertyRecord) {
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PropertyRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyRecord> {
        self.rows.iter()
    }

    /// Number of distinct elements (by global id) contributing rows.
    pub fn element_count(&self) -> usize {
        let mut ids: Vec<_> = self.rows.iter().map(|r| r.global_id.as_deref()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

impl From<Vec<PropertyRecord>> for PropertyTable {
    fn from(rows: Vec<PropertyRecord>) -> Self {
        Self { rows }
    }
}

impl IntoIterator for PropertyTable {
    type Item = PropertyRecord;
    type IntoIter = std::vec::IntoIter<PropertyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertyTable {
    type Item = &'a PropertyRecord;
    type IntoIter = std::slice::Iter<'a, PropertyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
