//! Parameter values and entity instances of a STEP data section.

/// A single parameter of an entity instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `$`: attribute not provided.
    Unset,
    /// `*`: value derived from a supertype.
    Derived,
    Integer(i64),
    Real(f64),
    String(String),
    /// Enumeration or logical literal, stored without the surrounding dots.
    Enum(String),
    /// Binary literal, kept as its hex text.
    Binary(String),
    /// `#n` reference to another instance.
    Ref(u64),
    List(Vec<Value>),
    /// Typed parameter such as `IFCLABEL('Basic Wall')`.
    Typed { type_name: String, value: Box<Value> },
}

impl Value {
    pub fn as_ref_id(&self) -> Option<u64> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// `.T.` / `.F.` as booleans; anything else is not a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Enum(e) if e == "T" => Some(true),
            Value::Enum(e) if e == "F" => Some(false),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset | Value::Derived)
    }

    /// Returns a non-empty string attribute, treating `$` and `''` as absent.
    pub fn as_non_empty_str(&self) -> Option<&str> {
        self.as_str().filter(|s| !s.is_empty())
    }

    /// Collects the reference ids of a list attribute, ignoring non-references.
    pub fn ref_ids(&self) -> Vec<u64> {
        match self {
            Value::List(items) => items.iter().filter_map(Value::as_ref_id).collect(),
            Value::Ref(id) => vec![*id],
            _ => Vec::new(),
        }
    }
}

/// One `#id = TYPE(args);` line of the data section.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInstance {
    pub id: u64,
    /// Entity name as written in the file (upper case for IFC exports).
    pub type_name: String,
    pub args: Vec<Value>,
}

impl EntityInstance {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.arg(index).and_then(Value::as_non_empty_str)
    }

    pub fn ref_arg(&self, index: usize) -> Option<u64> {
        self.arg(index).and_then(Value::as_ref_id)
    }

    pub fn ref_list_arg(&self, index: usize) -> Vec<u64> {
        self.arg(index).map(Value::ref_ids).unwrap_or_default()
    }
}
