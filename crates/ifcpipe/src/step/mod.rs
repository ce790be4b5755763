//! Reader for ISO 10303-21 ("STEP physical file") exchange files, the
//! clear-text encoding used by `.ifc` models.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::StepError;
pub use parser::{parse_file, parse_header_str, parse_str, read_header, Header, StepFile};
pub use value::{EntityInstance, Value};
