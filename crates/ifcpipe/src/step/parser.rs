use std::collections::BTreeMap;
use std::io::{BufRead, Read};
use std::path::Path;

use super::error::StepError;
use super::lexer::{Lexer, Token};
use super::value::{EntityInstance, Value};

const SIGNATURE: &str = "ISO-10303-21";
const END_SIGNATURE: &str = "END-ISO-10303-21";

/// Deepest parameter list nesting accepted before the file is rejected.
pub const MAX_NESTING: usize = 256;

/// Upper bound on bytes read by [`read_header`].
const MAX_HEADER_BYTES: usize = 1 << 20;

/// Contents of the HEADER section relevant to model metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub description: Vec<String>,
    pub file_name: Option<String>,
    pub time_stamp: Option<String>,
    pub preprocessor_version: Option<String>,
    pub originating_system: Option<String>,
    pub schemas: Vec<String>,
}

/// A fully parsed exchange file.
#[derive(Debug, Default)]
pub struct StepFile {
    pub header: Header,
    /// Instances keyed by id; iteration follows id order.
    pub instances: BTreeMap<u64, EntityInstance>,
    /// Complex (multi-type) instances, which are not represented in `instances`.
    pub skipped_complex: usize,
}

pub fn parse_file(path: &Path) -> Result<StepFile, StepError> {
    let bytes = std::fs::read(path).map_err(|e| StepError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_str(&String::from_utf8_lossy(&bytes))
}

pub fn parse_str(text: &str) -> Result<StepFile, StepError> {
    let mut parser = Parser::new(text);
    parser.signature()?;
    let header = parser.header_section()?;
    let mut file = StepFile {
        header,
        ..Default::default()
    };
    parser.data_sections(&mut file)?;
    Ok(file)
}

/// Reads only the HEADER section, stopping before the data section is loaded.
pub fn read_header(path: &Path) -> Result<Header, StepError> {
    let read_err = |e| StepError::Read {
        path: path.to_path_buf(),
        source: e,
    };
    let file = std::fs::File::open(path).map_err(read_err)?;
    let mut reader = std::io::BufReader::new(file).take(MAX_HEADER_BYTES as u64);

    let mut bytes = Vec::new();
    let mut complete = false;
    loop {
        let start = bytes.len();
        let n = reader.read_until(b'\n', &mut bytes).map_err(read_err)?;
        if n == 0 {
            break;
        }
        if contains(&bytes[start..], ENDSEC) {
            complete = true;
            break;
        }
    }
    if !complete && bytes.len() >= MAX_HEADER_BYTES {
        return Err(StepError::syntax(
            0,
            format!("header section exceeds {} bytes", MAX_HEADER_BYTES),
        ));
    }

    parse_header_str(&String::from_utf8_lossy(&bytes))
}

const ENDSEC: &[u8] = b"ENDSEC";

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

pub fn parse_header_str(text: &str) -> Result<Header, StepError> {
    let mut parser = Parser::new(text);
    parser.signature()?;
    parser.header_section()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lexer: Lexer::new(text),
            peeked: None,
        }
    }

    fn line(&self) -> usize {
        self.lexer.line()
    }

    fn peek(&mut self) -> Result<Option<&Token>, StepError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn next(&mut self) -> Result<Token, StepError> {
        let token = match self.peeked.take() {
            Some(t) => Some(t),
            None => self.lexer.next_token()?,
        };
        token.ok_or_else(|| StepError::syntax(self.line(), "unexpected end of file"))
    }

    fn expect(&mut self, want: Token) -> Result<(), StepError> {
        let got = self.next()?;
        if got == want {
            Ok(())
        } else {
            Err(StepError::syntax(
                self.line(),
                format!("expected {:?}, found {:?}", want, got),
            ))
        }
    }

    fn keyword(&mut self) -> Result<String, StepError> {
        match self.next()? {
            Token::Keyword(k) => Ok(k),
            other => Err(StepError::syntax(
                self.line(),
                format!("expected keyword, found {:?}", other),
            )),
        }
    }

    fn signature(&mut self) -> Result<(), StepError> {
        match self.peek()? {
            Some(Token::Keyword(k)) if k == SIGNATURE => {}
            _ => return Err(StepError::MissingSignature),
        }
        self.next()?;
        self.expect(Token::Semicolon)
    }

    fn header_section(&mut self) -> Result<Header, StepError> {
        match self.peek()? {
            Some(Token::Keyword(k)) if k == "HEADER" => {}
            _ => return Err(StepError::MissingSection("HEADER")),
        }
        self.next()?;
        self.expect(Token::Semicolon)?;

        let mut header = Header::default();
        loop {
            let name = self.keyword()?;
            if name == "ENDSEC" {
                self.expect(Token::Semicolon)?;
                return Ok(header);
            }
            let params = self.params()?;
            self.expect(Token::Semicolon)?;
            apply_header_entity(&mut header, &name, &params);
        }
    }

    fn data_sections(&mut self, file: &mut StepFile) -> Result<(), StepError> {
        let mut saw_data = false;
        loop {
            let section = match self.peek()?.cloned() {
                None => break,
                Some(Token::Keyword(k)) => k,
                Some(other) => {
                    return Err(StepError::syntax(
                        self.line(),
                        format!("expected section keyword, found {:?}", other),
                    ))
                }
            };
            self.next()?;

            match section.as_str() {
                END_SIGNATURE => {
                    if self.peek()? == Some(&Token::Semicolon) {
                        self.next()?;
                    }
                    break;
                }
                "DATA" => {
                    saw_data = true;
                    if self.peek()? == Some(&Token::LParen) {
                        self.params()?;
                    }
                    self.expect(Token::Semicolon)?;
                    self.data_body(file)?;
                }
                _ => {
                    // ANCHOR, REFERENCE and SIGNATURE sections carry nothing we read
                    self.skip_to_endsec()?;
                }
            }
        }

        if saw_data {
            Ok(())
        } else {
            Err(StepError::MissingSection("DATA"))
        }
    }

    fn data_body(&mut self, file: &mut StepFile) -> Result<(), StepError> {
        loop {
            match self.next()? {
                Token::Keyword(k) if k == "ENDSEC" => {
                    self.expect(Token::Semicolon)?;
                    return Ok(());
                }
                Token::InstanceName(id) => {
                    self.expect(Token::Equals)?;
                    if self.peek()? == Some(&Token::LParen) {
                        self.skip_group()?;
                        self.expect(Token::Semicolon)?;
                        file.skipped_complex += 1;
                        tracing::debug!(id, "skipping complex entity instance");
                        continue;
                    }
                    let type_name = self.keyword()?;
                    let args = self.params()?;
                    self.expect(Token::Semicolon)?;
                    if file.instances.contains_key(&id) {
                        return Err(StepError::DuplicateInstance(id));
                    }
                    file.instances.insert(
                        id,
                        EntityInstance {
                            id,
                            type_name,
                            args,
                        },
                    );
                }
                other => {
                    return Err(StepError::syntax(
                        self.line(),
                        format!("expected instance name, found {:?}", other),
                    ))
                }
            }
        }
    }

    fn skip_to_endsec(&mut self) -> Result<(), StepError> {
        loop {
            if let Token::Keyword(k) = self.next()? {
                if k == "ENDSEC" {
                    return self.expect(Token::Semicolon);
                }
            }
        }
    }

    fn skip_group(&mut self) -> Result<(), StepError> {
        self.expect(Token::LParen)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Parses `( v, v, ... )`.
    fn params(&mut self) -> Result<Vec<Value>, StepError> {
        self.nested_params(0)
    }

    fn nested_params(&mut self, depth: usize) -> Result<Vec<Value>, StepError> {
        if depth >= MAX_NESTING {
            return Err(StepError::syntax(
                self.line(),
                format!("parameters nested deeper than {}", MAX_NESTING),
            ));
        }
        self.expect(Token::LParen)?;
        let mut values = Vec::new();
        if self.peek()? == Some(&Token::RParen) {
            self.next()?;
            return Ok(values);
        }
        loop {
            values.push(self.value(depth)?);
            match self.next()? {
                Token::Comma => continue,
                Token::RParen => return Ok(values),
                other => {
                    return Err(StepError::syntax(
                        self.line(),
                        format!("expected ',' or ')', found {:?}", other),
                    ))
                }
            }
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, StepError> {
        if self.peek()? == Some(&Token::LParen) {
            return self.nested_params(depth + 1).map(Value::List);
        }
        let value = match self.next()? {
            Token::Dollar => Value::Unset,
            Token::Star => Value::Derived,
            Token::Integer(i) => Value::Integer(i),
            Token::Real(r) => Value::Real(r),
            Token::String(s) => Value::String(s),
            Token::Enum(e) => Value::Enum(e),
            Token::Binary(b) => Value::Binary(b),
            Token::InstanceName(id) => Value::Ref(id),
            Token::Keyword(type_name) => {
                let mut inner = self.nested_params(depth + 1)?;
                let value = if inner.len() == 1 {
                    inner.remove(0)
                } else {
                    Value::List(inner)
                };
                Value::Typed {
                    type_name,
                    value: Box::new(value),
                }
            }
            other => {
                return Err(StepError::syntax(
                    self.line(),
                    format!("unexpected token {:?}", other),
                ))
            }
        };
        Ok(value)
    }
}

fn apply_header_entity(header: &mut Header, name: &str, params: &[Value]) {
    let strings = |v: Option<&Value>| -> Vec<String> {
        v.and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };
    let text = |v: Option<&Value>| v.and_then(Value::as_non_empty_str).map(str::to_string);

    match name {
        "FILE_DESCRIPTION" => header.description = strings(params.first()),
        "FILE_NAME" => {
            header.file_name = text(params.first());
            header.time_stamp = text(params.get(1));
            header.preprocessor_version = text(params.get(4));
            header.originating_system = text(params.get(5));
        }
        "FILE_SCHEMA" => header.schemas = strings(params.first()),
        _ => {}
    }
}
