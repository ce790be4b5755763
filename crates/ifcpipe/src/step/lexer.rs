//! Tokenizer for the ISO 10303-21 clear-text encoding.

use super::error::StepError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(String),
    InstanceName(u64),
    String(String),
    Enum(String),
    Integer(i64),
    Real(f64),
    Binary(String),
    Dollar,
    Star,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Equals,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) -> Result<(), StepError> {
        loop {
            match self.peek_byte() {
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.peek_byte_at(1) == Some(b'*') => {
                    let start_line = self.line;
                    self.pos += 2;
                    loop {
                        match self.peek_byte() {
                            None => {
                                return Err(StepError::syntax(start_line, "unterminated comment"))
                            }
                            Some(b'*') if self.peek_byte_at(1) == Some(b'/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(b'\n') => {
                                self.line += 1;
                                self.pos += 1;
                            }
                            Some(_) => self.pos += 1,
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, StepError> {
        self.skip_trivia()?;
        let Some(b) = self.peek_byte() else {
            return Ok(None);
        };

        let token = match b {
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b',' => self.single(Token::Comma),
            b';' => self.single(Token::Semicolon),
            b'=' => self.single(Token::Equals),
            b'$' => self.single(Token::Dollar),
            b'*' => self.single(Token::Star),
            b'#' => self.instance_name()?,
            b'\'' => self.string()?,
            b'"' => self.binary()?,
            b'.' => self.enumeration()?,
            b'0'..=b'9' | b'+' | b'-' => self.number()?,
            b if b.is_ascii_alphabetic() || b == b'_' || b == b'!' => self.keyword(),
            other => {
                return Err(StepError::syntax(
                    self.line,
                    format!("unexpected character '{}'", other as char),
                ))
            }
        };

        Ok(Some(token))
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if !pred(b) {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn instance_name(&mut self) -> Result<Token, StepError> {
        self.pos += 1;
        let digits = self.take_while(|b| b.is_ascii_digit());
        digits
            .parse::<u64>()
            .map(Token::InstanceName)
            .map_err(|_| StepError::syntax(self.line, "invalid instance name"))
    }

    fn keyword(&mut self) -> Token {
        let word = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'!');
        Token::Keyword(word.to_string())
    }

    fn enumeration(&mut self) -> Result<Token, StepError> {
        self.pos += 1;
        let name = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        if self.peek_byte() != Some(b'.') {
            return Err(StepError::syntax(self.line, "unterminated enumeration"));
        }
        self.pos += 1;
        Ok(Token::Enum(name.to_string()))
    }

    fn binary(&mut self) -> Result<Token, StepError> {
        self.pos += 1;
        let hex = self.take_while(|b| b != b'"');
        if self.peek_byte() != Some(b'"') {
            return Err(StepError::syntax(self.line, "unterminated binary literal"));
        }
        self.pos += 1;
        Ok(Token::Binary(hex.to_string()))
    }

    fn string(&mut self) -> Result<Token, StepError> {
        let start_line = self.line;
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek_byte() {
                None => return Err(StepError::syntax(start_line, "unterminated string")),
                Some(b'\'') if self.peek_byte_at(1) == Some(b'\'') => self.pos += 2,
                Some(b'\'') => break,
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        let raw = &self.src[start..self.pos];
        self.pos += 1;
        Ok(Token::String(decode_string(raw)))
    }

    fn number(&mut self) -> Result<Token, StepError> {
        let start = self.pos;
        if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        self.take_while(|b| b.is_ascii_digit());
        let mut is_real = false;
        if self.peek_byte() == Some(b'.') {
            is_real = true;
            self.pos += 1;
            self.take_while(|b| b.is_ascii_digit());
        }
        if matches!(self.peek_byte(), Some(b'E') | Some(b'e')) {
            is_real = true;
            self.pos += 1;
            if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            self.take_while(|b| b.is_ascii_digit());
        }

        let text = &self.src[start..self.pos];
        if !is_real {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Token::Integer(i));
            }
        }
        text.parse::<f64>()
            .map(Token::Real)
            .map_err(|_| StepError::syntax(self.line, format!("invalid number '{}'", text)))
    }
}

/// Decodes the control directives of a STEP string body (quotes already stripped).
pub fn decode_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let rest = &raw[i..];

        if rest.starts_with("''") {
            out.push('\'');
            i += 2;
        } else if rest.starts_with("\\\\") {
            out.push('\\');
            i += 2;
        } else if let Some(body) = rest.strip_prefix("\\X2\\") {
            let (decoded, used) = decode_wide(body, 4);
            out.push_str(&decoded);
            i += 4 + used;
        } else if let Some(body) = rest.strip_prefix("\\X4\\") {
            let (decoded, used) = decode_wide(body, 8);
            out.push_str(&decoded);
            i += 4 + used;
        } else if let Some(hex) = rest.strip_prefix("\\X\\").and_then(|r| r.get(..2)) {
            match u8::from_str_radix(hex, 16) {
                Ok(byte) => {
                    out.push(byte as char);
                    i += 5;
                }
                Err(_) => {
                    out.push('\\');
                    i += 1;
                }
            }
        } else if let Some(c) = rest.strip_prefix("\\S\\").and_then(|r| r.chars().next()) {
            out.push(char::from_u32(c as u32 + 128).unwrap_or(c));
            i += 3 + c.len_utf8();
        } else if rest.starts_with("\\P") && rest.get(3..4) == Some("\\") {
            // code page switch, irrelevant once decoded to UTF-8
            i += 4;
        } else if let Some(c) = rest.chars().next() {
            out.push(c);
            i += c.len_utf8();
        } else {
            break;
        }
    }

    out
}

/// Decodes `\X2\` (UTF-16) or `\X4\` (UTF-32) hex groups up to the `\X0\` terminator.
/// Returns the decoded text and the number of bytes consumed, terminator included.
fn decode_wide(body: &str, width: usize) -> (String, usize) {
    let end = body.find("\\X0\\").unwrap_or(body.len());
    let hex = &body[..end];
    let consumed = (end + 4).min(body.len());

    let units: Vec<u32> = hex
        .as_bytes()
        .chunks(width)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|s| u32::from_str_radix(s, 16).ok())
        .collect();

    let decoded = if width == 4 {
        let utf16: Vec<u16> = units.iter().map(|u| *u as u16).collect();
        String::from_utf16_lossy(&utf16)
    } else {
        units
            .iter()
            .map(|u| char::from_u32(*u).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    };

    (decoded, consumed)
}
