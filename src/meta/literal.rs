//! Restricted-grammar reader for literal descriptors
//!
//! A literal descriptor is a sequence of top-level bindings such as
//!
//! ```text
//! ServiceMeta = {
//!     "name": "PlayerService",
//!     "sources": ["../Sources/PlayerServiceMain.cpp"],
//!     "output": "PlayerServiceMain"
//! }
//! ```
//!
//! Only literals are accepted: strings, numbers, `True`/`False`/`None`, lists, tuples and
//! string-keyed mappings. `import`/`from` lines are skipped. Anything that would need
//! evaluation (names, calls, operators, comprehensions) is rejected with a positioned
//! error. The file is never executed.

use thiserror::Error;

use super::DescriptorParser;
use crate::error::BuildError;
use crate::model::{OutputKind, UnitSpec};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct LiteralParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    List(Vec<LiteralValue>),
    /// Keys in declaration order
    Dict(Vec<(String, LiteralValue)>),
}

impl LiteralValue {
    fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Str(_) => "string",
            LiteralValue::Int(_) => "integer",
            LiteralValue::Float(_) => "float",
            LiteralValue::Bool(_) => "bool",
            LiteralValue::None => "None",
            LiteralValue::List(_) => "list",
            LiteralValue::Dict(_) => "mapping",
        }
    }

    pub fn get(&self, key: &str) -> Option<&LiteralValue> {
        match self {
            LiteralValue::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: LiteralValue,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Comma,
    Equals,
    Minus,
    Other(char),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> LiteralParseError {
        LiteralParseError {
            line,
            column,
            message: message.into(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LiteralParseError> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.chars.peek() {
            let (line, column) = (self.line, self.column);

            if c.is_whitespace() || c == '\\' {
                self.bump();
                continue;
            }
            if c == '#' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
                continue;
            }

            let kind = match c {
                '"' | '\'' => TokenKind::Str(self.string(c)?),
                '0'..='9' => self.number()?,
                c if c.is_alphabetic() || c == '_' => {
                    let mut ident = String::new();
                    while let Some(&c) = self.chars.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            ident.push(c);
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    TokenKind::Ident(ident)
                }
                _ => {
                    self.bump();
                    match c {
                        '{' => TokenKind::LBrace,
                        '}' => TokenKind::RBrace,
                        '[' => TokenKind::LBracket,
                        ']' => TokenKind::RBracket,
                        '(' => TokenKind::LParen,
                        ')' => TokenKind::RParen,
                        ':' => TokenKind::Colon,
                        ',' => TokenKind::Comma,
                        '=' => TokenKind::Equals,
                        '-' => TokenKind::Minus,
                        other => TokenKind::Other(other),
                    }
                }
            };

            tokens.push(Token { kind, line, column });
        }

        Ok(tokens)
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralParseError> {
        let (line, column) = (self.line, self.column);
        self.bump();

        // Triple-quoted strings
        let mut triple = false;
        if self.chars.peek() == Some(&quote) {
            self.bump();
            if self.chars.peek() == Some(&quote) {
                self.bump();
                triple = true;
            } else {
                return Ok(String::new());
            }
        }

        let mut value = String::new();
        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error(line, column, "unterminated string literal"))?;

            if c == quote {
                if !triple {
                    return Ok(value);
                }
                if self.chars.peek() == Some(&quote) {
                    self.bump();
                    if self.chars.peek() == Some(&quote) {
                        self.bump();
                        return Ok(value);
                    }
                    value.push(quote);
                }
                value.push(quote);
                continue;
            }

            if c == '\n' && !triple {
                return Err(self.error(line, column, "unterminated string literal"));
            }

            if c == '\\' {
                let escaped = self
                    .bump()
                    .ok_or_else(|| self.error(line, column, "unterminated string literal"))?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\n' => {}
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
                continue;
            }

            value.push(c);
        }
    }

    fn number(&mut self) -> Result<TokenKind, LiteralParseError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                if c != '_' {
                    text.push(c);
                }
                self.bump();
            } else {
                break;
            }
        }

        if let Ok(i) = text.parse::<i64>() {
            Ok(TokenKind::Int(i))
        } else if let Ok(f) = text.parse::<f64>() {
            Ok(TokenKind::Float(f))
        } else {
            Err(self.error(line, column, format!("invalid number '{}'", text)))
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    last_line: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if let Some(t) = &token {
            self.last_line = t.line;
            self.pos += 1;
        }
        token
    }

    fn error_at(token: &Token, message: impl Into<String>) -> LiteralParseError {
        LiteralParseError {
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }

    fn eof_error(&self, message: &str) -> LiteralParseError {
        LiteralParseError {
            line: self.last_line,
            column: 0,
            message: format!("unexpected end of file, {}", message),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), LiteralParseError> {
        match self.next() {
            Some(t) if t.kind == kind => Ok(()),
            Some(t) => Err(Self::error_at(&t, format!("expected {}", what))),
            None => Err(self.eof_error(&format!("expected {}", what))),
        }
    }

    fn module(&mut self) -> Result<Vec<Binding>, LiteralParseError> {
        let mut bindings = Vec::new();

        while let Some(token) = self.next() {
            match &token.kind {
                TokenKind::Ident(word) if word == "import" || word == "from" => {
                    while self.peek().map(|t| t.line == token.line).unwrap_or(false) {
                        self.next();
                    }
                }
                TokenKind::Ident(name) => {
                    let name = name.clone();
                    match self.next() {
                        Some(t) if t.kind == TokenKind::Equals => {}
                        Some(t) => {
                            return Err(Self::error_at(
                                &t,
                                format!("only literal assignments are allowed after '{}'", name),
                            ))
                        }
                        None => return Err(self.eof_error("expected '='")),
                    }
                    let value = self.value()?;
                    bindings.push(Binding {
                        name,
                        value,
                        line: token.line,
                    });
                }
                _ => return Err(Self::error_at(&token, "expected a top-level assignment")),
            }
        }

        Ok(bindings)
    }

    fn value(&mut self) -> Result<LiteralValue, LiteralParseError> {
        let token = self.next().ok_or_else(|| self.eof_error("expected a value"))?;

        match token.kind {
            TokenKind::Str(mut s) => {
                // Adjacent string literals concatenate
                while let Some(Token {
                    kind: TokenKind::Str(next),
                    ..
                }) = self.peek()
                {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok(LiteralValue::Str(s))
            }
            TokenKind::Int(i) => Ok(LiteralValue::Int(i)),
            TokenKind::Float(f) => Ok(LiteralValue::Float(f)),
            TokenKind::Minus => match self.next() {
                Some(Token {
                    kind: TokenKind::Int(i),
                    ..
                }) => Ok(LiteralValue::Int(-i)),
                Some(Token {
                    kind: TokenKind::Float(f),
                    ..
                }) => Ok(LiteralValue::Float(-f)),
                _ => Err(Self::error_at(&token, "'-' must precede a number")),
            },
            TokenKind::Ident(ref word) => match word.as_str() {
                "True" => Ok(LiteralValue::Bool(true)),
                "False" => Ok(LiteralValue::Bool(false)),
                "None" => Ok(LiteralValue::None),
                other => Err(Self::error_at(
                    &token,
                    format!("dynamic construct '{}' is not allowed", other),
                )),
            },
            TokenKind::LBracket => {
                Ok(LiteralValue::List(self.sequence(TokenKind::RBracket, "']'")?))
            }
            TokenKind::LParen => Ok(LiteralValue::List(self.sequence(TokenKind::RParen, "')'")?)),
            TokenKind::LBrace => self.mapping(),
            _ => Err(Self::error_at(&token, "expected a literal value")),
        }
    }

    fn sequence(
        &mut self,
        close: TokenKind,
        what: &str,
    ) -> Result<Vec<LiteralValue>, LiteralParseError> {
        let mut items = Vec::new();
        loop {
            if self.peek().map(|t| t.kind == close).unwrap_or(false) {
                self.next();
                return Ok(items);
            }
            items.push(self.value()?);
            match self.next() {
                Some(t) if t.kind == TokenKind::Comma => {}
                Some(t) if t.kind == close => return Ok(items),
                Some(t) => return Err(Self::error_at(&t, format!("expected ',' or {}", what))),
                None => return Err(self.eof_error(&format!("expected {}", what))),
            }
        }
    }

    fn mapping(&mut self) -> Result<LiteralValue, LiteralParseError> {
        let mut entries: Vec<(String, LiteralValue)> = Vec::new();
        loop {
            let key_token = self.next().ok_or_else(|| self.eof_error("expected '}'"))?;
            let key = match key_token.kind {
                TokenKind::RBrace => return Ok(LiteralValue::Dict(entries)),
                TokenKind::Str(ref s) => s.clone(),
                _ => return Err(Self::error_at(&key_token, "mapping keys must be strings")),
            };
            self.expect(TokenKind::Colon, "':'")?;
            let value = self.value()?;

            // Later duplicates replace earlier ones, keeping the first position
            if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = value;
            } else {
                entries.push((key, value));
            }

            match self.next() {
                Some(t) if t.kind == TokenKind::Comma => {}
                Some(t) if t.kind == TokenKind::RBrace => return Ok(LiteralValue::Dict(entries)),
                Some(t) => return Err(Self::error_at(&t, "expected ',' or '}'")),
                None => return Err(self.eof_error("expected '}'")),
            }
        }
    }
}

/// Parses every top-level binding in a literal descriptor.
pub fn parse_bindings(text: &str) -> Result<Vec<Binding>, LiteralParseError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        last_line: 1,
    };
    parser.module()
}

/// The binding that defines the unit: the first identifier ending in `Meta`
/// (`ServiceMeta`, `LibNutMeta`).
pub fn find_unit_binding(bindings: &[Binding]) -> Option<&Binding> {
    bindings.iter().find(|b| b.name.ends_with("Meta"))
}

fn string_list(map: &LiteralValue, key: &str) -> Result<Vec<String>, String> {
    match map.get(key) {
        None | Some(LiteralValue::None) => Ok(Vec::new()),
        Some(LiteralValue::List(items)) => items
            .iter()
            .map(|item| match item {
                LiteralValue::Str(s) => Ok(s.clone()),
                other => Err(format!(
                    "\"{}\" must contain only strings, found {}",
                    key,
                    other.type_name()
                )),
            })
            .collect(),
        Some(other) => Err(format!(
            "\"{}\" must be a list of strings, found {}",
            key,
            other.type_name()
        )),
    }
}

fn optional_string(map: &LiteralValue, key: &str) -> Result<Option<String>, String> {
    match map.get(key) {
        None | Some(LiteralValue::None) => Ok(None),
        Some(LiteralValue::Str(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!(
            "\"{}\" must be a string, found {}",
            key,
            other.type_name()
        )),
    }
}

/// Maps a parsed binding value onto the dialect-neutral unit description.
pub fn unit_spec_from_value(value: &LiteralValue) -> Result<UnitSpec, String> {
    if !matches!(value, LiteralValue::Dict(_)) {
        return Err(format!("unit binding must be a mapping, found {}", value.type_name()));
    }

    let name = optional_string(value, "name")?
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| "missing \"name\"".to_string())?;

    let kind = match optional_string(value, "type")? {
        Some(t) => Some(
            OutputKind::parse(&t).ok_or_else(|| format!("unknown output type \"{}\"", t))?,
        ),
        None => None,
    };

    Ok(UnitSpec {
        name,
        sources: string_list(value, "sources")?,
        include_dirs: string_list(value, "include_dirs")?,
        proto_files: string_list(value, "proto_files")?,
        config_files: string_list(value, "config_files")?,
        dependencies: string_list(value, "dependencies")?,
        output: optional_string(value, "output")?,
        kind,
        discover_protos: false,
    })
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Writes a unit description back out in the literal dialect.
pub fn render_descriptor(binding: &str, spec: &UnitSpec) -> String {
    let mut fields: Vec<String> = vec![format!("    \"name\": {}", quote(&spec.name))];

    let lists: [(&str, &Vec<String>); 5] = [
        ("sources", &spec.sources),
        ("include_dirs", &spec.include_dirs),
        ("proto_files", &spec.proto_files),
        ("config_files", &spec.config_files),
        ("dependencies", &spec.dependencies),
    ];
    for (key, values) in lists {
        if values.is_empty() {
            fields.push(format!("    \"{}\": []", key));
        } else {
            let items: Vec<String> = values
                .iter()
                .map(|v| format!("        {}", quote(v)))
                .collect();
            fields.push(format!("    \"{}\": [\n{}\n    ]", key, items.join(",\n")));
        }
    }

    if let Some(output) = &spec.output {
        fields.push(format!("    \"output\": {}", quote(output)));
    }
    if let Some(kind) = spec.kind {
        fields.push(format!("    \"type\": {}", quote(kind.as_str())));
    }

    format!("{} = {{\n{}\n}}\n", binding, fields.join(",\n"))
}

/// Parser for `<X>.Build.py` descriptors
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralParser;

impl DescriptorParser for LiteralParser {
    fn parse(&self, path: &Path, text: &str) -> Result<UnitSpec, BuildError> {
        let bindings =
            parse_bindings(text).map_err(|e| BuildError::malformed(path, e.to_string()))?;

        let binding = find_unit_binding(&bindings).ok_or_else(|| {
            BuildError::malformed(path, "no unit-defining '<Name>Meta = { ... }' binding")
        })?;

        unit_spec_from_value(&binding.value).map_err(|reason| {
            BuildError::malformed(path, format!("{} (binding '{}')", reason, binding.name))
        })
    }
}
