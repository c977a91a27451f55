//! Parsing of configuration expressions such as
//! `random-feature-selection{"sample_size": 0.5}`.
//!
//! An expression is a name taken from a caller-supplied allow-list, optionally
//! followed by a mapping of argument names to literal values. The mapping uses a
//! small literal grammar (numbers, booleans, `None`, quoted strings, lists, tuples
//! and nested mappings). Nothing in an expression is ever evaluated.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LearnerError, Result};

/// A literal value of a configuration expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Map(Arguments),
}

/// Argument name to value.
pub type Arguments = BTreeMap<String, Literal>;

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Str(s) => write!(f, "{}", s),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Literal::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Literal {
    fn type_name(&self) -> &'static str {
        match self {
            Literal::None => "None",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "string",
            Literal::List(_) => "list",
            Literal::Map(_) => "mapping",
        }
    }

    /// Truthiness: zero, empty and `None` are false.
    pub fn as_bool(&self) -> bool {
        match self {
            Literal::None => false,
            Literal::Bool(b) => *b,
            Literal::Int(i) => *i != 0,
            Literal::Float(x) => *x != 0.0,
            Literal::Str(s) => !s.is_empty(),
            Literal::List(items) => !items.is_empty(),
            Literal::Map(map) => !map.is_empty(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Bool(b) => Some(*b as i64),
            Literal::Int(i) => Some(*i),
            Literal::Float(x) if x.is_finite() => Some(x.trunc() as i64),
            Literal::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Bool(b) => Some(*b as i64 as f64),
            Literal::Int(i) => Some(*i as f64),
            Literal::Float(x) => Some(*x),
            Literal::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A recognized name plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationExpression {
    pub name: String,
    pub args: Arguments,
}

impl ConfigurationExpression {
    /// Finds the first allow-listed prefix `string` starts with and parses the
    /// remainder, if any, as a literal mapping.
    ///
    /// Returns `Ok(None)` if no prefix matches.
    pub fn parse(string: &str, prefixes: &[&str]) -> Result<Option<Self>> {
        for prefix in prefixes {
            if let Some(suffix) = string.strip_prefix(prefix) {
                let suffix = suffix.trim();
                let args = if suffix.is_empty() {
                    Arguments::new()
                } else {
                    parse_arguments(suffix)?
                };
                return Ok(Some(ConfigurationExpression {
                    name: prefix.to_string(),
                    args,
                }));
            }
        }

        Ok(None)
    }

    pub fn get_string(
        &self,
        key: &str,
        default: &str,
        validation: Option<&dyn Fn(&str) -> bool>,
    ) -> Result<String> {
        get_string_argument(&self.args, key, default, validation)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        get_bool_argument(&self.args, key, default)
    }

    pub fn get_int(
        &self,
        key: &str,
        default: i64,
        validation: Option<&dyn Fn(i64) -> bool>,
    ) -> Result<i64> {
        get_int_argument(&self.args, key, default, validation)
    }

    pub fn get_float(
        &self,
        key: &str,
        default: f64,
        validation: Option<&dyn Fn(f64) -> bool>,
    ) -> Result<f64> {
        get_float_argument(&self.args, key, default, validation)
    }

    /// Renders the expression as `name(key=value,...)`, a form that is safe to
    /// embed in file names.
    pub fn canonical(&self) -> String {
        if self.args.is_empty() {
            return self.name.clone();
        }

        let args: Vec<String> = self
            .args
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        format!("{}({})", self.name, args.join(","))
    }
}

pub fn get_string_argument(
    args: &Arguments,
    key: &str,
    default: &str,
    validation: Option<&dyn Fn(&str) -> bool>,
) -> Result<String> {
    match args.get(key) {
        Some(literal) => {
            let value = literal.to_string();
            if let Some(validate) = validation {
                if !validate(&value) {
                    return Err(LearnerError::validation(key, value));
                }
            }
            Ok(value)
        }
        None => Ok(default.to_string()),
    }
}

pub fn get_bool_argument(args: &Arguments, key: &str, default: bool) -> bool {
    args.get(key).map(Literal::as_bool).unwrap_or(default)
}

pub fn get_int_argument(
    args: &Arguments,
    key: &str,
    default: i64,
    validation: Option<&dyn Fn(i64) -> bool>,
) -> Result<i64> {
    match args.get(key) {
        Some(literal) => {
            let value = literal
                .as_int()
                .ok_or_else(|| LearnerError::validation(key, literal))?;
            if let Some(validate) = validation {
                if !validate(value) {
                    return Err(LearnerError::validation(key, value));
                }
            }
            Ok(value)
        }
        None => Ok(default),
    }
}

pub fn get_float_argument(
    args: &Arguments,
    key: &str,
    default: f64,
    validation: Option<&dyn Fn(f64) -> bool>,
) -> Result<f64> {
    match args.get(key) {
        Some(literal) => {
            let value = literal
                .as_float()
                .ok_or_else(|| LearnerError::validation(key, literal))?;
            if let Some(validate) = validation {
                if !validate(value) {
                    return Err(LearnerError::validation(key, value));
                }
            }
            Ok(value)
        }
        None => Ok(default),
    }
}

/// Parses a literal mapping such as `{'a': 1, "b": [true, None]}`.
pub fn parse_arguments(text: &str) -> Result<Arguments> {
    match parse_literal(text)? {
        Literal::Map(map) => Ok(map),
        other => Err(LearnerError::Parse {
            expression: text.to_string(),
            reason: format!("expected a mapping, got a {}", other.type_name()),
        }),
    }
}

/// Parses a single literal. Trailing input other than whitespace is an error.
pub fn parse_literal(text: &str) -> Result<Literal> {
    let mut parser = LiteralParser {
        text,
        chars: text.char_indices().collect(),
        pos: 0,
    };
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn error(&self, reason: &str) -> LearnerError {
        let offset = self
            .chars
            .get(self.pos)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.text.len());
        LearnerError::Parse {
            expression: self.text.to_string(),
            reason: format!("{} at position {}", reason, offset),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    fn parse_value(&mut self) -> Result<Literal> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') => self.parse_map(),
            Some('[') => {
                let items = self.parse_sequence('[', ']')?;
                Ok(Literal::List(items.0))
            }
            Some('(') => {
                let (mut items, trailing_comma) = self.parse_sequence('(', ')')?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Literal::List(items))
                }
            }
            Some('"') | Some('\'') => Ok(Literal::Str(self.parse_string()?)),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                self.parse_number()
            }
            Some(c) if c.is_alphabetic() => self.parse_keyword(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_map(&mut self) -> Result<Literal> {
        self.expect('{')?;
        let mut map = Arguments::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                break;
            }

            let key = match self.parse_value()? {
                Literal::Str(key) => key,
                other => {
                    return Err(self.error(&format!(
                        "mapping keys must be strings, got a {}",
                        other.type_name()
                    )))
                }
            };
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }

        Ok(Literal::Map(map))
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Result<(Vec<Literal>, bool)> {
        self.expect(open)?;
        let mut items = Vec::new();
        let mut trailing_comma = false;

        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                break;
            }

            items.push(self.parse_value()?);
            trailing_comma = false;

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    trailing_comma = true;
                }
                Some(c) if c == close => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error(&format!("expected ',' or '{}'", close))),
            }
        }

        Ok((items, trailing_comma))
    }

    fn parse_string(&mut self) -> Result<String> {
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut value = String::new();

        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some(c @ ('\\' | '\'' | '"')) => value.push(c),
                    Some(c) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }

        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Literal> {
        let start = self.pos;
        let mut is_float = false;

        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => self.pos += 1,
                '.' => {
                    is_float = true;
                    self.pos += 1;
                }
                'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('-') | Some('+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }

        let token: String = self.chars[start..self.pos]
            .iter()
            .map(|(_, c)| *c)
            .filter(|c| *c != '_')
            .collect();

        let parsed = if is_float {
            token.parse::<f64>().ok().map(Literal::Float)
        } else {
            token.parse::<i64>().ok().map(Literal::Int)
        };

        parsed.ok_or_else(|| {
            self.pos = start;
            self.error(&format!("invalid number '{}'", token))
        })
    }

    fn parse_keyword(&mut self) -> Result<Literal> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();

        match word.as_str() {
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            "None" | "null" => Ok(Literal::None),
            _ => {
                self.pos = start;
                Err(self.error(&format!("unknown identifier '{}'", word)))
            }
        }
    }
}
