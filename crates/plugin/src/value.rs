//! Typed processor property values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of value a processor property holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    Double,
    Float,
    Color,
    Enum,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Double => "double",
            ValueKind::Float => "float",
            ValueKind::Color => "color",
            ValueKind::Enum => "enum",
            ValueKind::String => "string",
        };
        f.write_str(name)
    }
}

/// Errors raised by typed value conversions
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("expected a {expected} value, found {found}")]
    KindMismatch { expected: ValueKind, found: ValueKind },

    #[error("cannot parse {input:?} as {kind}")]
    Parse { kind: ValueKind, input: String },

    #[error("{input:?} is not one of {variants:?}")]
    UnknownVariant { input: String, variants: Vec<String> },
}

/// RGBA color with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const MAGENTA: Color = Color::new(255, 0, 255, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
}

/// Canonical `r,g,b,a` form
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = ValueError;

    /// Accepts `r,g,b` or `r,g,b,a`; whitespace around channels is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = || ValueError::Parse {
            kind: ValueKind::Color,
            input: s.to_string(),
        };

        let channels = s
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| parse_error())?;

        match channels.as_slice() {
            [r, g, b] => Ok(Color::new(*r, *g, *b, 255)),
            [r, g, b, a] => Ok(Color::new(*r, *g, *b, *a)),
            _ => Err(parse_error()),
        }
    }
}

/// A processor property value tagged with its kind
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Float(f32),
    Color(Color),
    Enum { value: String, variants: Vec<String> },
    String(String),
}

impl PropertyValue {
    /// Build an enum value from its current variant and the allowed set
    pub fn enumeration<I, S>(value: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyValue::Enum {
            value: value.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Bool(_) => ValueKind::Bool,
            PropertyValue::Int(_) => ValueKind::Int,
            PropertyValue::Double(_) => ValueKind::Double,
            PropertyValue::Float(_) => ValueKind::Float,
            PropertyValue::Color(_) => ValueKind::Color,
            PropertyValue::Enum { .. } => ValueKind::Enum,
            PropertyValue::String(_) => ValueKind::String,
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::KindMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn to_bool(&self) -> Result<bool, ValueError> {
        match self {
            PropertyValue::Bool(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Bool)),
        }
    }

    pub fn to_int(&self) -> Result<i64, ValueError> {
        match self {
            PropertyValue::Int(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Int)),
        }
    }

    pub fn to_double(&self) -> Result<f64, ValueError> {
        match self {
            PropertyValue::Double(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Double)),
        }
    }

    pub fn to_float(&self) -> Result<f32, ValueError> {
        match self {
            PropertyValue::Float(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Float)),
        }
    }

    pub fn to_color(&self) -> Result<Color, ValueError> {
        match self {
            PropertyValue::Color(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Color)),
        }
    }

    pub fn to_enum(&self) -> Result<&str, ValueError> {
        match self {
            PropertyValue::Enum { value, .. } => Ok(value),
            _ => Err(self.mismatch(ValueKind::Enum)),
        }
    }

    pub fn to_str(&self) -> Result<&str, ValueError> {
        match self {
            PropertyValue::String(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::String)),
        }
    }

    /// Parse `input` as a value of the same kind as `self`.
    ///
    /// Enum values keep the variant list of `self` and must name one of its
    /// variants (an empty list accepts anything).
    pub fn parse_like(&self, input: &str) -> Result<PropertyValue, ValueError> {
        let kind = self.kind();
        let parse_error = || ValueError::Parse {
            kind,
            input: input.to_string(),
        };
        let trimmed = input.trim();

        match self {
            PropertyValue::Bool(_) => parse_bool(trimmed)
                .map(PropertyValue::Bool)
                .ok_or_else(parse_error),
            PropertyValue::Int(_) => trimmed
                .parse::<i64>()
                .map(PropertyValue::Int)
                .map_err(|_| parse_error()),
            PropertyValue::Double(_) => trimmed
                .parse::<f64>()
                .map(PropertyValue::Double)
                .map_err(|_| parse_error()),
            PropertyValue::Float(_) => trimmed
                .parse::<f32>()
                .map(PropertyValue::Float)
                .map_err(|_| parse_error()),
            PropertyValue::Color(_) => trimmed.parse::<Color>().map(PropertyValue::Color),
            PropertyValue::Enum { variants, .. } => {
                if variants.is_empty() || variants.iter().any(|v| v == trimmed) {
                    Ok(PropertyValue::Enum {
                        value: trimmed.to_string(),
                        variants: variants.clone(),
                    })
                } else {
                    Err(ValueError::UnknownVariant {
                        input: input.to_string(),
                        variants: variants.clone(),
                    })
                }
            }
            PropertyValue::String(_) => Ok(PropertyValue::String(input.to_string())),
        }
    }

    /// Parse a value of an explicit kind. Enum values parsed this way carry
    /// no variant list.
    pub fn parse(kind: ValueKind, input: &str) -> Result<PropertyValue, ValueError> {
        let seed = match kind {
            ValueKind::Bool => PropertyValue::Bool(false),
            ValueKind::Int => PropertyValue::Int(0),
            ValueKind::Double => PropertyValue::Double(0.0),
            ValueKind::Float => PropertyValue::Float(0.0),
            ValueKind::Color => PropertyValue::Color(Color::WHITE),
            ValueKind::Enum => PropertyValue::enumeration("", Vec::<String>::new()),
            ValueKind::String => PropertyValue::String(String::new()),
        };
        seed.parse_like(input)
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    if input.eq_ignore_ascii_case("true") {
        Some(true)
    } else if input.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Canonical string form stored in `processorParam`
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Double(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Color(v) => write!(f, "{v}"),
            PropertyValue::Enum { value, .. } => f.write_str(value),
            PropertyValue::String(v) => f.write_str(v),
        }
    }
}
