//! Cell values of a row table

use std::fmt;

use image::DynamicImage;

/// A single cell of a row table
///
/// Numeric cells are the ones the normalizer rescales. Image cells hold
/// in-memory arrays (object crops, user supplied images) and never reach
/// the written file.
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Free text, including paths and encoded thumbnails
    Text(String),
    /// Decoded image array
    Image(DynamicImage),
}

impl Value {
    /// Whether the normalizer treats this cell as numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Numeric content as a float, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integral content, accepting floats without a fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// Text content, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Image content, if any
    pub fn as_image(&self) -> Option<&DynamicImage> {
        match self {
            Value::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Image(_) => "image",
        }
    }

    /// Parse a cell read back from a delimited file
    pub fn parse(raw: &str) -> Value {
        if let Ok(v) = raw.parse::<i64>() {
            return Value::Integer(v);
        }
        match raw.parse::<f64>() {
            Ok(v) => Value::Float(v),
            Err(_) => Value::Text(raw.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Image(a), Value::Image(b)) => {
                a.color() == b.color() && a.width() == b.width() && a.height() == b.height() && a.as_bytes() == b.as_bytes()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Image(img) => write!(f, "<image {}x{}>", img.width(), img.height()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DynamicImage> for Value {
    fn from(v: DynamicImage) -> Self {
        Value::Image(v)
    }
}
