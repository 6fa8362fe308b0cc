//! Attribute data types and their string codec
//!
//! Every attribute value crosses the file boundary as a string. [`DataType`]
//! is the built-in set of types, [`DataTypeCodec`] the seam a host can
//! implement for its own.

use std::fmt::{self, Display, Formatter};

/// Primitive attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text
    String(String),

    /// Signed 64-bit integer
    Integer(i64),

    /// 64-bit float
    Real(f64),

    /// Boolean
    Boolean(bool),

    /// Enumeration literal
    Literal(String),
}

impl Value {
    /// Short name of the variant, used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Boolean(_) => "boolean",
            Self::Literal(_) => "literal",
        }
    }

    /// Text content for string and literal values
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Literal(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Real(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// String codec for attribute values
pub trait DataTypeCodec {
    /// Render a value as its file representation
    ///
    /// # Errors
    /// Returns error if the value does not belong to this type
    fn encode(&self, value: &Value) -> Result<String, DataTypeError>;

    /// Parse a file representation back into a value
    ///
    /// # Errors
    /// Returns error if the text is not a valid literal of this type
    fn decode(&self, text: &str) -> Result<Value, DataTypeError>;
}

/// Built-in attribute data types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Free text, stored verbatim
    String,

    /// `i64` in decimal
    Integer,

    /// `f64` in shortest round-trip form
    Real,

    /// `true` / `false`
    Boolean,

    /// One of a fixed set of literals
    Enumeration(Vec<String>),
}

impl DataType {
    /// Enumeration over the given literals
    #[must_use]
    pub fn enumeration<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enumeration(literals.into_iter().map(Into::into).collect())
    }

    /// Type name, used in diagnostics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Boolean => "boolean",
            Self::Enumeration(_) => "enumeration",
        }
    }

    fn unparsable(&self, text: &str) -> DataTypeError {
        DataTypeError::Unparsable {
            data_type: self.name(),
            value: text.to_owned(),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl DataTypeCodec for DataType {
    fn encode(&self, value: &Value) -> Result<String, DataTypeError> {
        match (self, value) {
            (Self::String, Value::String(s)) => Ok(s.clone()),
            (Self::Integer, Value::Integer(i)) => Ok(i.to_string()),
            (Self::Real, Value::Real(r)) => Ok(r.to_string()),
            (Self::Boolean, Value::Boolean(b)) => Ok(b.to_string()),
            (Self::Enumeration(literals), Value::Literal(l) | Value::String(l))
                if literals.contains(l) =>
            {
                Ok(l.clone())
            }
            _ => Err(DataTypeError::Mismatch {
                data_type: self.name(),
                found: value.kind(),
            }),
        }
    }

    fn decode(&self, text: &str) -> Result<Value, DataTypeError> {
        match self {
            Self::String => Ok(Value::String(text.to_owned())),
            Self::Integer => text
                .parse()
                .map(Value::Integer)
                .map_err(|_| self.unparsable(text)),
            Self::Real => text
                .parse()
                .map(Value::Real)
                .map_err(|_| self.unparsable(text)),
            Self::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    Ok(Value::Boolean(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Value::Boolean(false))
                } else {
                    Err(self.unparsable(text))
                }
            }
            Self::Enumeration(literals) => literals
                .iter()
                .find(|l| *l == text)
                .map(|l| Value::Literal(l.clone()))
                .ok_or_else(|| self.unparsable(text)),
        }
    }
}

/// Errors converting attribute values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataTypeError {
    /// Text is not a literal of the type
    #[error("{value:?} is not a valid {data_type}")]
    Unparsable {
        /// Target type name
        data_type: &'static str,
        /// Offending text
        value: String,
    },

    /// Value variant does not belong to the type
    #[error("{found} value cannot be encoded as {data_type}")]
    Mismatch {
        /// Declared type name
        data_type: &'static str,
        /// Variant found
        found: &'static str,
    },
}
